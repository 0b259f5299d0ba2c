use unicode_normalization::UnicodeNormalization;

// Combining diacritical marks block; everything NFD peels off a base letter.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Canonicalize free-text input for case/diacritic/punctuation-insensitive
/// comparison: trim, lowercase, strip accents ("São" -> "Sao"), expand the
/// isolated word "st" to "saint", then keep only ASCII letters and digits.
///
/// The abbreviation expansion runs on word tokens, before the separators
/// between them are discarded. Stripping first would glue "st." onto the
/// next word and the token would never match.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect();

    let mut out = String::with_capacity(folded.len() + 8);
    let mut token = String::new();
    for c in folded.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_alphanumeric() {
            token.push(c);
        } else if !token.is_empty() {
            if token == "st" {
                out.push_str("saint");
            } else {
                out.push_str(&token);
            }
            token.clear();
        }
    }
    out
}

/// An answer is correct iff it normalizes to something non-empty that
/// equals the normalized form of at least one accepted capital.
pub fn is_match(answer: &str, capitals: &[String]) -> bool {
    let guess = normalize(answer);
    !guess.is_empty() && capitals.iter().any(|c| normalize(c) == guess)
}
