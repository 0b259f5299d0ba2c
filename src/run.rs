use crate::dataset::CountryRecord;
use crate::normalize::is_match;
use crate::TICK_RATE_MS;
use rand::seq::SliceRandom;

/// How long the correct/wrong mark stays on screen (~250ms at the UI tick).
const FLASH_TICKS: u32 = (250 / TICK_RATE_MS) as u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Summary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One shuffled pass over the dataset; the run ends with the deck.
    Deck,
    /// Countdown-bounded; the deck reshuffles underneath until time is up.
    Timed,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Deck => "Deck",
            Mode::Timed => "Timed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "deck" => Some(Mode::Deck),
            "timed" => Some(Mode::Timed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Transient feedback mark. Purely decorative; sequencing and scoring
/// never read it. It drains on ticks and dies with its `RunState`, so a
/// pending clear can never leak into a later run or question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flash {
    pub outcome: Outcome,
    ticks_left: u32,
}

impl Flash {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            ticks_left: FLASH_TICKS,
        }
    }
}

/// All mutable state of one run. Replaced wholesale on every start; only
/// ever mutated by `RunEngine` methods, one trigger at a time.
///
/// `position == deck.len()` is the deck-mode "exhausted, summary pending"
/// marker: the last flash is still on screen and submissions are no-ops.
#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    pub phase: Phase,
    pub mode: Mode,
    pub deck: Vec<CountryRecord>,
    pub position: usize,
    pub seconds_remaining: Option<f64>,
    pub score: usize,
    pub attempts: usize,
    pub current_streak: usize,
    pub best_streak: usize,
    pub answer: String,
    pub flash: Option<Flash>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            mode: Mode::Timed,
            deck: Vec::new(),
            position: 0,
            seconds_remaining: None,
            score: 0,
            attempts: 0,
            current_streak: 0,
            best_streak: 0,
            answer: String::new(),
            flash: None,
        }
    }
}

/// The run state machine: owns the immutable dataset and the current
/// `RunState`, and applies every transition synchronously.
#[derive(Debug)]
pub struct RunEngine {
    records: Vec<CountryRecord>,
    pub state: RunState,
}

impl RunEngine {
    pub fn new(records: Vec<CountryRecord>) -> Self {
        Self {
            records,
            state: RunState::default(),
        }
    }

    /// Begin a fresh run. Valid from `Idle` and `Summary`; an empty
    /// dataset refuses to start and leaves the phase untouched.
    pub fn start(&mut self, mode: Mode, seconds: Option<f64>) {
        if self.state.phase == Phase::Running || self.records.is_empty() {
            return;
        }

        self.state = RunState {
            phase: Phase::Running,
            mode,
            deck: self.shuffled_deck(),
            seconds_remaining: match mode {
                Mode::Timed => Some(seconds.unwrap_or(60.0)),
                Mode::Deck => None,
            },
            ..RunState::default()
        };
    }

    /// Score the pending answer against the current record and advance.
    /// Silently ignored outside `Running`, once timed-mode time has hit
    /// zero, and while a deck-mode summary is pending.
    pub fn submit(&mut self) {
        if self.state.phase != Phase::Running {
            return;
        }
        if matches!(self.state.seconds_remaining, Some(s) if s <= 0.0) {
            return;
        }
        let Some(record) = self.state.deck.get(self.state.position) else {
            return;
        };

        let correct = is_match(&self.state.answer, &record.capitals);

        self.state.attempts += 1;
        self.state.flash = Some(Flash::new(if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }));

        if correct {
            self.state.score += 1;
            self.state.current_streak += 1;
            self.state.best_streak = self.state.best_streak.max(self.state.current_streak);
        } else {
            self.state.current_streak = 0;
        }

        self.state.answer.clear();

        let next = self.state.position + 1;
        if next < self.state.deck.len() {
            self.state.position = next;
        } else if self.state.mode == Mode::Timed {
            // Seamless reshuffle; exhaustion is invisible mid-run.
            self.state.deck = self.shuffled_deck();
            self.state.position = 0;
        } else {
            // Deck run complete. The summary lands via tick() once the
            // final flash has been shown.
            self.state.position = next;
        }
    }

    /// One UI tick: drain the flash, count the clock down, and land any
    /// pending deck-mode summary. No-op in every other phase, so a stray
    /// tick can never corrupt a later run's fresh state.
    pub fn on_tick(&mut self) {
        if self.state.phase != Phase::Running {
            return;
        }

        if let Some(flash) = self.state.flash.as_mut() {
            flash.ticks_left = flash.ticks_left.saturating_sub(1);
            if flash.ticks_left == 0 {
                self.state.flash = None;
            }
        }

        if self.state.mode == Mode::Deck
            && self.state.position >= self.state.deck.len()
            && self.state.flash.is_none()
        {
            self.finish();
            return;
        }

        if let Some(left) = self.state.seconds_remaining.as_mut() {
            *left -= TICK_RATE_MS as f64 / 1000.0;
            if *left <= 0.0 {
                // Hard stop: scoring is closed the instant time is gone.
                *left = 0.0;
                self.finish();
            }
        }
    }

    /// User-initiated early termination.
    pub fn end_run(&mut self) {
        if self.state.phase == Phase::Running {
            self.finish();
        }
    }

    /// Return to mode selection without starting a run.
    pub fn reset(&mut self) {
        if self.state.phase == Phase::Summary {
            self.state = RunState::default();
        }
    }

    pub fn type_char(&mut self, c: char) {
        if self.state.phase == Phase::Running {
            self.state.answer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.state.phase == Phase::Running {
            self.state.answer.pop();
        }
    }

    fn finish(&mut self) {
        self.state.phase = Phase::Summary;
        self.state.flash = None;
        self.state.answer.clear();
    }

    fn shuffled_deck(&self) -> Vec<CountryRecord> {
        let mut deck = self.records.clone();
        deck.shuffle(&mut rand::thread_rng());
        deck
    }

    // ---- derived read-model; computed, never stored ----

    pub fn current(&self) -> Option<&CountryRecord> {
        if self.state.phase == Phase::Running {
            self.state.deck.get(self.state.position)
        } else {
            None
        }
    }

    /// 1-based position while running, 0 otherwise. Clamped so the
    /// pending-summary marker still reads as the last card.
    pub fn progress(&self) -> usize {
        if self.state.phase == Phase::Running {
            (self.state.position + 1).min(self.total())
        } else {
            0
        }
    }

    pub fn total(&self) -> usize {
        self.state.deck.len()
    }

    pub fn accuracy(&self) -> u32 {
        if self.state.attempts > 0 {
            ((self.state.score as f64 / self.state.attempts as f64) * 100.0).round() as u32
        } else {
            0
        }
    }

    /// Whole seconds left for the HUD; `None` outside timed runs.
    pub fn seconds_left(&self) -> Option<u64> {
        self.state
            .seconds_remaining
            .map(|s| s.max(0.0).ceil() as u64)
    }

    pub fn dataset_size(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn records(n: usize) -> Vec<CountryRecord> {
        (0..n)
            .map(|i| CountryRecord {
                country: format!("Country {i}"),
                code: format!("C{i}"),
                capitals: vec![format!("Capital {i}")],
            })
            .collect()
    }

    fn engine(n: usize) -> RunEngine {
        RunEngine::new(records(n))
    }

    fn answer_correctly(engine: &mut RunEngine) {
        let capital = engine.current().unwrap().capitals[0].clone();
        for c in capital.chars() {
            engine.type_char(c);
        }
        engine.submit();
    }

    fn answer_wrong(engine: &mut RunEngine) {
        for c in "not a capital".chars() {
            engine.type_char(c);
        }
        engine.submit();
    }

    fn drain_flash(engine: &mut RunEngine) {
        for _ in 0..FLASH_TICKS {
            engine.on_tick();
        }
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = engine(5);
        assert_matches!(engine.state.phase, Phase::Idle);
        assert_eq!(engine.progress(), 0);
        assert_eq!(engine.accuracy(), 0);
        assert!(engine.current().is_none());
    }

    #[test]
    fn start_builds_a_full_shuffled_deck() {
        let mut engine = engine(10);
        engine.start(Mode::Deck, None);

        assert_matches!(engine.state.phase, Phase::Running);
        assert_eq!(engine.total(), 10);
        assert_eq!(engine.progress(), 1);
        assert_eq!(engine.state.attempts, 0);
        assert_eq!(engine.state.seconds_remaining, None);

        // a permutation of the dataset, not a sample
        let mut codes: Vec<_> = engine.state.deck.iter().map(|r| r.code.clone()).collect();
        codes.sort();
        let mut expected: Vec<_> = records(10).iter().map(|r| r.code.clone()).collect();
        expected.sort();
        assert_eq!(codes, expected);
    }

    #[test]
    fn start_against_empty_dataset_refuses() {
        let mut engine = engine(0);
        engine.start(Mode::Deck, None);
        assert_matches!(engine.state.phase, Phase::Idle);

        engine.start(Mode::Timed, Some(30.0));
        assert_matches!(engine.state.phase, Phase::Idle);
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut engine = engine(3);
        engine.start(Mode::Deck, None);
        answer_correctly(&mut engine);
        let before = engine.state.clone();

        engine.start(Mode::Deck, None);
        assert_eq!(engine.state, before);
    }

    #[test]
    fn correct_submission_scores_and_extends_streak() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);

        answer_correctly(&mut engine);

        assert_eq!(engine.state.score, 1);
        assert_eq!(engine.state.attempts, 1);
        assert_eq!(engine.state.current_streak, 1);
        assert_eq!(engine.state.best_streak, 1);
        assert_eq!(engine.state.position, 1);
        assert!(engine.state.answer.is_empty());
        assert_matches!(
            engine.state.flash,
            Some(Flash {
                outcome: Outcome::Correct,
                ..
            })
        );
    }

    #[test]
    fn wrong_submission_resets_current_streak_only() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);

        answer_correctly(&mut engine);
        answer_correctly(&mut engine);
        answer_wrong(&mut engine);

        assert_eq!(engine.state.score, 2);
        assert_eq!(engine.state.attempts, 3);
        assert_eq!(engine.state.current_streak, 0);
        assert_eq!(engine.state.best_streak, 2);
        assert_matches!(
            engine.state.flash,
            Some(Flash {
                outcome: Outcome::Incorrect,
                ..
            })
        );
    }

    #[test]
    fn best_streak_never_drops_below_current() {
        let mut engine = engine(8);
        engine.start(Mode::Deck, None);

        for correct in [true, true, false, true, true, true] {
            if correct {
                answer_correctly(&mut engine);
            } else {
                answer_wrong(&mut engine);
            }
            assert!(engine.state.best_streak >= engine.state.current_streak);
        }
        assert_eq!(engine.state.best_streak, 3);
        assert_eq!(engine.state.current_streak, 3);
    }

    #[test]
    fn empty_answer_counts_as_a_wrong_attempt() {
        let mut engine = engine(3);
        engine.start(Mode::Deck, None);

        engine.submit();

        assert_eq!(engine.state.attempts, 1);
        assert_eq!(engine.state.score, 0);
    }

    #[test]
    fn deck_run_accepts_exactly_deck_len_submissions() {
        let mut engine = engine(3);
        engine.start(Mode::Deck, None);

        for _ in 0..3 {
            engine.submit();
        }
        assert_eq!(engine.state.attempts, 3);
        // summary is pending until the final flash drains
        assert_matches!(engine.state.phase, Phase::Running);

        // further submissions in the window are no-ops
        engine.submit();
        engine.submit();
        assert_eq!(engine.state.attempts, 3);

        drain_flash(&mut engine);
        assert_matches!(engine.state.phase, Phase::Summary);
    }

    #[test]
    fn timed_run_reshuffles_past_the_deck_end() {
        let mut engine = engine(3);
        engine.start(Mode::Timed, Some(60.0));

        for _ in 0..5 {
            answer_correctly(&mut engine);
        }

        assert_matches!(engine.state.phase, Phase::Running);
        assert_eq!(engine.state.attempts, 5);
        assert_eq!(engine.state.score, 5);
        assert!(engine.state.position < engine.total());
    }

    #[test]
    fn countdown_reaching_zero_ends_the_run() {
        let mut engine = engine(3);
        engine.start(Mode::Timed, Some(0.2));

        engine.on_tick();
        assert_matches!(engine.state.phase, Phase::Running);
        engine.on_tick();
        assert_matches!(engine.state.phase, Phase::Summary);
        assert_eq!(engine.seconds_left(), Some(0));
    }

    #[test]
    fn zero_time_is_a_hard_stop_for_scoring() {
        let mut engine = engine(3);
        engine.start(Mode::Timed, Some(30.0));

        // time is gone but the summary transition has not been observed yet
        engine.state.seconds_remaining = Some(0.0);
        for c in "anything".chars() {
            engine.type_char(c);
        }
        engine.submit();

        assert_eq!(engine.state.attempts, 0);
        assert_eq!(engine.state.score, 0);
    }

    #[test]
    fn end_run_moves_to_summary_and_keeps_counters() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);
        answer_correctly(&mut engine);

        engine.end_run();

        assert_matches!(engine.state.phase, Phase::Summary);
        assert_eq!(engine.state.score, 1);
        assert_eq!(engine.state.attempts, 1);
        assert!(engine.state.flash.is_none());
        assert!(engine.state.answer.is_empty());
    }

    #[test]
    fn reset_returns_to_idle_only_from_summary() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);

        engine.reset();
        assert_matches!(engine.state.phase, Phase::Running);

        engine.end_run();
        engine.reset();
        assert_matches!(engine.state.phase, Phase::Idle);
        assert_eq!(engine.total(), 0);
    }

    #[test]
    fn restart_replaces_all_counters() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);
        answer_correctly(&mut engine);
        answer_wrong(&mut engine);
        engine.end_run();

        engine.start(Mode::Timed, Some(30.0));

        assert_eq!(engine.state.score, 0);
        assert_eq!(engine.state.attempts, 0);
        assert_eq!(engine.state.current_streak, 0);
        assert_eq!(engine.state.best_streak, 0);
        assert_eq!(engine.state.seconds_remaining, Some(30.0));
        assert_eq!(engine.progress(), 1);
    }

    #[test]
    fn flash_drains_after_its_ttl() {
        let mut engine = engine(5);
        engine.start(Mode::Deck, None);
        answer_correctly(&mut engine);

        assert!(engine.state.flash.is_some());
        drain_flash(&mut engine);
        assert!(engine.state.flash.is_none());
        assert_matches!(engine.state.phase, Phase::Running);
    }

    #[test]
    fn ticks_outside_running_change_nothing() {
        let mut engine = engine(5);
        let before = engine.state.clone();
        engine.on_tick();
        assert_eq!(engine.state, before);

        engine.start(Mode::Deck, None);
        engine.end_run();
        let summary = engine.state.clone();
        engine.on_tick();
        assert_eq!(engine.state, summary);
    }

    #[test]
    fn answer_editing_only_while_running() {
        let mut engine = engine(3);

        engine.type_char('x');
        assert!(engine.state.answer.is_empty());

        engine.start(Mode::Deck, None);
        engine.type_char('a');
        engine.type_char('b');
        assert_eq!(engine.state.answer, "ab");
        engine.backspace();
        assert_eq!(engine.state.answer, "a");

        engine.end_run();
        engine.type_char('z');
        assert!(engine.state.answer.is_empty());
    }

    #[test]
    fn accuracy_is_rounded_percentage() {
        let mut engine = engine(6);
        engine.start(Mode::Deck, None);

        answer_correctly(&mut engine);
        answer_wrong(&mut engine);
        answer_wrong(&mut engine);
        assert_eq!(engine.accuracy(), 33);

        answer_correctly(&mut engine);
        assert_eq!(engine.accuracy(), 50);

        answer_correctly(&mut engine);
        answer_correctly(&mut engine);
        assert_eq!(engine.accuracy(), 67);
    }

    #[test]
    fn submissions_match_any_accepted_capital() {
        let mut engine = RunEngine::new(vec![CountryRecord {
            country: "Bolivia".into(),
            code: "BO".into(),
            capitals: vec!["Sucre".into(), "La Paz".into()],
        }]);
        engine.start(Mode::Timed, Some(60.0));

        for c in "la paz".chars() {
            engine.type_char(c);
        }
        engine.submit();
        assert_eq!(engine.state.score, 1);

        for c in "SUCRE".chars() {
            engine.type_char(c);
        }
        engine.submit();
        assert_eq!(engine.state.score, 2);

        for c in "lima".chars() {
            engine.type_char(c);
        }
        engine.submit();
        assert_eq!(engine.state.score, 2);
        assert_eq!(engine.state.attempts, 3);
    }
}
