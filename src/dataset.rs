use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use std::error::Error;

static DATA_DIR: Dir = include_dir!("src/data");

/// One quizzable country. `capitals` always holds at least one non-empty
/// candidate; records that cannot satisfy that are dropped at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryRecord {
    pub country: String,
    pub code: String,
    pub capitals: Vec<String>,
}

// Wire form: a record may carry a singular `capital` or a `capitals` list.
#[derive(Deserialize, Debug)]
struct RawRecord {
    country: String,
    code: String,
    #[serde(default)]
    capital: Option<String>,
    #[serde(default)]
    capitals: Vec<String>,
}

impl RawRecord {
    fn into_record(self) -> CountryRecord {
        let mut capitals = self.capitals;
        if capitals.is_empty() {
            capitals.extend(self.capital);
        }
        capitals.retain(|c| !c.trim().is_empty());
        CountryRecord {
            country: self.country,
            code: self.code,
            capitals,
        }
    }
}

/// Load the embedded country dataset.
pub fn load_default() -> Result<Vec<CountryRecord>, Box<dyn Error>> {
    let file = DATA_DIR
        .get_file("countries.json")
        .expect("Country dataset not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret dataset as a string");

    parse_records(file_as_str)
}

/// Decode and filter a JSON record list: normalize both capital forms,
/// drop records with no playable capital, keep the first of any duplicated
/// code.
pub fn parse_records(json: &str) -> Result<Vec<CountryRecord>, Box<dyn Error>> {
    let raw: Vec<RawRecord> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .map(RawRecord::into_record)
        .filter(|r| !r.capitals.is_empty())
        .unique_by(|r| r.code.clone())
        .collect())
}
