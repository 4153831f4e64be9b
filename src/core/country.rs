//! Country code reference data

use crate::core::error::ParseError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::Read;

/// Header of the combined name/code column in the reference file.
pub const REFERENCE_COLUMN: &str = "COUNTRY|CODE";
const DELIMITER: char = '|';

/// Short identifier used as a lookup key and as a tag on fetched rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(code: &str) -> Self {
        CountryCode(code.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryEntry {
    pub country: String,
    pub code: CountryCode,
}

/// Ordered (country, code) pairs as listed in the reference file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryCodeTable {
    entries: Vec<CountryEntry>,
}

impl CountryCodeTable {
    /// Parses a CSV with a `COUNTRY|CODE` column, splitting each value on `|`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let column = reader
            .headers()?
            .iter()
            .position(|h| h == REFERENCE_COLUMN)
            .ok_or_else(|| ParseError::MissingColumn {
                column: REFERENCE_COLUMN.to_string(),
            })?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let value = record.get(column).unwrap_or_default();
            entries.push(parse_entry(value).ok_or_else(|| ParseError::MalformedRow {
                line,
                value: value.to_string(),
            })?);
        }

        if entries.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(CountryCodeTable { entries })
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn codes(&self) -> Vec<CountryCode> {
        self.entries.iter().map(|e| e.code.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(value: &str) -> Option<CountryEntry> {
    let (country, code) = value.split_once(DELIMITER)?;
    let (country, code) = (country.trim(), code.trim());
    if code.is_empty() || code.contains(DELIMITER) {
        return None;
    }
    Some(CountryEntry {
        country: country.to_string(),
        code: CountryCode::from(code),
    })
}

/// Where the reference list of country codes comes from.
#[async_trait]
pub trait CountryCodeSource: Send + Sync {
    async fn country_codes(&self) -> Result<CountryCodeTable, ParseError>;
}
