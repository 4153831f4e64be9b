//! Price data abstractions and core types

use crate::core::country::CountryCode;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A one-day query window. Start and end are always the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotWindow {
    date: NaiveDate,
}

impl SnapshotWindow {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn start(&self) -> NaiveDate {
        self.date
    }

    pub fn end(&self) -> NaiveDate {
        self.date
    }
}

/// One untagged row as returned by a data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    /// Named values in the provider's column order.
    pub values: Vec<(String, Option<f64>)>,
}

impl PriceRow {
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, v)| *v)
    }
}

/// A provider row tagged with the code it was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub row: PriceRow,
    pub country: CountryCode,
}

impl PriceRecord {
    pub fn new(row: PriceRow, country: CountryCode) -> Self {
        Self { row, country }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.row.value(column)
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the row for `code` in `window`, or `None` if the upstream has no data.
    async fn fetch(&self, code: &CountryCode, window: &SnapshotWindow) -> Result<Option<PriceRow>>;
}
