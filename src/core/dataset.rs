//! The assembled table of tagged price rows and its CSV form.

use crate::core::country::CountryCode;
use crate::core::price::{PriceRecord, PriceRow};
use chrono::NaiveDate;
use std::io::{Read, Write};

pub const DATE_COLUMN: &str = "Date";
pub const COUNTRY_COLUMN: &str = "Country";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rows in fetch order. Never sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<PriceRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PriceRecord) {
        self.records.push(record);
    }

    pub fn append(&mut self, other: Dataset) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Country tags of every row, duplicates included.
    pub fn codes(&self) -> Vec<CountryCode> {
        self.records.iter().map(|r| r.country.clone()).collect()
    }

    /// Value columns in first-seen order across all rows.
    pub fn value_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in &self.records {
            for (name, _) in &record.row.values {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }
        columns
    }

    /// Full header: the date, every value column, then the country tag.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![DATE_COLUMN];
        columns.extend(self.value_columns());
        columns.push(COUNTRY_COLUMN);
        columns
    }

    /// Writes a header row followed by one line per record. Missing values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        let value_columns = self.value_columns();
        writer.write_record(self.columns())?;

        for record in &self.records {
            let mut fields = Vec::with_capacity(value_columns.len() + 2);
            fields.push(record.row.date.format(DATE_FORMAT).to_string());
            for column in &value_columns {
                fields.push(record.value(column).map(|v| v.to_string()).unwrap_or_default());
            }
            fields.push(record.country.to_string());
            writer.write_record(&fields)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> csv::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads back a file produced by [`Dataset::write_csv`].
    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let date_index = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| anyhow::anyhow!("Missing {DATE_COLUMN} column"))?;
        let country_index = headers
            .iter()
            .position(|h| h == COUNTRY_COLUMN)
            .ok_or_else(|| anyhow::anyhow!("Missing {COUNTRY_COLUMN} column"))?;

        let mut dataset = Dataset::new();
        for record in reader.records() {
            let record = record?;
            let date = NaiveDate::parse_from_str(&record[date_index], DATE_FORMAT)?;
            let mut values = Vec::new();
            for (index, name) in headers.iter().enumerate() {
                if index == date_index || index == country_index {
                    continue;
                }
                let cell = &record[index];
                let value = if cell.is_empty() {
                    None
                } else {
                    Some(cell.parse::<f64>()?)
                };
                values.push((name.to_string(), value));
            }
            dataset.push(PriceRecord::new(
                PriceRow { date, values },
                CountryCode::from(&record[country_index]),
            ));
        }
        Ok(dataset)
    }
}

impl FromIterator<PriceRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = PriceRecord>>(iter: I) -> Self {
        Dataset {
            records: iter.into_iter().collect(),
        }
    }
}
