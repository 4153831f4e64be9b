use crate::core::config::ProviderConfig;
use crate::core::country::CountryCode;
use crate::core::price::{DataProvider, PriceRow, SnapshotWindow};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    dataset: DatasetBody,
}

#[derive(Debug, Deserialize)]
struct DatasetBody {
    column_names: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// Nasdaq Data Link (formerly Quandl) time-series datasets.
pub struct NasdaqDataLinkProvider {
    base_url: String,
    api_key: Option<String>,
    database: String,
    series_prefix: String,
    client: reqwest::Client,
}

impl NasdaqDataLinkProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("bigmac/0.1")
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(NasdaqDataLinkProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            database: config.database.clone(),
            series_prefix: config.series_prefix.clone(),
            client,
        })
    }

    fn dataset_url(&self, code: &CountryCode) -> String {
        format!(
            "{}/api/v3/datasets/{}/{}{}.json",
            self.base_url, self.database, self.series_prefix, code
        )
    }
}

fn parse_row(column_names: &[String], row: &[Value]) -> Result<PriceRow> {
    if row.len() != column_names.len() {
        bail!(
            "Row has {} cells for {} columns: {row:?}",
            row.len(),
            column_names.len()
        );
    }

    let date_str = row
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Row has no date: {row:?}"))?;
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .with_context(|| format!("Failed to parse date: {date_str}"))?;

    let values = column_names
        .iter()
        .skip(1)
        .zip(row.iter().skip(1))
        .map(|(name, value)| {
            let number = value.as_f64();
            if number.is_none() && !value.is_null() {
                warn!(column = %name, %value, "Non-numeric cell treated as missing");
            }
            (name.clone(), number)
        })
        .collect();

    Ok(PriceRow { date, values })
}

#[async_trait]
impl DataProvider for NasdaqDataLinkProvider {
    async fn fetch(&self, code: &CountryCode, window: &SnapshotWindow) -> Result<Option<PriceRow>> {
        let url = self.dataset_url(code);
        debug!("Requesting {} for {}", url, code);

        let start = window.start().format(DATE_FORMAT).to_string();
        let end = window.end().format(DATE_FORMAT).to_string();
        let mut query = vec![("start_date", start.as_str()), ("end_date", end.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.as_str()));
        }

        let url = reqwest::Url::parse_with_params(&url, &query)
            .with_context(|| format!("Invalid dataset URL: {url}"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {code}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("No dataset published for {}", code);
            return Ok(None);
        }

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {code}"))?;

        if !status.is_success() {
            bail!("Unexpected status {status} for {code}: {response_text}");
        }

        let parsed: DatasetResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse dataset response"
                );
                return Err(e).context("Failed to parse dataset response");
            }
        };

        let mut rows = parsed.dataset.data.into_iter();
        let Some(first) = rows.next() else {
            debug!("No data for {} on {}", code, start);
            return Ok(None);
        };
        if rows.next().is_some() {
            debug!("Several rows returned for {}, keeping the first", code);
        }

        parse_row(&parsed.dataset.column_names, &first).map(Some)
    }
}
