use crate::core::country::{CountryCodeSource, CountryCodeTable};
use crate::core::error::ParseError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};

/// Reads the `COUNTRY|CODE` reference file from a local path or an http(s) URL.
pub struct ReferenceFile {
    location: String,
    timeout: Duration,
}

impl ReferenceFile {
    pub fn new(location: &str, timeout: Duration) -> Self {
        ReferenceFile {
            location: location.to_string(),
            timeout,
        }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    async fn read_bytes(&self) -> anyhow::Result<Vec<u8>> {
        if self.is_remote() {
            let client = reqwest::Client::builder()
                .user_agent("bigmac/0.1")
                .timeout(self.timeout)
                .build()?;
            let response = client.get(&self.location).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        } else {
            Ok(tokio::fs::read(&self.location).await?)
        }
    }
}

#[async_trait]
impl CountryCodeSource for ReferenceFile {
    async fn country_codes(&self) -> Result<CountryCodeTable, ParseError> {
        debug!("Reading country codes from {}", self.location);

        let bytes = self.read_bytes().await.map_err(|e| {
            error!(error = %e, location = %self.location, "Failed to read reference data");
            ParseError::Read {
                location: self.location.clone(),
                message: format!("{e:#}"),
            }
        })?;

        let table = CountryCodeTable::from_csv_reader(bytes.as_slice()).inspect_err(|e| {
            error!(error = %e, location = %self.location, "Failed to parse reference data");
        })?;
        debug!("Loaded {} country codes", table.len());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::country::CountryCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REFERENCE_CSV: &str = "COUNTRY|CODE\nUS|USD\nGermany|EUR\n";

    #[tokio::test]
    async fn test_read_local_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), REFERENCE_CSV).unwrap();

        let source = ReferenceFile::new(file.path().to_str().unwrap(), Duration::from_secs(5));
        let table = source.country_codes().await.unwrap();

        assert_eq!(table.codes(), vec![CountryCode::from("USD"), CountryCode::from("EUR")]);
        assert_eq!(table.entries()[1].country, "Germany");
    }

    #[tokio::test]
    async fn test_read_remote_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/codes.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(REFERENCE_CSV))
            .mount(&mock_server)
            .await;

        let url = format!("{}/codes.csv", mock_server.uri());
        let source = ReferenceFile::new(&url, Duration::from_secs(5));
        let table = source.country_codes().await.unwrap();

        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_remote_error_status_is_a_read_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let source = ReferenceFile::new(&mock_server.uri(), Duration::from_secs(5));
        assert!(matches!(
            source.country_codes().await,
            Err(ParseError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let source = ReferenceFile::new(missing.to_str().unwrap(), Duration::from_secs(5));

        assert!(matches!(
            source.country_codes().await,
            Err(ParseError::Read { .. })
        ));
    }
}
