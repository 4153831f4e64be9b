use async_trait::async_trait;
use bigmac::app::{Collaborators, run_pipeline};
use bigmac::core::config::AppConfig;
use bigmac::core::country::CountryCode;
use bigmac::core::notify::{MessagingClient, SubscriptionHandle, TopicHandle};
use bigmac::core::price::{DataProvider, PriceRow, SnapshotWindow};
use bigmac::core::storage::{ObjectStore, ObjectUri};
use bigmac::core::{Dataset, RunError};
use bigmac::providers::{NasdaqDataLinkProvider, ReferenceFile};
use bigmac::store::DiskObjectStore;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

// In-memory stand-ins for the external services
mod test_utils {
    use super::*;

    pub struct StubProvider {
        pub prices: HashMap<&'static str, f64>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        pub fn new(prices: &[(&'static str, f64)]) -> Self {
            Self {
                prices: prices.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DataProvider for StubProvider {
        async fn fetch(
            &self,
            code: &CountryCode,
            window: &SnapshotWindow,
        ) -> anyhow::Result<Option<PriceRow>> {
            self.calls.lock().unwrap().push(code.to_string());
            Ok(self.prices.get(code.as_str()).map(|price| PriceRow {
                date: window.start(),
                values: vec![("Price".to_string(), Some(*price))],
            }))
        }
    }

    #[derive(Default)]
    pub struct RecordingStore {
        pub fail: bool,
        pub puts: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(
            &self,
            uri: &ObjectUri,
            body: Vec<u8>,
            _content_type: &str,
        ) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("bucket does not exist");
            }
            self.puts.lock().unwrap().push((uri.to_string(), body));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingMessaging {
        pub fail_publish: bool,
        pub calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingClient for RecordingMessaging {
        async fn create_topic(&self, name: &str) -> anyhow::Result<TopicHandle> {
            self.calls.lock().unwrap().push(format!("create_topic {name}"));
            Ok(TopicHandle::new(format!("arn:test:{name}")))
        }

        async fn subscribe(
            &self,
            topic: &TopicHandle,
            protocol: &str,
            endpoint: &str,
        ) -> anyhow::Result<SubscriptionHandle> {
            self.calls.lock().unwrap().push(format!("subscribe {topic}"));
            Ok(SubscriptionHandle::new(format!("{topic}:{protocol}:{endpoint}")))
        }

        async fn publish(
            &self,
            topic: &TopicHandle,
            message: &str,
            _subject: &str,
        ) -> anyhow::Result<()> {
            if self.fail_publish {
                anyhow::bail!("throttled");
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("publish {topic}: {message}"));
            Ok(())
        }
    }

    pub fn reference_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(file.path(), "COUNTRY|CODE\nUS|USD\nGermany|EUR\n")
            .expect("Failed to write reference file");
        file
    }

    pub fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.notification.endpoint = Some("ops@example.com".to_string());
        config
    }
}

use test_utils::*;

#[test_log::test(tokio::test)]
async fn test_incomplete_dataset_aborts_before_upload() {
    let reference = reference_file();
    let codes = ReferenceFile::new(reference.path().to_str().unwrap(), Duration::from_secs(5));
    let provider = StubProvider::new(&[("USD", 5.65)]);
    let store = RecordingStore::default();
    let messaging = RecordingMessaging::default();

    let result = run_pipeline(
        &config(),
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await;

    let err = result.expect_err("run should fail");
    info!(%err, "Run failed as expected");
    assert_eq!(err.exit_code(), 1);
    assert!(matches!(err, RunError::Dataset(_)));
    assert!(store.puts.lock().unwrap().is_empty(), "no upload expected");
    assert!(messaging.calls.lock().unwrap().is_empty(), "no notification expected");
}

#[test_log::test(tokio::test)]
async fn test_complete_dataset_is_uploaded_and_announced() {
    let reference = reference_file();
    let codes = ReferenceFile::new(reference.path().to_str().unwrap(), Duration::from_secs(5));
    let provider = StubProvider::new(&[("USD", 5.65), ("EUR", 4.25)]);
    let store = RecordingStore::default();
    let messaging = RecordingMessaging::default();

    let report = run_pipeline(
        &config(),
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await
    .expect("run should succeed");

    assert_eq!(report.rows, 2);
    assert_eq!(report.destination.to_string(), "s3://big-mac-data/big_mac.csv");
    assert_eq!(
        report.subscription.as_str(),
        "arn:test:big-mac-topic:email:ops@example.com"
    );

    let puts = store.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "s3://big-mac-data/big_mac.csv");
    let uploaded = Dataset::from_csv_reader(puts[0].1.as_slice()).unwrap();
    assert_eq!(uploaded.codes(), vec![CountryCode::from("USD"), CountryCode::from("EUR")]);

    let calls = messaging.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], "create_topic big-mac-topic");
    assert_eq!(calls[1], "subscribe arn:test:big-mac-topic");
    assert!(calls[2].starts_with("publish arn:test:big-mac-topic:"));
    assert!(calls[2].contains("s3://big-mac-data/big_mac.csv"));
}

#[test_log::test(tokio::test)]
async fn test_notification_failure_keeps_upload() {
    let reference = reference_file();
    let codes = ReferenceFile::new(reference.path().to_str().unwrap(), Duration::from_secs(5));
    let provider = StubProvider::new(&[("USD", 5.65), ("EUR", 4.25)]);
    let store = RecordingStore::default();
    let messaging = RecordingMessaging {
        fail_publish: true,
        ..Default::default()
    };

    let err = run_pipeline(
        &config(),
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await
    .expect_err("run should fail");

    assert_eq!(err.exit_code(), 3);
    assert!(err.uploaded());
    assert_eq!(store.puts.lock().unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_upload_failure_skips_notification() {
    let reference = reference_file();
    let codes = ReferenceFile::new(reference.path().to_str().unwrap(), Duration::from_secs(5));
    let provider = StubProvider::new(&[("USD", 5.65), ("EUR", 4.25)]);
    let store = RecordingStore {
        fail: true,
        ..Default::default()
    };
    let messaging = RecordingMessaging::default();

    let err = run_pipeline(
        &config(),
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await
    .expect_err("run should fail");

    assert_eq!(err.exit_code(), 2);
    assert!(messaging.calls.lock().unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_missing_endpoint_is_rejected_before_any_call() {
    let reference = reference_file();
    let codes = ReferenceFile::new(reference.path().to_str().unwrap(), Duration::from_secs(5));
    let provider = StubProvider::new(&[("USD", 5.65), ("EUR", 4.25)]);
    let store = RecordingStore::default();
    let messaging = RecordingMessaging::default();

    let err = run_pipeline(
        &AppConfig::default(),
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await
    .expect_err("run should fail");

    assert!(matches!(err, RunError::Config(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(provider.calls.lock().unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_full_flow_with_mock_provider_and_disk_store() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    for (code, price) in [("USD", 5.65), ("EUR", 4.25)] {
        let body = format!(
            r#"{{"dataset": {{"column_names": ["Date", "local_price", "dollar_price"],
                "data": [["2021-07-31", {price}, {price}]]}}}}"#
        );
        Mock::given(method("GET"))
            .and(path(format!("/api/v3/datasets/ECONOMIST/BIGMAC_{code}.json")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let out_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let reference = reference_file();

    let mut config = config();
    config.provider.base_url = mock_server.uri();
    config.provider.api_key = Some("test-key".to_string());
    config.reference.location = reference.path().to_str().unwrap().to_string();

    let codes = ReferenceFile::new(&config.reference.location, config.provider.timeout());
    let provider = NasdaqDataLinkProvider::new(&config.provider).unwrap();
    let store = DiskObjectStore::new(out_dir.path());
    let messaging = RecordingMessaging::default();

    let report = run_pipeline(
        &config,
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: &store,
            messaging: &messaging,
        },
        ProgressBar::hidden(),
    )
    .await
    .expect("run should succeed");

    let written = std::fs::read_to_string(store.path_for(&report.destination)).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "Date,local_price,dollar_price,Country");
    assert_eq!(lines[1], "2021-07-31,5.65,5.65,USD");
    assert_eq!(lines[2], "2021-07-31,4.25,4.25,EUR");
}
