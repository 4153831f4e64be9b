//! Error types for each stage of a run.

use crate::core::country::CountryCode;
use crate::core::storage::ObjectUri;
use thiserror::Error;

/// Exit status for failures before anything was uploaded.
pub const EXIT_DATASET: u8 = 1;
/// Exit status when the upload itself failed.
pub const EXIT_STORAGE: u8 = 2;
/// Exit status when the dataset was uploaded but the completion notice failed.
pub const EXIT_NOTIFY: u8 = 3;

/// The reference data could not be read or understood.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read reference data from {location}: {message}")]
    Read { location: String, message: String },

    #[error("Reference data has no `{column}` column")]
    MissingColumn { column: String },

    #[error("Reference row {line} is malformed: {value:?}")]
    MalformedRow { line: u64, value: String },

    #[error("Reference data is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Reference data lists no country codes")]
    Empty,
}

/// A data provider call failed for one code.
#[derive(Error, Debug)]
#[error("Failed to fetch data for {code}: {message}")]
pub struct FetchError {
    pub code: CountryCode,
    pub message: String,
}

/// Some expected codes are still missing after the one re-fetch attempt.
#[derive(Error, Debug)]
#[error("Dataset is incomplete, missing codes: {}", join_codes(.missing))]
pub struct IncompleteDatasetError {
    pub missing: Vec<CountryCode>,
}

fn join_codes(codes: &[CountryCode]) -> String {
    codes
        .iter()
        .map(CountryCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Incomplete(#[from] IncompleteDatasetError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid object URI {0:?}, expected <scheme>://<bucket>/<key>")]
    InvalidUri(String),

    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[from] csv::Error),

    #[error("Upload to {uri} failed: {message}")]
    Backend { uri: ObjectUri, message: String },

    #[error("Upload to {uri} timed out after {seconds}s")]
    Timeout { uri: ObjectUri, seconds: u64 },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to create topic {name}: {message}")]
    CreateTopic { name: String, message: String },

    #[error("Failed to subscribe {endpoint} to {topic}: {message}")]
    Subscribe {
        topic: String,
        endpoint: String,
        message: String,
    },

    #[error("Failed to publish to {topic}: {message}")]
    Publish { topic: String, message: String },
}

/// Everything that can end a run, mapped to a process exit status.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid configuration: {0:#}")]
    Config(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Dataset was uploaded to {destination} but the notification failed: {source}")]
    Notify {
        destination: ObjectUri,
        #[source]
        source: NotifyError,
    },
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) | RunError::Parse(_) | RunError::Dataset(_) => EXIT_DATASET,
            RunError::Storage(_) => EXIT_STORAGE,
            RunError::Notify { .. } => EXIT_NOTIFY,
        }
    }

    /// True when the run failed after the dataset was durably written.
    pub fn uploaded(&self) -> bool {
        matches!(self, RunError::Notify { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incomplete() -> RunError {
        RunError::Dataset(DatasetError::Incomplete(IncompleteDatasetError {
            missing: vec![CountryCode::from("EUR"), CountryCode::from("GBP")],
        }))
    }

    #[test]
    fn test_exit_codes_separate_upload_and_notify_failures() {
        let destination: ObjectUri = "s3://big-mac-data/big_mac.csv".parse().unwrap();

        assert_eq!(incomplete().exit_code(), 1);
        assert_eq!(RunError::Parse(ParseError::Empty).exit_code(), 1);
        assert_eq!(
            RunError::Storage(StorageError::Timeout {
                uri: destination.clone(),
                seconds: 5
            })
            .exit_code(),
            2
        );

        let notify = RunError::Notify {
            destination,
            source: NotifyError::Publish {
                topic: "arn:topic".to_string(),
                message: "boom".to_string(),
            },
        };
        assert_eq!(notify.exit_code(), 3);
        assert!(notify.uploaded());
        assert!(!incomplete().uploaded());
    }

    #[test]
    fn test_messages_name_the_failure() {
        assert_eq!(
            incomplete().to_string(),
            "Dataset is incomplete, missing codes: EUR, GBP"
        );

        let notify = RunError::Notify {
            destination: "s3://big-mac-data/big_mac.csv".parse().unwrap(),
            source: NotifyError::CreateTopic {
                name: "big-mac-topic".to_string(),
                message: "denied".to_string(),
            },
        };
        assert!(notify.to_string().contains("uploaded to s3://big-mac-data/big_mac.csv"));
        assert!(notify.to_string().contains("big-mac-topic"));
    }
}
