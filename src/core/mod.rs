//! Core business logic abstractions

pub mod config;
pub mod country;
pub mod dataset;
pub mod error;
pub mod log;
pub mod notify;
pub mod price;
pub mod storage;

// Re-export main types for cleaner imports
pub use country::{CountryCode, CountryCodeSource, CountryCodeTable, CountryEntry};
pub use dataset::Dataset;
pub use error::{
    DatasetError, FetchError, IncompleteDatasetError, NotifyError, ParseError, RunError,
    StorageError,
};
pub use notify::{MessagingClient, SubscriptionHandle, TopicHandle};
pub use price::{DataProvider, PriceRecord, PriceRow, SnapshotWindow};
pub use storage::{ObjectStore, ObjectUri};
