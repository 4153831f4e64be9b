//! Assembles the dataset from per-code fetches and checks it is complete.

use crate::core::country::CountryCode;
use crate::core::dataset::Dataset;
use crate::core::error::{DatasetError, FetchError, IncompleteDatasetError};
use crate::core::price::{DataProvider, PriceRecord, SnapshotWindow};
use futures::{StreamExt, TryStreamExt, stream};
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Outcome of the completeness check.
#[derive(Debug, Default)]
pub struct Recovery {
    /// Expected codes absent from the first pass.
    pub missing: Vec<CountryCode>,
    /// Rows returned by re-fetching `missing`.
    pub recovered: Dataset,
}

impl Recovery {
    /// Complete when nothing was missing or the re-fetch returned at least one row.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() || !self.recovered.is_empty()
    }

    /// Missing codes that the re-fetch did not return either.
    pub fn still_missing(&self) -> Vec<CountryCode> {
        let recovered: BTreeSet<CountryCode> = self.recovered.codes().into_iter().collect();
        self.missing
            .iter()
            .filter(|c| !recovered.contains(*c))
            .cloned()
            .collect()
    }
}

pub struct DatasetBuilder<'a> {
    provider: &'a dyn DataProvider,
    window: SnapshotWindow,
    concurrency: usize,
    merge_recovered: bool,
    progress: ProgressBar,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(provider: &'a dyn DataProvider, window: SnapshotWindow) -> Self {
        Self {
            provider,
            window,
            concurrency: 1,
            merge_recovered: false,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_merge_recovered(mut self, merge: bool) -> Self {
        self.merge_recovered = merge;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    async fn fetch_one(&self, code: CountryCode) -> Result<Option<PriceRecord>, FetchError> {
        let result = self.provider.fetch(&code, &self.window).await;
        self.progress.inc(1);

        match result {
            Ok(row) => Ok(row.map(|row| PriceRecord::new(row, code))),
            Err(e) => {
                error!(error = %format!("{e:#}"), %code, "Failed to fetch price data");
                Err(FetchError {
                    code,
                    message: format!("{e:#}"),
                })
            }
        }
    }

    /// One fetch per code; rows come back tagged and in code order.
    pub async fn fetch_all(&self, codes: &[CountryCode]) -> Result<Dataset, FetchError> {
        self.progress.inc_length(codes.len() as u64);

        let rows: Vec<Option<PriceRecord>> = stream::iter(codes.iter().cloned())
            .map(|code| self.fetch_one(code))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let dataset: Dataset = rows.into_iter().flatten().collect();
        debug!("Fetched {} rows for {} codes", dataset.len(), codes.len());
        Ok(dataset)
    }

    /// Finds expected codes absent from `fetched` and re-fetches them once.
    pub async fn recover_missing(
        &self,
        expected: &[CountryCode],
        fetched: &[CountryCode],
    ) -> Result<Recovery, FetchError> {
        let expected_set: BTreeSet<&CountryCode> = expected.iter().collect();
        let fetched_set: BTreeSet<&CountryCode> = fetched.iter().collect();

        let unexpected: Vec<&str> = fetched_set
            .difference(&expected_set)
            .map(|c| c.as_str())
            .collect();
        if !unexpected.is_empty() {
            warn!(codes = ?unexpected, "Fetched rows for codes that were not requested");
        }

        let mut seen = BTreeSet::new();
        let missing: Vec<CountryCode> = expected
            .iter()
            .filter(|c| !fetched_set.contains(c) && seen.insert(*c))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(Recovery::default());
        }

        info!(codes = ?missing, "Re-fetching missing codes");
        let recovered = self.fetch_all(&missing).await?;
        Ok(Recovery { missing, recovered })
    }

    /// True iff every expected code was fetched, or the re-fetch of the missing ones returned data.
    pub async fn verify_complete(
        &self,
        expected: &[CountryCode],
        fetched: &[CountryCode],
    ) -> Result<bool, FetchError> {
        Ok(self.recover_missing(expected, fetched).await?.is_complete())
    }

    pub async fn build(&self, codes: &[CountryCode]) -> Result<Dataset, DatasetError> {
        let mut dataset = self.fetch_all(codes).await?;
        let recovery = self.recover_missing(codes, &dataset.codes()).await?;

        if !recovery.is_complete() {
            error!(codes = ?recovery.missing, "Dataset is incomplete");
            return Err(IncompleteDatasetError {
                missing: recovery.missing,
            }
            .into());
        }

        let still_missing = recovery.still_missing();
        if !still_missing.is_empty() {
            error!(codes = ?still_missing, "Codes still missing after re-fetch");
            return Err(IncompleteDatasetError {
                missing: still_missing,
            }
            .into());
        }

        if !recovery.recovered.is_empty() {
            if self.merge_recovered {
                info!("Merging {} recovered rows", recovery.recovered.len());
                dataset.append(recovery.recovered);
            } else {
                warn!(
                    codes = ?recovery.recovered.codes(),
                    "Discarding rows recovered by the re-fetch"
                );
            }
        }

        Ok(dataset)
    }
}
