//! One ingest run: fetch, extract, normalize, persist, report.

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{info, warn};

use crate::error::IngestError;
use crate::extract::Layout;
use crate::fetch::Fetcher;
use crate::rate_record::RateRecord;
use crate::store::RateStore;

/// Outcome of a run that stored at least one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub date: NaiveDate,
    pub captured_at: NaiveDateTime,
    /// Quotes accepted by the extractor.
    pub extracted: usize,
    /// Rows rejected by the extractor.
    pub skipped: usize,
    pub stored: usize,
    /// Records the store rejected.
    pub failed: usize,
}

pub struct Pipeline<'a> {
    fetcher: &'a Fetcher,
    layout: &'a Layout,
    store: &'a RateStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a Fetcher, layout: &'a Layout, store: &'a RateStore) -> Self {
        Self {
            fetcher,
            layout,
            store,
        }
    }

    /// Runs the pipeline for today's local date.
    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Runs the pipeline with `now` as the capture time; the rates are stored
    /// under `now`'s date.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<IngestReport, IngestError> {
        info!("Fetching {} document from {}", self.layout.name(), self.fetcher.url());
        let body = self.fetcher.fetch().await?;
        info!("Downloaded {} bytes", body.len());

        let extraction = self.layout.extract(&body)?;
        for skipped in &extraction.skipped {
            warn!("Skipping row {}: {}", skipped.row, skipped.reason);
        }
        info!(
            "Extracted {} currency pairs ({} rows skipped)",
            extraction.quotes.len(),
            extraction.skipped.len()
        );

        let extracted = extraction.quotes.len();
        let mut stored = 0;
        let mut failed = 0;
        for quote in extraction.quotes {
            let record = RateRecord::from_quote(quote, now);
            match self.store.upsert(&record).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    warn!("Error storing {}: {}", record.currency_pair, e);
                    failed += 1;
                }
            }
        }

        if stored == 0 {
            return Err(IngestError::NothingPersisted { extracted, failed });
        }

        let report = IngestReport {
            date: now.date(),
            captured_at: now,
            extracted,
            skipped: extraction.skipped.len(),
            stored,
            failed,
        };
        info!("Stored {} rates for {}", report.stored, report.date);
        Ok(report)
    }
}
