//! Read side: dates, per-day rates, conversion and CSV export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::StoreError;
use crate::rate_record::RateRecord;
use crate::store::RateStore;

pub const CSV_HEADERS: [&str; 4] = [
    "Currency Pair",
    "TT Buying (INR)",
    "TT Selling (INR)",
    "Last Updated",
];

/// Totals for converting a foreign amount at a record's rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub buying_total: Decimal,
    pub selling_total: Decimal,
}

/// `amount × tt_buying` and `amount × tt_selling`. Negative amounts are
/// converted as-is; `None` when a total overflows `Decimal`.
pub fn convert(record: &RateRecord, amount: Decimal) -> Option<Conversion> {
    Some(Conversion {
        buying_total: amount.checked_mul(record.tt_buying)?,
        selling_total: amount.checked_mul(record.tt_selling)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub total_pairs: usize,
    pub highest_selling: Option<Decimal>,
}

pub fn day_summary(records: &[RateRecord]) -> DaySummary {
    DaySummary {
        total_pairs: records.len(),
        highest_selling: records.iter().map(|r| r.tt_selling).max(),
    }
}

/// How much history the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub days: usize,
    pub latest: Option<NaiveDate>,
    pub oldest: Option<NaiveDate>,
}

impl Coverage {
    /// `dates` must be most recent first, as [`RatesView::list_available_dates`] returns them.
    pub fn from_dates(dates: &[NaiveDate]) -> Self {
        Self {
            days: dates.len(),
            latest: dates.first().copied(),
            oldest: dates.last().copied(),
        }
    }
}

pub fn csv_file_name(date: NaiveDate) -> String {
    format!("hdfc_forex_{}.csv", date.format("%Y-%m-%d"))
}

/// Renders the day's table as CSV.
pub fn to_csv(records: &[RateRecord]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for record in records {
        writer.write_record([
            record.currency_pair.clone(),
            record.tt_buying.to_string(),
            record.tt_selling.to_string(),
            record.captured_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read-only queries over the rate store.
#[derive(Debug, Clone)]
pub struct RatesView {
    store: RateStore,
}

impl RatesView {
    pub fn new(store: RateStore) -> Self {
        Self { store }
    }

    pub async fn list_available_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        self.store.distinct_dates().await
    }

    pub async fn rates_for_date(&self, date: NaiveDate) -> Result<Vec<RateRecord>, StoreError> {
        self.store.query_by_date(date).await
    }
}
