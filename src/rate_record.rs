use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// A currency pair's TT rates as read from the source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub currency_pair: String,
    pub tt_buying: Decimal,
    pub tt_selling: Decimal,
}

/// One stored observation of a pair's rates, unique per (date, currency_pair).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub currency_pair: String,
    pub tt_buying: Decimal,
    pub tt_selling: Decimal,
    /// Wall-clock time of ingestion, not the rate's effective time.
    pub captured_at: NaiveDateTime,
}

impl RateRecord {
    pub fn from_quote(quote: RateQuote, captured_at: NaiveDateTime) -> Self {
        Self {
            date: captured_at.date(),
            currency_pair: quote.currency_pair,
            tt_buying: quote.tt_buying,
            tt_selling: quote.tt_selling,
            captured_at,
        }
    }
}
