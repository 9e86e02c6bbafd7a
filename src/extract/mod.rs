//! Rate extraction from raw document tables.
//!
//! A [`Layout`] is chosen per deployment: it decodes the fetched bytes into
//! tables and picks out the pair/buying/selling columns with a fixed
//! heuristic. Every row produces either a [`RateQuote`] or a [`SkipReason`].

mod html;
mod pdf;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

pub use html::HtmlLayout;
pub use pdf::PdfLayout;

use crate::document;
use crate::error::ExtractError;
use crate::rate_record::RateQuote;

/// Which of the two rate columns a cell came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateColumn {
    Buying,
    Selling,
}

impl fmt::Display for RateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buying => write!(f, "TT buying"),
            Self::Selling => write!(f, "TT selling"),
        }
    }
}

/// Why a table row did not yield a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPair,
    HeaderRow(String),
    NullMarker,
    /// The row is too short to hold the selected columns.
    MissingCell,
    InvalidRate { column: RateColumn, value: String },
    NonPositiveRate { column: RateColumn, value: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPair => write!(f, "empty currency pair"),
            Self::HeaderRow(cell) => write!(f, "header row {cell:?}"),
            Self::NullMarker => write!(f, "null currency pair"),
            Self::MissingCell => write!(f, "row too short"),
            Self::InvalidRate { column, value } => write!(f, "{column} rate {value:?} is not a number"),
            Self::NonPositiveRate { column, value } => write!(f, "{column} rate {value} is not positive"),
        }
    }
}

/// A rejected row, by its position in the selected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Accepted quotes plus every rejected row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub quotes: Vec<RateQuote>,
    pub skipped: Vec<SkippedRow>,
}

impl Extraction {
    fn push(&mut self, row: usize, outcome: Result<RateQuote, SkipReason>) {
        match outcome {
            Ok(quote) => self.quotes.push(quote),
            Err(reason) => self.skipped.push(SkippedRow { row, reason }),
        }
    }

    /// Turns an extraction with no accepted rows into [`ExtractError::NoData`].
    fn into_result(self) -> Result<Self, ExtractError> {
        if self.quotes.is_empty() {
            Err(ExtractError::NoData {
                skipped: self.skipped.len(),
            })
        } else {
            Ok(self)
        }
    }
}

/// Document shape plus column heuristic for one deployment.
#[derive(Debug, Clone)]
pub enum Layout {
    Html(HtmlLayout),
    Pdf(PdfLayout),
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Html(_) => "html",
            Self::Pdf(_) => "pdf",
        }
    }

    /// Decodes `body` and extracts its rate quotes.
    pub fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractError> {
        match self {
            Self::Html(layout) => layout.extract_tables(&document::html_tables(body)?),
            Self::Pdf(layout) => layout.extract_tables(&document::pdf_tables(body)?),
        }
    }
}

fn normalize_decimal_string(s: &str) -> String {
    s.trim().trim_start_matches('₹').trim().replace(',', "")
}

/// Parses a rate cell into a positive decimal.
pub fn parse_rate(cell: &str, column: RateColumn) -> Result<Decimal, SkipReason> {
    let normalized = normalize_decimal_string(cell);
    let value = Decimal::from_str(&normalized).map_err(|_| SkipReason::InvalidRate {
        column,
        value: cell.to_string(),
    })?;
    if value <= Decimal::ZERO {
        return Err(SkipReason::NonPositiveRate {
            column,
            value: normalized,
        });
    }
    Ok(value)
}

/// Builds a quote from the pair cell and the two rate cells of a row.
fn quote_from_cells(pair: &str, buying: &str, selling: &str) -> Result<RateQuote, SkipReason> {
    Ok(RateQuote {
        currency_pair: pair.to_string(),
        tt_buying: parse_rate(buying, RateColumn::Buying)?,
        tt_selling: parse_rate(selling, RateColumn::Selling)?,
    })
}
