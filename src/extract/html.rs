use crate::document::RawTable;
use crate::error::ExtractError;
use crate::rate_record::RateQuote;

use super::{Extraction, SkipReason, quote_from_cells};

/// Column headers of the rates table on the bank's HTML page.
///
/// The first table of the page is the rates table. Headers are matched
/// exactly (after whitespace is collapsed).
#[derive(Debug, Clone)]
pub struct HtmlLayout {
    pub pair_header: String,
    /// Accepted headers for the buying column, first match wins.
    pub buying_headers: Vec<String>,
    pub selling_headers: Vec<String>,
}

impl Default for HtmlLayout {
    fn default() -> Self {
        Self {
            pair_header: "Currency Pair".to_string(),
            buying_headers: vec!["T.T Buying(Inw Rem)".to_string(), "TT Buying".to_string()],
            selling_headers: vec!["T.T Selling(O / w Rem)".to_string(), "TT Selling".to_string()],
        }
    }
}

fn find_column(headers: &[String], wanted: &[String]) -> Option<usize> {
    wanted
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

impl HtmlLayout {
    pub fn extract_tables(&self, tables: &[RawTable]) -> Result<Extraction, ExtractError> {
        let table = tables.first().ok_or(ExtractError::NoTable)?;

        let pair_col = find_column(&table.headers, std::slice::from_ref(&self.pair_header))
            .ok_or_else(|| ExtractError::MissingColumn(self.pair_header.clone()))?;
        let buying_col = find_column(&table.headers, &self.buying_headers)
            .ok_or_else(|| ExtractError::MissingColumn(self.buying_headers.join(" | ")))?;
        let selling_col = find_column(&table.headers, &self.selling_headers)
            .ok_or_else(|| ExtractError::MissingColumn(self.selling_headers.join(" | ")))?;

        let mut extraction = Extraction::default();
        for (index, row) in table.rows.iter().enumerate() {
            extraction.push(index, read_row(row, pair_col, buying_col, selling_col));
        }
        extraction.into_result()
    }
}

fn read_row(row: &[String], pair_col: usize, buying_col: usize, selling_col: usize) -> Result<RateQuote, SkipReason> {
    let cell = |i: usize| row.get(i).map(|c| c.trim()).ok_or(SkipReason::MissingCell);

    let pair = cell(pair_col)?;
    if pair.is_empty() {
        return Err(SkipReason::EmptyPair);
    }
    quote_from_cells(pair, cell(buying_col)?, cell(selling_col)?)
}
