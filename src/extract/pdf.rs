use crate::document::RawTable;
use crate::error::ExtractError;
use crate::rate_record::RateQuote;

use super::{Extraction, SkipReason, quote_from_cells};

/// Cells of one column group: pair, TT buying, TT selling.
const GROUP_WIDTH: usize = 3;

const HEADER_TOKENS: [&str; 2] = ["Currency", "Pair"];
const NULL_MARKER: &str = "nan";

/// Fixed-position layout of the bank's PDF rate card.
///
/// The card prints `group_count` groups of [pair, buying, selling] side by
/// side; `group_index` selects the local-currency group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfLayout {
    pub group_index: usize,
    pub group_count: usize,
    /// Minimum rows for the single-group fallback table.
    pub min_rows: usize,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            group_index: 0,
            group_count: 3,
            min_rows: 5,
        }
    }
}

impl PdfLayout {
    /// Returns the table to read and the column offset of its pair cell.
    fn select<'a>(&self, tables: &'a [RawTable]) -> Result<(&'a RawTable, usize), ExtractError> {
        if tables.is_empty() {
            return Err(ExtractError::NoTable);
        }

        let grouped_width = GROUP_WIDTH * self.group_count;
        if let Some(table) = tables.iter().find(|t| t.column_count() == grouped_width) {
            return Ok((table, self.group_index * GROUP_WIDTH));
        }

        tables
            .iter()
            .find(|t| t.rows.len() >= self.min_rows && t.column_count() >= GROUP_WIDTH)
            .map(|t| (t, 0))
            .ok_or_else(|| ExtractError::LayoutMismatch {
                layout: "pdf",
                observed: tables.iter().map(RawTable::column_count).collect(),
            })
    }

    pub fn extract_tables(&self, tables: &[RawTable]) -> Result<Extraction, ExtractError> {
        let (table, offset) = self.select(tables)?;

        let mut extraction = Extraction::default();
        for (index, row) in table.rows.iter().enumerate() {
            extraction.push(index, read_row(row, offset));
        }
        extraction.into_result()
    }
}

fn read_row(row: &[String], offset: usize) -> Result<RateQuote, SkipReason> {
    let cells = row
        .get(offset..offset + GROUP_WIDTH)
        .ok_or(SkipReason::MissingCell)?;
    let pair = cells[0].trim();

    if pair.is_empty() {
        return Err(SkipReason::EmptyPair);
    }
    if pair.eq_ignore_ascii_case(NULL_MARKER) {
        return Err(SkipReason::NullMarker);
    }
    if HEADER_TOKENS.iter().any(|token| pair.contains(token)) {
        return Err(SkipReason::HeaderRow(pair.to_string()));
    }
    quote_from_cells(pair, cells[1].trim(), cells[2].trim())
}
