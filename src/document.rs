//! Decoding of the fetched document into raw string tables.
//!
//! The HTML and PDF readers do no interpretation of their own: they hand the
//! layouts in [`crate::extract`] a list of [`RawTable`]s, in document order.

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

/// A table as it appears in the document, cells still as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header cells, empty when the source has no header notion (PDF text).
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Widest row (or header) in the table.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Malformed(format!("selector {css}: {e}")))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
}

/// Reads every `<table>` of an HTML document.
///
/// The first row made only of `<th>` cells becomes the header; without one,
/// the first row is used.
pub fn html_tables(body: &[u8]) -> Result<Vec<RawTable>, ExtractError> {
    let text = std::str::from_utf8(body).map_err(|e| ExtractError::Malformed(e.to_string()))?;
    let document = Html::parse_document(text);

    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;
    let td_sel = selector("td")?;

    let mut tables = Vec::new();
    for table in document.select(&table_sel) {
        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            if cells.is_empty() {
                continue;
            }
            let header_row = row.select(&td_sel).next().is_none();
            if headers.is_none() && header_row {
                headers = Some(cells);
            } else {
                rows.push(cells);
            }
        }

        let headers = match headers {
            Some(h) => h,
            None if !rows.is_empty() => rows.remove(0),
            None => Vec::new(),
        };
        tables.push(RawTable { headers, rows });
    }

    Ok(tables)
}

/// Reads a PDF document by extracting its text and splitting it into tables.
pub fn pdf_tables(body: &[u8]) -> Result<Vec<RawTable>, ExtractError> {
    if !body.starts_with(b"%PDF") {
        return Err(ExtractError::Malformed("missing %PDF header".to_string()));
    }
    let text = pdf_extract::extract_text_from_mem(body)
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;
    Ok(tables_from_text(&text))
}

/// Splits extracted text into tables.
///
/// Each non-blank line is a row of whitespace-separated cells; consecutive
/// rows with the same cell count belong to the same table.
pub fn tables_from_text(text: &str) -> Vec<RawTable> {
    let mut tables: Vec<RawTable> = Vec::new();
    let mut current = RawTable::default();

    for line in text.lines() {
        let cells: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if cells.is_empty() {
            continue;
        }
        let same_shape = current.rows.last().is_some_and(|r| r.len() == cells.len());
        if !current.rows.is_empty() && !same_shape {
            tables.push(std::mem::take(&mut current));
        }
        current.rows.push(cells);
    }
    if !current.rows.is_empty() {
        tables.push(current);
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_tables_with_th_header() {
        let html = r#"
            <html><body>
            <table>
              <thead><tr><th>Currency  Pair</th><th>T.T Buying(Inw Rem)</th></tr></thead>
              <tbody>
                <tr><td> USD-INR </td><td>83.10</td></tr>
                <tr><td>EUR-INR</td><td>90.10</td></tr>
              </tbody>
            </table>
            <table><tr><td>a</td><td>b</td></tr></table>
            </body></html>
        "#;

        let tables = html_tables(html.as_bytes()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["Currency Pair", "T.T Buying(Inw Rem)"]);
        assert_eq!(tables[0].rows[0], vec!["USD-INR", "83.10"]);
        assert_eq!(tables[0].rows.len(), 2);

        // No <th>: the first row is the header.
        assert_eq!(tables[1].headers, vec!["a", "b"]);
        assert!(tables[1].rows.is_empty());
    }

    #[test]
    fn test_html_without_tables() {
        let tables = html_tables(b"<html><body><p>maintenance</p></body></html>").unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_html_rejects_invalid_utf8() {
        let err = html_tables(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_pdf_rejects_non_pdf() {
        let err = pdf_tables(b"<html></html>").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_tables_from_text_groups_by_shape() {
        let text = "Forex Card Rates\n\
                    Currency Pair Buying Selling\n\
                    \n\
                    USD-INR 83.10 83.50 USD-EUR 0.91 0.93\n\
                    GBP-INR 105.2 106.1 GBP-EUR 1.15 1.17\n\
                    Page 1\n";

        let tables = tables_from_text(text);
        let widths: Vec<usize> = tables.iter().map(RawTable::column_count).collect();
        assert_eq!(widths, vec![3, 4, 6, 2]);
        assert_eq!(tables[2].rows.len(), 2);
        assert_eq!(tables[2].rows[1][0], "GBP-INR");
    }

    #[test]
    fn test_column_count_uses_widest_row() {
        let table = RawTable {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into(), "2".into()], vec!["3".into()]],
        };
        assert_eq!(table.column_count(), 2);
    }
}
