//! Case manifest spreadsheet parsing.
//!
//! The manifest is a seven-column workbook with a header row. Parsing is
//! deliberately permissive: bad rows are dropped with a log line instead of
//! aborting the whole parse.

use crate::error::{IngestError, IngestResult};
use calamine::{Data, Reader, Xlsx};
use dialcenter_core::CaseRecord;
use std::io::Cursor;

// Fixed column order of the case manifest.
const CASE_NAME_COLUMN: usize = 0;
const CASE_NUMBER_COLUMN: usize = 1;
const NETWORK_TOPOLOGY_COLUMN: usize = 2;
const BUSINESS_CATEGORY_COLUMN: usize = 3;
const APP_NAME_COLUMN: usize = 4;
const TEST_STEPS_COLUMN: usize = 5;
const EXPECTED_RESULT_COLUMN: usize = 6;

/// A manifest cell, decoded into one of the value shapes the parser
/// understands.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// A text cell.
    Text(String),
    /// A numeric cell.
    Number(f64),
    /// A boolean cell.
    Bool(bool),
    /// A formula cell carrying its cached evaluation.
    Formula {
        /// Cached string evaluation, when the formula produced text.
        text: Option<String>,
        /// Cached numeric evaluation, used when no text is available.
        number: f64,
    },
    /// An empty or unrecognized cell.
    Empty,
}

impl CellValue {
    /// Coerce the cell to its string rendering.
    ///
    /// Text passes through trimmed; numbers render without scientific
    /// notation (integral values without a decimal point); booleans render
    /// as `"true"`/`"false"`; formulas use their cached text and fall back
    /// to the numeric rendering; empty cells render as the empty string.
    pub fn coerce(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(v) => render_number(*v),
            Self::Bool(b) => b.to_string(),
            Self::Formula {
                text: Some(s),
                number: _,
            } => s.trim().to_string(),
            Self::Formula { text: None, number } => render_number(*number),
            Self::Empty => String::new(),
        }
    }
}

fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Parse decoded manifest rows into case records.
///
/// Row 0 is the header and always skipped; parsing proceeds to the last
/// populated row. A candidate record is kept only if both its case name and
/// case number are non-empty after trimming; all other rows are silently
/// dropped.
pub fn parse_rows(rows: &[Vec<CellValue>]) -> Vec<CaseRecord> {
    let mut records = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(1) {
        let record = CaseRecord {
            case_name: cell(row, CASE_NAME_COLUMN),
            case_number: cell(row, CASE_NUMBER_COLUMN),
            network_topology: cell(row, NETWORK_TOPOLOGY_COLUMN),
            business_category: cell(row, BUSINESS_CATEGORY_COLUMN),
            app_name: cell(row, APP_NAME_COLUMN),
            test_steps: cell(row, TEST_STEPS_COLUMN),
            expected_result: cell(row, EXPECTED_RESULT_COLUMN),
        };
        if record.case_name.is_empty() || record.case_number.is_empty() {
            tracing::debug!(row = index, "dropping manifest row without case name or number");
            continue;
        }
        records.push(record);
    }
    records
}

fn cell(row: &[CellValue], column: usize) -> String {
    row.get(column).map(CellValue::coerce).unwrap_or_default()
}

/// Parse the manifest workbook into case records.
///
/// Fails with `InvalidSpreadsheet` when the payload is not a readable
/// workbook or contains no sheets. Only the first sheet is consulted. Rows
/// carrying a corrupt (error) cell are logged and skipped whole rather than
/// partially included.
pub fn parse_manifest(manifest: &[u8]) -> IngestResult<Vec<CaseRecord>> {
    let mut workbook = Xlsx::new(Cursor::new(manifest))
        .map_err(|e| IngestError::InvalidSpreadsheet(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::InvalidSpreadsheet("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::InvalidSpreadsheet(e.to_string()))?;
    let formulas = workbook.worksheet_formula(&sheet_name).ok();
    let start = range.start();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    'row: for (row_index, row) in range.rows().enumerate() {
        let mut cells = Vec::with_capacity(row.len());
        for (col_index, data) in row.iter().enumerate() {
            if let Data::Error(e) = data {
                tracing::warn!(
                    row = row_index,
                    column = col_index,
                    error = ?e,
                    "skipping manifest row with corrupt cell"
                );
                continue 'row;
            }
            let formula = formula_at(formulas.as_ref(), start, row_index, col_index);
            cells.push(decode_cell(data, formula));
        }
        rows.push(cells);
    }

    let records = parse_rows(&rows);
    tracing::info!(count = records.len(), "parsed case records from manifest");
    Ok(records)
}

fn decode_cell(data: &Data, formula: Option<&str>) -> CellValue {
    if formula.is_some_and(|f| !f.is_empty()) {
        return match data {
            Data::String(s) => CellValue::Formula {
                text: Some(s.clone()),
                number: 0.0,
            },
            Data::Float(v) => CellValue::Formula {
                text: None,
                number: *v,
            },
            Data::Int(v) => CellValue::Formula {
                text: None,
                number: *v as f64,
            },
            Data::Bool(b) => CellValue::Bool(*b),
            _ => CellValue::Empty,
        };
    }

    match data {
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Empty | Data::Error(_) => CellValue::Empty,
    }
}

fn formula_at<'a>(
    formulas: Option<&'a calamine::Range<String>>,
    start: Option<(u32, u32)>,
    row: usize,
    col: usize,
) -> Option<&'a str> {
    let formulas = formulas?;
    let (start_row, start_col) = start?;
    formulas
        .get_value((start_row + row as u32, start_col + col as u32))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &[u8] = include_bytes!("../tests/fixtures/cases.xlsx");

    fn text_row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::Text(v.to_string())).collect()
    }

    fn header() -> Vec<CellValue> {
        text_row(&["name", "number", "topology", "category", "app", "steps", "expected"])
    }

    #[test]
    fn test_coerce_text_trims() {
        assert_eq!(CellValue::Text("  TC001  ".to_string()).coerce(), "TC001");
    }

    #[test]
    fn test_coerce_integral_number_has_no_decimal_point() {
        assert_eq!(CellValue::Number(1003.0).coerce(), "1003");
        assert_eq!(CellValue::Number(-7.0).coerce(), "-7");
    }

    #[test]
    fn test_coerce_fractional_number_avoids_scientific_notation() {
        assert_eq!(CellValue::Number(2.5).coerce(), "2.5");
        assert_eq!(
            CellValue::Number(12345678901234.0).coerce(),
            "12345678901234"
        );
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(CellValue::Bool(true).coerce(), "true");
        assert_eq!(CellValue::Bool(false).coerce(), "false");
    }

    #[test]
    fn test_coerce_formula_prefers_text() {
        let formula = CellValue::Formula {
            text: Some(" TC010 ".to_string()),
            number: 0.0,
        };
        assert_eq!(formula.coerce(), "TC010");
    }

    #[test]
    fn test_coerce_formula_falls_back_to_number() {
        let formula = CellValue::Formula {
            text: None,
            number: 42.0,
        };
        assert_eq!(formula.coerce(), "42");
    }

    #[test]
    fn test_coerce_empty() {
        assert_eq!(CellValue::Empty.coerce(), "");
    }

    #[test]
    fn test_parse_rows_skips_header() {
        let rows = vec![header(), text_row(&["Case A", "TC001", "", "", "", "", ""])];
        let records = parse_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].case_name, "Case A");
        assert_eq!(records[0].case_number, "TC001");
    }

    #[test]
    fn test_parse_rows_permissive_any_position() {
        // Invalid rows at the start, middle, and end never affect valid ones.
        let invalid = text_row(&["", "", "", "", "", "", ""]);
        let valid_a = text_row(&["Case A", "TC001", "", "", "", "", ""]);
        let valid_b = text_row(&["Case B", "TC002", "", "", "", "", ""]);

        let rows = vec![header(), invalid.clone(), valid_a, invalid.clone(), valid_b, invalid];
        let records = parse_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].case_number, "TC001");
        assert_eq!(records[1].case_number, "TC002");
    }

    #[test]
    fn test_parse_rows_drops_missing_name_or_number() {
        let rows = vec![
            header(),
            text_row(&["", "TC001", "", "", "", "", ""]),
            text_row(&["Case B", "", "", "", "", "", ""]),
            text_row(&["Case C", "   ", "", "", "", "", ""]),
        ];
        assert!(parse_rows(&rows).is_empty());
    }

    #[test]
    fn test_parse_rows_short_row_pads_empty() {
        let rows = vec![header(), text_row(&["Case A", "TC001"])];
        let records = parse_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].network_topology, "");
        assert_eq!(records[0].expected_result, "");
    }

    #[test]
    fn test_parse_manifest_fixture() {
        let records = parse_manifest(FIXTURE).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].case_name, "4G Network Connection Test");
        assert_eq!(records[0].case_number, "TC001");
        assert_eq!(records[0].network_topology, "4G-Standalone");
        assert_eq!(records[0].expected_result, "Attachment succeeds");

        assert_eq!(records[1].case_number, "TC002");

        // Numeric case number coerces without a decimal point.
        assert_eq!(records[2].case_number, "1003");
    }

    #[test]
    fn test_parse_manifest_rejects_garbage() {
        let result = parse_manifest(b"definitely not a workbook");
        assert!(matches!(result, Err(IngestError::InvalidSpreadsheet(_))));
    }
}
