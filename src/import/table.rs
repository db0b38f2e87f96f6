//! CSV and spreadsheet readers.
//!
//! Both yield rows of JSON scalars, so header detection and cell conversion
//! are shared with JSON arrays.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Number, Value};
use std::io::Cursor;

use crate::error::LienzoError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Comma-separated rows. Every field is text; blank lines are skipped.
pub(super) fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Value>>, LienzoError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LienzoError::import(format!("Invalid CSV: {}", e)))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|field| Value::String(field.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Rows of the first worksheet of an xlsx, xlsm, xlsb, xls or ods workbook.
pub(super) fn sheet_rows(bytes: &[u8]) -> Result<Vec<Vec<Value>>, LienzoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LienzoError::import(format!("Unreadable spreadsheet: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LienzoError::import("Spreadsheet has no worksheets"))?
        .map_err(|e| LienzoError::import(format!("Failed to read first worksheet: {}", e)))?;

    Ok(range
        .rows()
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| row.iter().map(sheet_cell).collect())
        .collect())
}

fn sheet_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        // Dates, durations and error cells keep their displayed form.
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_csv_quotes_and_blank_lines() {
        let rows = csv_rows(b"\xEF\xBB\xBFname,note\n\"Tea, green\",\"say \"\"hi\"\"\"\n,\nCocoa\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("name"), json!("note")],
                vec![json!("Tea, green"), json!("say \"hi\"")],
                vec![json!("Cocoa")],
            ]
        );
    }

    #[test]
    fn test_sheet_cells_keep_types() {
        assert_eq!(sheet_cell(&Data::Empty), Value::Null);
        assert_eq!(sheet_cell(&Data::Int(7)), json!(7));
        assert_eq!(sheet_cell(&Data::Float(2.5)), json!(2.5));
        assert_eq!(sheet_cell(&Data::Bool(true)), json!(true));
        assert_eq!(sheet_cell(&Data::String("Tea".into())), json!("Tea"));
    }

    #[test]
    fn test_garbage_is_not_a_workbook() {
        let err = sheet_rows(b"name,price\nTea,3\n").unwrap_err();
        assert!(matches!(err, LienzoError::Import(_)));
    }
}
