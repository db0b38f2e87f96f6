//! # Dataset Import
//!
//! Reads tabular data into ordered [`DataRow`]s from JSON, CSV or the first
//! worksheet of a spreadsheet.
//!
//! JSON comes in two shapes:
//!
//! - an array of objects: every object is a row, keys are column names and
//!   the dataset always has headers;
//! - an array of arrays: the first array is either a header row or data,
//!   decided by [`HeaderMode`].
//!
//! CSV and spreadsheets are read as arrays of rows. Their first row names
//! the columns unless [`HeaderMode::Absent`] is asked for.
//!
//! Cells must be scalars. Numbers stay numbers, booleans become text,
//! `null` becomes empty text. Nested arrays or objects are rejected.
//! Repeated column names get a numeric suffix (`price`, `price_2`).

mod table;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::LienzoError;
use crate::model::{CellValue, DataRow, Dataset};

/// Whether the first row of an array-of-arrays, CSV or sheet dataset names
/// the columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    Present,
    Absent,
    /// For JSON arrays, treat the first row as headers when its values are
    /// not all strings. CSV and sheets always read it as headers.
    ///
    /// This is a heuristic: an all-text dataset is read as headerless.
    #[default]
    Auto,
}

impl HeaderMode {
    fn first_row_is_header(self, first: &[Value]) -> bool {
        match self {
            HeaderMode::Present => true,
            HeaderMode::Absent => false,
            HeaderMode::Auto => !first.iter().all(Value::is_string),
        }
    }
}

/// Encoding of an imported dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Json,
    Csv,
    /// xlsx, xlsm, xlsb, xls or ods; only the first worksheet is read.
    Spreadsheet,
}

impl DataFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(DataFormat::Spreadsheet),
            _ => None,
        }
    }

    /// Format implied by a `Content-Type` header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/json" | "text/json" => Some(DataFormat::Json),
            "text/csv" | "application/csv" | "text/comma-separated-values" => Some(DataFormat::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.ms-excel.sheet.macroenabled.12"
            | "application/vnd.ms-excel.sheet.binary.macroenabled.12"
            | "application/vnd.oasis.opendocument.spreadsheet" => Some(DataFormat::Spreadsheet),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRow {
    Record(IndexMap<String, Value>),
    Cells(Vec<Value>),
}

/// Parse a JSON dataset.
pub fn parse_json(text: &str, mode: HeaderMode) -> Result<Dataset, LienzoError> {
    let raw: Vec<RawRow> = serde_json::from_str(text).map_err(|e| {
        LienzoError::import(format!(
            "Expected a JSON array of objects or arrays: {}",
            e
        ))
    })?;
    if raw.is_empty() {
        return Err(LienzoError::import("Dataset has no rows"));
    }

    let dataset = match &raw[0] {
        RawRow::Record(_) => from_records(raw)?,
        RawRow::Cells(_) => from_cells(raw, mode)?,
    };
    with_data_rows(dataset)
}

/// Parse CSV text. The first line holds headers unless `mode` is `Absent`.
pub fn parse_csv(bytes: &[u8], mode: HeaderMode) -> Result<Dataset, LienzoError> {
    from_table(table::csv_rows(bytes)?, mode)
}

/// Parse the first worksheet of a workbook. The first row holds headers
/// unless `mode` is `Absent`.
pub fn parse_spreadsheet(bytes: &[u8], mode: HeaderMode) -> Result<Dataset, LienzoError> {
    from_table(table::sheet_rows(bytes)?, mode)
}

/// Parse a dataset in the given format.
pub fn parse_dataset(
    bytes: &[u8],
    format: DataFormat,
    mode: HeaderMode,
) -> Result<Dataset, LienzoError> {
    match format {
        DataFormat::Json => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| LienzoError::import(format!("JSON dataset is not UTF-8: {}", e)))?;
            parse_json(text, mode)
        }
        DataFormat::Csv => parse_csv(bytes, mode),
        DataFormat::Spreadsheet => parse_spreadsheet(bytes, mode),
    }
}

/// Read and parse a dataset file. The format follows the extension; files
/// without a known one are read as JSON.
pub async fn load_dataset(path: &Path, mode: HeaderMode) -> Result<Dataset, LienzoError> {
    let format = DataFormat::from_path(path).unwrap_or(DataFormat::Json);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LienzoError::import(format!("Failed to read {}: {}", path.display(), e)))?;
    let dataset = parse_dataset(&bytes, format, mode)?;
    info!(
        path = %path.display(),
        format = ?format,
        rows = dataset.rows.len(),
        has_headers = dataset.has_headers,
        "Imported dataset"
    );
    Ok(dataset)
}

fn with_data_rows(dataset: Dataset) -> Result<Dataset, LienzoError> {
    if dataset.rows.is_empty() {
        return Err(LienzoError::import("Dataset has no data rows"));
    }
    Ok(dataset)
}

/// Headers are the norm for sheets, so `Auto` reads the first row as names.
fn from_table(rows: Vec<Vec<Value>>, mode: HeaderMode) -> Result<Dataset, LienzoError> {
    if rows.is_empty() {
        return Err(LienzoError::import("Dataset has no rows"));
    }
    let mode = match mode {
        HeaderMode::Auto => HeaderMode::Present,
        explicit => explicit,
    };
    with_data_rows(from_arrays(rows, mode)?)
}

fn from_records(raw: Vec<RawRow>) -> Result<Dataset, LienzoError> {
    let mut rows = Vec::with_capacity(raw.len());
    for (i, row) in raw.into_iter().enumerate() {
        let RawRow::Record(record) = row else {
            return Err(LienzoError::import(format!(
                "Row {} is an array; expected an object like the first row",
                i + 1
            )));
        };
        let mut data = DataRow::new();
        for (column, value) in record {
            let cell = cell(&value, i + 1, &column)?;
            data.insert(column, cell);
        }
        rows.push(data);
    }
    Ok(Dataset {
        rows,
        has_headers: true,
    })
}

fn from_cells(raw: Vec<RawRow>, mode: HeaderMode) -> Result<Dataset, LienzoError> {
    let mut arrays = Vec::with_capacity(raw.len());
    for (i, row) in raw.into_iter().enumerate() {
        match row {
            RawRow::Cells(cells) => arrays.push(cells),
            RawRow::Record(_) => {
                return Err(LienzoError::import(format!(
                    "Row {} is an object; expected an array like the first row",
                    i + 1
                )))
            }
        }
    }
    from_arrays(arrays, mode)
}

fn from_arrays(arrays: Vec<Vec<Value>>, mode: HeaderMode) -> Result<Dataset, LienzoError> {
    let has_headers = mode.first_row_is_header(&arrays[0]);
    let width = arrays.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns: Vec<String> = if has_headers {
        arrays[0]
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Value::String(_) | Value::Null => column_name(i),
                other => other.to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };
    columns.extend((columns.len()..width).map(column_name));
    let columns = unique_columns(columns);

    let skip = usize::from(has_headers);
    let mut rows = Vec::with_capacity(arrays.len() - skip);
    for (i, cells) in arrays.iter().enumerate().skip(skip) {
        let mut data = DataRow::new();
        for (column, value) in columns.iter().zip(cells) {
            data.insert(column.clone(), cell(value, i + 1, column)?);
        }
        rows.push(data);
    }
    Ok(Dataset { rows, has_headers })
}

/// Suffix repeated names so no column shadows another.
fn unique_columns(columns: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut unique = Vec::with_capacity(columns.len());
    for name in columns {
        let mut candidate = name.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

/// Generated name for a headerless column (0-based index).
fn column_name(index: usize) -> String {
    format!("column_{}", index + 1)
}

fn cell(value: &Value, row: usize, column: &str) -> Result<CellValue, LienzoError> {
    match value {
        Value::String(s) => Ok(CellValue::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
            LienzoError::import(format!("Row {}, column '{}': number out of range", row, column))
        }),
        Value::Bool(b) => Ok(CellValue::Text(b.to_string())),
        Value::Null => Ok(CellValue::Text(String::new())),
        Value::Array(_) | Value::Object(_) => Err(LienzoError::import(format!(
            "Row {}, column '{}': nested values are not supported",
            row, column
        ))),
    }
}
