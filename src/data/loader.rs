use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, Int16Array, Int32Array, Int64Array, StringArray, UInt16Array, UInt32Array,
    UInt64Array,
};
use arrow::datatypes::DataType;
use once_cell::sync::Lazy;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CensusTable, Gender, Jurisdiction, Record};

// ---------------------------------------------------------------------------
// Errors – fatal at startup, no partial dashboard
// ---------------------------------------------------------------------------

/// A load failure. Both variants abort startup: a dashboard with no data is
/// not worth serving. Malformed individual rows are never errors; they are
/// dropped and tallied in [`CensusTable::skipped_rows`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("census file not found: {path}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad census data in {path}: {message}")]
    Format { path: PathBuf, message: String },
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
    if source.kind() == io::ErrorKind::NotFound {
        LoadError::NotFound {
            path: path.to_path_buf(),
            source,
        }
    } else {
        LoadError::Format {
            path: path.to_path_buf(),
            message: format!("could not read file: {source}"),
        }
    }
}

fn format_error(path: &Path, message: impl Into<String>) -> LoadError {
    LoadError::Format {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// LoadOptions – column names are configuration, not code
// ---------------------------------------------------------------------------

/// Loader configuration. The exact column names are an external contract
/// with the data source, so they live here instead of being hard-coded;
/// the struct deserializes from JSON for file-based configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub jurisdiction_col: String,
    pub occupation_col: String,
    pub gender_col: String,
    pub count_col: String,
    /// Metadata preamble lines before the header row. StatCan CSV extracts
    /// ship with several lines of notes above the actual table.
    pub skip_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            jurisdiction_col: "jurisdiction".to_string(),
            occupation_col: "occupation".to_string(),
            gender_col: "gender".to_string(),
            count_col: "count".to_string(),
            skip_rows: 0,
        }
    }
}

impl LoadOptions {
    fn columns(&self) -> [&str; 4] {
        [
            &self.jurisdiction_col,
            &self.occupation_col,
            &self.gender_col,
            &self.count_col,
        ]
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a census table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited text with a header row (the usual StatCan extract)
/// * `.json`    – records-oriented array of objects
/// * `.parquet` – flat columns (jurisdiction, occupation, gender, count)
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<CensusTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => load_csv(path, options)?,
        "json" => load_json(path, options)?,
        "parquet" | "pq" => load_parquet(path, options)?,
        other => {
            return Err(format_error(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    if table.skipped_rows() > 0 {
        log::warn!(
            "{}: excluded {} malformed rows ({} kept)",
            path.display(),
            table.skipped_rows(),
            table.len()
        );
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// Trailing footnote references as they appear in StatCan tables:
/// `"Registered nurses i12"`, `"Firefighters 3"`.
static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s+i?\d+)+\s*$").expect("footnote regex"));

/// Leading NOC code: `"31301 Registered nurses..."`, `"3 Health occupations"`.
static NOC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,5})\s+(.+)$").expect("NOC prefix regex"));

/// Split a raw occupation label into (NOC group code, clean label).
/// Footnote markers are stripped first; a label without a leading code
/// yields an empty group code.
fn normalize_occupation(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let stripped = FOOTNOTE.replace(trimmed, "");
    match NOC_PREFIX.captures(&stripped) {
        Some(caps) => (caps[1].to_string(), caps[2].trim().to_string()),
        None => (String::new(), stripped.trim().to_string()),
    }
}

/// Coerce a count field to an integer. Census extracts use thousands
/// separators; anything non-numeric (including negatives and the `..`
/// suppression marker) is rejected so the row gets dropped, never zeroed.
fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<u64>().ok()
}

/// Assemble one record from raw field text, or `None` when any field fails
/// to parse (the row is then excluded).
fn build_record(
    jurisdiction: &str,
    occupation: &str,
    gender: &str,
    count: &str,
) -> Option<Record> {
    let jurisdiction = Jurisdiction::from_str(jurisdiction).ok()?;
    let gender = Gender::from_str(gender).ok()?;
    let count = parse_count(count)?;
    let (noc_group, occupation) = normalize_occupation(occupation);
    if occupation.is_empty() {
        return None;
    }
    Some(Record {
        jurisdiction,
        noc_group,
        occupation,
        gender,
        count,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, options: &LoadOptions) -> Result<CensusTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;

    // Skip the metadata preamble before handing the rest to the CSV parser.
    let mut remaining = text.as_str();
    for _ in 0..options.skip_rows {
        match remaining.find('\n') {
            Some(pos) => remaining = &remaining[pos + 1..],
            None => remaining = "",
        }
    }

    let mut reader = csv::Reader::from_reader(remaining.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format_error(path, format!("unreadable header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut col_idx = [0usize; 4];
    for (slot, wanted) in col_idx.iter_mut().zip(options.columns()) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format_error(path, format!("missing required column '{wanted}'")))?;
    }
    let [jur_idx, occ_idx, gender_idx, count_idx] = col_idx;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::debug!("{}: row {row_no} unparseable: {e}", path.display());
                skipped += 1;
                continue;
            }
        };
        let field = |idx: usize| row.get(idx).unwrap_or("");
        match build_record(
            field(jur_idx),
            field(occ_idx),
            field(gender_idx),
            field(count_idx),
        ) {
            Some(rec) => records.push(rec),
            None => {
                log::debug!("{}: row {row_no} excluded (bad field value)", path.display());
                skipped += 1;
            }
        }
    }

    Ok(CensusTable::new(records, skipped))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "jurisdiction": "ON", "occupation": "31301 Registered nurses",
///     "gender": "female", "count": 100 },
///   ...
/// ]
/// ```
fn load_json(path: &Path, options: &LoadOptions) -> Result<CensusTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| format_error(path, format!("invalid JSON: {e}")))?;

    let rows = root
        .as_array()
        .ok_or_else(|| format_error(path, "expected a top-level JSON array"))?;

    // The schema check JSON affords: the first record must carry every
    // configured column, the analogue of a CSV header check.
    if let Some(first) = rows.first().and_then(|v| v.as_object()) {
        for wanted in options.columns() {
            if !first.contains_key(wanted) {
                return Err(format_error(
                    path,
                    format!("missing required column '{wanted}'"),
                ));
            }
        }
    }

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for (row_no, row) in rows.iter().enumerate() {
        let parsed = row.as_object().and_then(|obj| {
            let text_field = |col: &str| obj.get(col).and_then(|v| v.as_str());
            let count = match obj.get(options.count_col.as_str()) {
                Some(JsonValue::Number(n)) => n.as_u64().map(|c| c.to_string()),
                Some(JsonValue::String(s)) => Some(s.clone()),
                _ => None,
            }?;
            build_record(
                text_field(&options.jurisdiction_col)?,
                text_field(&options.occupation_col)?,
                text_field(&options.gender_col)?,
                &count,
            )
        });
        match parsed {
            Some(rec) => records.push(rec),
            None => {
                log::debug!("{}: row {row_no} excluded (bad field value)", path.display());
                skipped += 1;
            }
        }
    }

    Ok(CensusTable::new(records, skipped))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet census extract with flat columns: Utf8 for jurisdiction,
/// occupation and gender, an integer type for count. Works with files
/// written by both Pandas (`df.to_parquet()`) and Polars
/// (`df.write_parquet()`).
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<CensusTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| format_error(path, format!("unreadable parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| format_error(path, format!("could not build parquet reader: {e}")))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| format_error(path, format!("unreadable record batch: {e}")))?;
        let schema = batch.schema();

        let mut col_idx = [0usize; 4];
        for (slot, wanted) in col_idx.iter_mut().zip(options.columns()) {
            *slot = schema
                .index_of(wanted)
                .map_err(|_| format_error(path, format!("missing required column '{wanted}'")))?;
        }
        let [jur_idx, occ_idx, gender_idx, count_idx] = col_idx;

        for row in 0..batch.num_rows() {
            let parsed = (|| {
                let jurisdiction = string_at(batch.column(jur_idx), row)?;
                let occupation = string_at(batch.column(occ_idx), row)?;
                let gender = string_at(batch.column(gender_idx), row)?;
                let count = int_at(batch.column(count_idx), row)?;
                build_record(&jurisdiction, &occupation, &gender, &count.to_string())
            })();
            match parsed {
                Some(rec) => records.push(rec),
                None => {
                    log::debug!("{}: row {row} excluded (bad field value)", path.display());
                    skipped += 1;
                }
            }
        }
    }

    Ok(CensusTable::new(records, skipped))
}

// -- Parquet / Arrow helpers --

/// Extract a string cell from a Utf8 or LargeUtf8 column; `None` for nulls
/// or other types.
fn string_at(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

/// Extract a non-negative integer cell; `None` for nulls, negatives, or
/// non-integer types. Pandas writes counts as signed ints, Polars often as
/// unsigned, so both families are accepted.
fn int_at(col: &Arc<dyn Array>, row: usize) -> Option<u64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Int64 => {
            u64::try_from(col.as_any().downcast_ref::<Int64Array>()?.value(row)).ok()
        }
        DataType::Int32 => {
            u64::try_from(col.as_any().downcast_ref::<Int32Array>()?.value(row)).ok()
        }
        DataType::Int16 => {
            u64::try_from(col.as_any().downcast_ref::<Int16Array>()?.value(row)).ok()
        }
        DataType::UInt64 => Some(col.as_any().downcast_ref::<UInt64Array>()?.value(row)),
        DataType::UInt32 => Some(u64::from(
            col.as_any().downcast_ref::<UInt32Array>()?.value(row),
        )),
        DataType::UInt16 => Some(u64::from(
            col.as_any().downcast_ref::<UInt16Array>()?.value(row),
        )),
        _ => None,
    }
}
