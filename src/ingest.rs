//! File ingestion: turn a source file of unknown layout into an in-memory
//! dataset of header names and string rows.
//!
//! Supported formats are delimited text (`.csv`, `.txt`, `.tsv`) and JSON
//! arrays of flat objects (`.json`). Anything else, spreadsheet workbooks
//! included, is rejected with [`MappingError::UnsupportedFormat`] before any
//! bytes are parsed. Files are read fully into memory; mapping inputs are
//! business-sized extracts, not bulk feeds.

use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde_json::Value;

use crate::{error::MappingError, io_utils};

/// An ingested source file: header names plus rows of cell text.
///
/// Rows are rectangular: every row holds exactly `headers.len()` values. A
/// file exposing no columns at all yields an empty `headers` vector, which
/// is valid input for matching, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Explicit delimiter for delimited formats; `None` means resolve from
    /// the extension or sniff the header line.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Cap on the number of data rows ingested.
    pub limit: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            limit: None,
        }
    }
}

enum FileKind {
    Delimited,
    Json,
}

/// Read a source file into a [`Dataset`], dispatching on its extension.
pub fn read_dataset(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    match classify(path)? {
        FileKind::Delimited => read_delimited(path, options),
        FileKind::Json => read_json(path, options),
    }
}

fn classify(path: &Path) -> Result<FileKind, MappingError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "txt" | "tsv" => Ok(FileKind::Delimited),
        "json" => Ok(FileKind::Json),
        _ => Err(MappingError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

fn read_delimited(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    let decoded = io_utils::read_decoded(path, options.encoding)?;
    let delimiter = io_utils::resolve_delimiter(path, options.delimiter, &decoded);
    let mut reader = io_utils::open_csv_reader(decoded.as_bytes(), delimiter);
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Reading header row of {path:?}"))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let record = record.with_context(|| format!("Reading record {} of {path:?}", index + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(
        "Ingested {} column(s) and {} row(s) from {path:?} (delimiter {:?})",
        headers.len(),
        rows.len(),
        delimiter as char
    );
    Ok(Dataset { headers, rows })
}

/// JSON ingestion accepts an array of flat objects. Headers are the union of
/// object keys in first-appearance file order; `serde_json`'s
/// `preserve_order` feature keeps each object's keys as written, so JSON
/// columns line up the way a delimited header would. Missing keys become
/// empty cells and non-string scalars keep their JSON rendering.
fn read_json(path: &Path, options: &IngestOptions) -> Result<Dataset> {
    let decoded = io_utils::read_decoded(path, options.encoding)?;
    let value: Value =
        serde_json::from_str(&decoded).with_context(|| format!("Parsing JSON input {path:?}"))?;
    let Value::Array(items) = value else {
        bail!("JSON input {path:?} must be an array of objects");
    };
    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if options.limit.is_some_and(|limit| objects.len() >= limit) {
            break;
        }
        let Value::Object(map) = item else {
            bail!("JSON input {path:?}: element {index} is not an object");
        };
        for key in map.keys() {
            if !headers.iter().any(|header| header == key) {
                headers.push(key.clone());
            }
        }
        objects.push(map);
    }
    let rows = objects
        .into_iter()
        .map(|map| {
            headers
                .iter()
                .map(|key| map.get(key).map(render_json_value).unwrap_or_default())
                .collect()
        })
        .collect();
    debug!(
        "Ingested {} column(s) from JSON input {path:?}",
        headers.len()
    );
    Ok(Dataset { headers, rows })
}

fn render_json_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
