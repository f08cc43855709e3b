//! Input plumbing shared by every command: file decoding, delimiter
//! resolution, and CSV reader construction.
//!
//! Source files arrive with unknown encodings and unknown delimiters, so
//! ingestion decodes each file up front via `encoding_rs` and sniffs the
//! delimiter from the header line whenever the extension does not pin one.

use std::{fs, io::Read, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Delimiters the sniffer considers, in tie-break order.
const SNIFF_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Read a file fully and decode it with the given encoding.
pub fn read_decoded(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding input file {path:?}"))
}

/// Pick the delimiter for a delimited input file.
///
/// An explicit delimiter always wins; a `.tsv` extension forces tab;
/// otherwise the header line is sniffed, falling back to comma.
pub fn resolve_delimiter(path: &Path, provided: Option<u8>, sample: &str) -> u8 {
    if let Some(delimiter) = provided {
        return delimiter;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => sniff_delimiter(sample),
    }
}

/// Count candidate delimiters in the first non-empty line and pick the most
/// frequent. Ties resolve to the earlier candidate; a line containing none
/// of them falls back to comma. Bytes inside double-quoted cells are not
/// counted, so a quoted header cell cannot out-vote the real delimiter.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let line = sample
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    let mut unquoted = Vec::with_capacity(line.len());
    let mut in_quotes = false;
    for byte in line.bytes() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            _ => unquoted.push(byte),
        }
    }
    let mut best = (DEFAULT_CSV_DELIMITER, 0usize);
    for candidate in SNIFF_CANDIDATES {
        let count = unquoted.iter().filter(|byte| **byte == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// CSV reader over already-decoded text. The first record is always treated
/// as the header row.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}
