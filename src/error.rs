//! Domain errors surfaced by the mapping pipeline.
//!
//! Recoverable pipeline failures are expressed here as typed variants so
//! callers can branch on them; the CLI layer wraps them in `anyhow` for
//! display. Conditions the pipeline treats as data rather than failure
//! (for example a source file whose header matches nothing) never pass
//! through this enum.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    /// The input file extension is not one the ingest layer can parse.
    /// Spreadsheet workbooks (`.xls`, `.xlsx`) land here: convert them to
    /// CSV before mapping.
    #[error("unsupported input format '.{extension}' for {path:?}; expected csv, txt, tsv, or json")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// No target columns were supplied via schema file, config, or
    /// environment. Matching against an empty target set is always a
    /// configuration bug, unlike an empty *source* set which is valid data.
    #[error("target schema is empty; supply at least one target column")]
    EmptyTargetSchema,

    #[error("duplicate target column '{0}' in target schema")]
    DuplicateTarget(String),

    /// A configured name is blank or reduces to an empty SQL identifier.
    #[error("target column name '{0}' is blank or has no identifier characters")]
    InvalidTargetName(String),

    /// Two distinct target names reduce to the same SQL identifier, so the
    /// records table cannot hold both.
    #[error("target columns '{first}' and '{second}' both map to column identifier '{identifier}'")]
    IdentifierCollision {
        first: String,
        second: String,
        identifier: String,
    },

    /// A target name collides with the provenance column appended to every
    /// record.
    #[error("target column '{target}' collides with the provenance column '{provenance}'")]
    ProvenanceCollision { target: String, provenance: String },

    #[error("match threshold {0} is out of range; expected 0..=100")]
    ThresholdOutOfRange(u16),

    /// The matcher reported a source column that is absent from the dataset
    /// header. Indicates the match outcome and the dataset went out of sync.
    #[error("matched source column '{0}' is missing from the dataset header")]
    UnknownSourceColumn(String),

    /// An existing database table does not line up with the configured
    /// schema, so writing to it would scramble columns.
    #[error("table '{table}' does not match the configured schema: {detail}")]
    TableMismatch { table: String, detail: String },
}
