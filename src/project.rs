//! Projection of ingested rows onto the target schema.
//!
//! Projection is a pure transformation: it never mutates the dataset and
//! produces fresh records keyed by the target schema. Every record carries
//! one value slot per target, in schema order, plus the provenance
//! identifier of the file it came from. Targets without a matched source
//! project as `None`, which the store writes as SQL `NULL`.

use std::collections::HashMap;

use crate::{error::MappingError, ingest::Dataset, matcher::MatchCandidate};

/// One source row rewritten into target-schema shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRecord {
    /// Cell values in target order; `None` marks a target with no matched
    /// source column.
    pub values: Vec<Option<String>>,
    /// Identifier of the source file this row came from.
    pub source_file: String,
}

/// Rewrite every dataset row into target-schema shape.
///
/// `matched` is consulted per target; a matched source shared by several
/// targets is simply read several times. Fails only when a matched source
/// column is absent from the dataset header, which means the caller mixed a
/// match outcome with the wrong dataset.
pub fn project(
    dataset: &Dataset,
    matched: &[MatchCandidate],
    targets: &[String],
    source_file: &str,
) -> Result<Vec<MappedRecord>, MappingError> {
    // First occurrence wins when a source file repeats a header name.
    let mut header_index: HashMap<&str, usize> = HashMap::new();
    for (index, name) in dataset.headers.iter().enumerate() {
        header_index.entry(name.as_str()).or_insert(index);
    }

    let matched_source: HashMap<&str, &str> = matched
        .iter()
        .filter_map(|candidate| {
            candidate
                .best_source
                .as_deref()
                .map(|source| (candidate.target.as_str(), source))
        })
        .collect();

    let mut slots: Vec<Option<usize>> = Vec::with_capacity(targets.len());
    for target in targets {
        let slot = match matched_source.get(target.as_str()) {
            Some(source) => Some(
                *header_index
                    .get(source)
                    .ok_or_else(|| MappingError::UnknownSourceColumn((*source).to_string()))?,
            ),
            None => None,
        };
        slots.push(slot);
    }

    let records = dataset
        .rows
        .iter()
        .map(|row| MappedRecord {
            values: slots
                .iter()
                .map(|slot| slot.map(|index| row.get(index).cloned().unwrap_or_default()))
                .collect(),
            source_file: source_file.to_string(),
        })
        .collect();
    Ok(records)
}
