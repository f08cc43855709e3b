//! Assembly of the per-target match report.
//!
//! The report is the shared artifact of a mapping run: it is produced once
//! from the match outcome and handed to both the database sink and the
//! notifier, never recomputed per sink. Assembly is pure labeling; no
//! scoring happens here.

use std::fmt;

use serde::Serialize;

use crate::matcher::MatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    NotMatched,
}

impl MatchStatus {
    /// Label stored in the report table and shown in rendered output.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Matched => "Matched",
            MatchStatus::NotMatched => "Not Matched",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report record: how a single target column fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub target_column: String,
    pub best_source: Option<String>,
    pub score: u8,
    pub status: MatchStatus,
}

/// Headers for tabular report rendering, aligned with [`tabulate`].
pub const TABLE_HEADERS: [&str; 4] = ["Target column", "Best source", "Score", "Status"];

/// Label the match outcome as report rows.
///
/// Matched targets come first, then unmatched ones, each group preserving
/// the matcher's order.
pub fn assemble(outcome: &MatchOutcome) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(outcome.total());
    for candidate in &outcome.matched {
        rows.push(ReportRow {
            target_column: candidate.target.clone(),
            best_source: candidate.best_source.clone(),
            score: candidate.score,
            status: MatchStatus::Matched,
        });
    }
    for candidate in &outcome.unmatched {
        rows.push(ReportRow {
            target_column: candidate.target.clone(),
            best_source: candidate.best_source.clone(),
            score: candidate.score,
            status: MatchStatus::NotMatched,
        });
    }
    rows
}

/// Render report rows as display cells for the console table.
pub fn tabulate(rows: &[ReportRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.target_column.clone(),
                row.best_source.clone().unwrap_or_else(|| "-".to_string()),
                row.score.to_string(),
                row.status.to_string(),
            ]
        })
        .collect()
}

/// Serializable payload for `plan --export`.
#[derive(Debug, Serialize)]
pub struct PlanExport<'a> {
    pub source_file: &'a str,
    pub threshold: u8,
    pub generated_at: String,
    pub rows: &'a [ReportRow],
}
