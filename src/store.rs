//! SQLite persistence for mapping runs.
//!
//! Two tables are written per run. The report table is a snapshot of the
//! latest run: it is truncated and rewritten every time. The records table
//! is cumulative: projected rows append across runs and files, with the
//! provenance column telling them apart. Table layouts are derived from the
//! configured target schema and verified against what already exists before
//! any write.

use std::path::Path;

use anyhow::{Context, Result};
use heck::ToSnakeCase;
use itertools::Itertools;
use log::debug;
use rusqlite::{Connection, ToSql, params};

use crate::{
    config::MappingConfig, error::MappingError, project::MappedRecord, report::ReportRow,
};

/// Fixed layout of the report table.
const REPORT_COLUMNS: [&str; 4] = ["target_column", "best_source", "score", "status"];

/// Reduce a configured column name to the SQL identifier used in the
/// records table. Identifiers are always double-quoted in generated SQL, so
/// keywords and digits survive.
pub fn sql_identifier(name: &str) -> String {
    name.to_snake_case()
}

/// Column identifiers of the records table: one per target, in schema
/// order, plus the provenance column last.
pub fn record_columns(config: &MappingConfig) -> Vec<String> {
    let mut columns: Vec<String> = config
        .target_columns
        .iter()
        .map(|name| sql_identifier(name))
        .collect();
    columns.push(sql_identifier(&config.provenance_column));
    columns
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("Opening database {path:?}"))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory database")?;
        Ok(Self { conn })
    }

    /// Create missing tables and verify existing ones against the
    /// configured schema before any write touches them.
    pub fn ensure_tables(&self, config: &MappingConfig) -> Result<()> {
        self.ensure_report_table(config)?;
        self.ensure_records_table(config)
    }

    /// Replace the report table contents: delete every row, then insert the
    /// new ones statement by statement.
    ///
    /// The delete and the inserts are deliberately not wrapped in a single
    /// transaction, so a crash mid-write can leave a partial report. The
    /// table is a per-run snapshot that the next successful run rewrites in
    /// full, which is the accepted recovery path.
    pub fn replace_report(&self, config: &MappingConfig, rows: &[ReportRow]) -> Result<usize> {
        self.conn
            .execute(&format!("DELETE FROM \"{}\"", config.report_table), [])
            .with_context(|| format!("Truncating report table '{}'", config.report_table))?;
        let sql = format!(
            "INSERT INTO \"{}\" (target_column, best_source, score, status) VALUES (?1, ?2, ?3, ?4)",
            config.report_table
        );
        let mut stmt = self.conn.prepare(&sql).context("Preparing report insert")?;
        for row in rows {
            stmt.execute(params![
                row.target_column,
                row.best_source,
                row.score,
                row.status.as_str()
            ])
            .with_context(|| format!("Inserting report row for '{}'", row.target_column))?;
        }
        debug!(
            "Report table '{}' now holds {} row(s)",
            config.report_table,
            rows.len()
        );
        Ok(rows.len())
    }

    /// Append projected records to the cumulative records table.
    pub fn append_records(
        &self,
        config: &MappingConfig,
        records: &[MappedRecord],
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let columns = record_columns(config);
        let column_list = columns.iter().map(|column| format!("\"{column}\"")).join(", ");
        let placeholders = (1..=columns.len()).map(|index| format!("?{index}")).join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({column_list}) VALUES ({placeholders})",
            config.records_table
        );
        let mut stmt = self.conn.prepare(&sql).context("Preparing record insert")?;
        for record in records {
            let mut values: Vec<Box<dyn ToSql>> = record
                .values
                .iter()
                .map(|value| Box::new(value.clone()) as Box<dyn ToSql>)
                .collect();
            values.push(Box::new(record.source_file.clone()));
            stmt.execute(rusqlite::params_from_iter(values.iter()))
                .with_context(|| {
                    format!("Inserting mapped record from '{}'", record.source_file)
                })?;
        }
        Ok(records.len())
    }

    /// Total rows currently in a table.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("Counting rows in '{table}'"))
    }

    fn ensure_report_table(&self, config: &MappingConfig) -> Result<()> {
        if !self.table_exists(&config.report_table)? {
            let sql = format!(
                "CREATE TABLE \"{}\" (target_column TEXT NOT NULL, best_source TEXT, \
                 score INTEGER NOT NULL, status TEXT NOT NULL)",
                config.report_table
            );
            self.conn.execute(&sql, []).with_context(|| {
                format!("Creating report table '{}'", config.report_table)
            })?;
            debug!("Created report table '{}'", config.report_table);
        }
        let expected: Vec<String> = REPORT_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        self.verify_table(&config.report_table, &expected)
    }

    fn ensure_records_table(&self, config: &MappingConfig) -> Result<()> {
        let columns = record_columns(config);
        if !self.table_exists(&config.records_table)? {
            let mut definitions: Vec<String> = columns[..columns.len() - 1]
                .iter()
                .map(|column| format!("\"{column}\" TEXT"))
                .collect();
            definitions.push(format!("\"{}\" TEXT NOT NULL", columns[columns.len() - 1]));
            let sql = format!(
                "CREATE TABLE \"{}\" ({})",
                config.records_table,
                definitions.join(", ")
            );
            self.conn.execute(&sql, []).with_context(|| {
                format!("Creating records table '{}'", config.records_table)
            })?;
            debug!(
                "Created records table '{}' with {} column(s)",
                config.records_table,
                columns.len()
            );
        }
        self.verify_table(&config.records_table, &columns)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .with_context(|| format!("Checking for table '{table}'"))?;
        Ok(count > 0)
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{table}\")"))
            .with_context(|| format!("Inspecting table '{table}'"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .with_context(|| format!("Reading column info for '{table}'"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Reading column info for '{table}'"))?;
        Ok(columns)
    }

    fn verify_table(&self, table: &str, expected: &[String]) -> Result<()> {
        let actual = self.table_columns(table)?;
        if actual != expected {
            return Err(MappingError::TableMismatch {
                table: table.to_string(),
                detail: format!(
                    "found columns [{}], expected [{}]",
                    actual.iter().join(", "),
                    expected.iter().join(", ")
                ),
            }
            .into());
        }
        Ok(())
    }
}
