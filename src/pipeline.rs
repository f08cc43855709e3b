//! The mapping pipeline: ingest, match, report, persist, notify.
//!
//! `run` is the single path through a full mapping invocation. Persistence
//! failures abort the run; notification failures are logged and swallowed,
//! so a broken relay never costs the landed data. The report is assembled
//! once and shared by the database sink and the notifier.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    cli::{MapArgs, PlanArgs},
    config::MappingConfig,
    ingest::{self, IngestOptions},
    io_utils, matcher,
    notify::{Notifier, OutboxNotifier},
    project, report,
    store::Database,
    table,
};

/// Counters describing one completed mapping run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source_file: String,
    pub matched: usize,
    pub unmatched: usize,
    pub rows_landed: usize,
}

/// Entry point for `map`: resolve configuration, run the pipeline, report
/// the outcome.
pub fn execute(args: &MapArgs) -> Result<()> {
    let config = MappingConfig::resolve(&args.overrides())?;
    let options = ingest_options(args.delimiter, args.input_encoding.as_deref(), args.limit)?;
    let run_id = Uuid::new_v4();
    let notifier = config.notification.as_ref().map(|settings| {
        OutboxNotifier::new(settings.outbox.clone(), settings.recipient.clone(), run_id)
    });
    let summary = run(
        &config,
        &args.input,
        &options,
        run_id,
        notifier.as_ref().map(|n| n as &dyn Notifier),
    )?;
    info!(
        "Mapping run {} completed: {} matched, {} unmatched, {} row(s) landed",
        summary.run_id, summary.matched, summary.unmatched, summary.rows_landed
    );
    Ok(())
}

/// Run the full pipeline against one input file.
pub fn run(
    config: &MappingConfig,
    input: &Path,
    options: &IngestOptions,
    run_id: Uuid,
    notifier: Option<&dyn Notifier>,
) -> Result<RunSummary> {
    let source_file = file_identifier(input);
    info!(
        "Mapping {source_file} against {} target column(s)",
        config.target_columns.len()
    );
    let dataset = ingest::read_dataset(input, options)?;
    if dataset.headers.is_empty() {
        warn!("{source_file} exposes no columns; every target will be unmatched");
    }

    let outcome =
        matcher::match_columns(&config.target_columns, &dataset.headers, config.threshold);
    for candidate in &outcome.matched {
        info!(
            "Matched target '{}' to source '{}' (score {})",
            candidate.target,
            candidate.best_source.as_deref().unwrap_or("-"),
            candidate.score
        );
    }
    for candidate in &outcome.unmatched {
        debug!(
            "No source for target '{}' (best score {})",
            candidate.target, candidate.score
        );
    }
    info!(
        "{} of {} target column(s) matched at threshold {}",
        outcome.matched.len(),
        outcome.total(),
        config.threshold
    );

    let rows = report::assemble(&outcome);
    let records =
        project::project(&dataset, &outcome.matched, &config.target_columns, &source_file)?;

    let db = Database::open(&config.database)?;
    db.ensure_tables(config)?;
    db.replace_report(config, &rows)?;
    let landed = db.append_records(config, &records)?;
    let total = db.count_rows(&config.records_table)?;
    info!(
        "Landed {landed} row(s) into '{}' ({total} total); report table '{}' refreshed",
        config.records_table, config.report_table
    );

    match notifier {
        Some(notifier) => {
            if let Err(err) = notifier.notify(&rows, &source_file) {
                warn!("Notification failed (continuing): {err:#}");
            }
        }
        None => debug!("Notification disabled; no outbox configured"),
    }

    Ok(RunSummary {
        run_id,
        source_file,
        matched: outcome.matched.len(),
        unmatched: outcome.unmatched.len(),
        rows_landed: landed,
    })
}

/// Entry point for `plan`: show the mapping a file would produce without
/// touching the database or the outbox.
pub fn plan(args: &PlanArgs) -> Result<()> {
    let config = MappingConfig::resolve(&args.overrides())?;
    let options = ingest_options(args.delimiter, args.input_encoding.as_deref(), None)?;
    let dataset = ingest::read_dataset(&args.input, &options)?;
    let outcome =
        matcher::match_columns(&config.target_columns, &dataset.headers, config.threshold);
    let rows = report::assemble(&outcome);

    let headers: Vec<String> = report::TABLE_HEADERS
        .iter()
        .map(|h| (*h).to_string())
        .collect();
    table::print_table(&headers, &report::tabulate(&rows));
    println!();
    println!(
        "{} of {} target column(s) matched at threshold {}",
        outcome.matched.len(),
        outcome.total(),
        config.threshold
    );

    if let Some(path) = &args.export {
        let source_file = file_identifier(&args.input);
        let export = report::PlanExport {
            source_file: &source_file,
            threshold: config.threshold,
            generated_at: Utc::now().to_rfc3339(),
            rows: &rows,
        };
        let json = serde_json::to_string_pretty(&export).context("Serializing plan export")?;
        fs::write(path, json).with_context(|| format!("Writing plan export {path:?}"))?;
        info!("Plan exported to {path:?}");
    }
    Ok(())
}

pub fn ingest_options(
    delimiter: Option<u8>,
    encoding: Option<&str>,
    limit: Option<usize>,
) -> Result<IngestOptions> {
    Ok(IngestOptions {
        delimiter,
        encoding: io_utils::resolve_encoding(encoding)?,
        limit,
    })
}

/// Provenance identifier for a source path: its file name, or the whole
/// path when there is none.
pub fn file_identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use tempfile::tempdir;

    use super::*;
    use crate::report::ReportRow;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _report: &[ReportRow], _source_file: &str) -> Result<()> {
            Err(anyhow!("relay unreachable"))
        }
    }

    fn test_config(database: std::path::PathBuf) -> MappingConfig {
        let mut config = MappingConfig::with_defaults(vec![
            "first_name".to_string(),
            "last_name".to_string(),
            "ssn".to_string(),
        ]);
        config.database = database;
        config
    }

    #[test]
    fn notification_failure_does_not_abort_persistence() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        fs::write(&input, "fname,lname,dept\nAda,Lovelace,Research\nEdsger,Dijkstra,EWD\n")
            .unwrap();
        let config = test_config(dir.path().join("runs.db"));

        let summary = run(
            &config,
            &input,
            &IngestOptions::default(),
            Uuid::new_v4(),
            Some(&FailingNotifier),
        )
        .unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.rows_landed, 2);
        assert_eq!(summary.source_file, "people.csv");

        let db = Database::open(&config.database).unwrap();
        assert_eq!(db.count_rows(&config.report_table).unwrap(), 3);
        assert_eq!(db.count_rows(&config.records_table).unwrap(), 2);
    }

    #[test]
    fn empty_input_maps_to_all_unmatched_without_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.csv");
        fs::write(&input, "").unwrap();
        let config = test_config(dir.path().join("runs.db"));

        let summary = run(&config, &input, &IngestOptions::default(), Uuid::new_v4(), None)
            .unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.unmatched, 3);
        assert_eq!(summary.rows_landed, 0);

        let db = Database::open(&config.database).unwrap();
        assert_eq!(db.count_rows(&config.report_table).unwrap(), 3);
        assert_eq!(db.count_rows(&config.records_table).unwrap(), 0);
    }

    #[test]
    fn reruns_refresh_the_report_and_accumulate_records() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        fs::write(&input, "fname,lname\nAda,Lovelace\n").unwrap();
        let config = test_config(dir.path().join("runs.db"));

        run(&config, &input, &IngestOptions::default(), Uuid::new_v4(), None).unwrap();
        run(&config, &input, &IngestOptions::default(), Uuid::new_v4(), None).unwrap();

        let db = Database::open(&config.database).unwrap();
        assert_eq!(db.count_rows(&config.report_table).unwrap(), 3);
        assert_eq!(db.count_rows(&config.records_table).unwrap(), 2);
    }
}
