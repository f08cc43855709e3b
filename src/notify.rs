//! Mapping-report notification.
//!
//! The pipeline talks to the [`Notifier`] trait so the delivery transport
//! stays swappable and testable. The built-in implementation renders the
//! report as a small HTML document and drops it into an outbox directory
//! for an external relay to deliver. The pipeline logs notification
//! failures and carries on; persistence never depends on delivery.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::report::{MatchStatus, ReportRow};

pub trait Notifier {
    /// Deliver the report for one mapping run of `source_file`.
    fn notify(&self, report: &[ReportRow], source_file: &str) -> Result<()>;
}

/// Writes rendered reports into a directory an external relay watches.
pub struct OutboxNotifier {
    outbox: PathBuf,
    recipient: Option<String>,
    run_id: Uuid,
}

impl OutboxNotifier {
    pub fn new(outbox: PathBuf, recipient: Option<String>, run_id: Uuid) -> Self {
        Self {
            outbox,
            recipient,
            run_id,
        }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, report: &[ReportRow], source_file: &str) -> Result<()> {
        fs::create_dir_all(&self.outbox)
            .with_context(|| format!("Creating outbox directory {:?}", self.outbox))?;
        let html = render_html(report, source_file, self.recipient.as_deref());
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let name = format!("mapping-report-{stamp}-{}.html", self.run_id.simple());
        let path = self.outbox.join(name);
        fs::write(&path, html).with_context(|| format!("Writing notification {path:?}"))?;
        info!("Notification written to {path:?}");
        Ok(())
    }
}

/// Render the report as the HTML body a relay would send: one table of
/// matched columns, one of columns without a suitable source.
pub fn render_html(report: &[ReportRow], source_file: &str, recipient: Option<&str>) -> String {
    let matched: Vec<&ReportRow> = report
        .iter()
        .filter(|row| row.status == MatchStatus::Matched)
        .collect();
    let unmatched: Vec<&ReportRow> = report
        .iter()
        .filter(|row| row.status == MatchStatus::NotMatched)
        .collect();

    let mut html = String::new();
    html.push_str("<html><body>\n");
    if let Some(recipient) = recipient {
        html.push_str(&format!("<p>To: {}</p>\n", escape(recipient)));
    }
    html.push_str("<p>Results of the column mapping analysis.</p>\n");
    html.push_str(&format!(
        "<p><b>Source file:</b> {}</p>\n",
        escape(source_file)
    ));
    html.push_str(&format!(
        "<p><b>Matched columns ({}):</b></p>\n",
        matched.len()
    ));
    push_table(&mut html, &matched);
    html.push_str(&format!(
        "<p><b>Columns with no suitable source ({}):</b></p>\n",
        unmatched.len()
    ));
    push_table(&mut html, &unmatched);
    html.push_str("</body></html>\n");
    html
}

fn push_table(html: &mut String, rows: &[&ReportRow]) {
    if rows.is_empty() {
        html.push_str("<p>None.</p>\n");
        return;
    }
    html.push_str(
        "<table border=\"1\">\n<tr><th>Target column</th><th>Best source</th><th>Score</th></tr>\n",
    );
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&row.target_column),
            escape(row.best_source.as_deref().unwrap_or("-")),
            row.score
        ));
    }
    html.push_str("</table>\n");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample_report() -> Vec<ReportRow> {
        vec![
            ReportRow {
                target_column: "first_name".to_string(),
                best_source: Some("fname".to_string()),
                score: 70,
                status: MatchStatus::Matched,
            },
            ReportRow {
                target_column: "ssn".to_string(),
                best_source: Some("department".to_string()),
                score: 29,
                status: MatchStatus::NotMatched,
            },
        ]
    }

    #[test]
    fn renders_both_sections_and_the_file_name() {
        let html = render_html(&sample_report(), "people.csv", Some("data-team@example.com"));
        assert!(html.contains("people.csv"));
        assert!(html.contains("data-team@example.com"));
        assert!(html.contains("Matched columns (1)"));
        assert!(html.contains("no suitable source (1)"));
        assert!(html.contains("<td>first_name</td><td>fname</td><td>70</td>"));
        assert!(html.contains("<td>ssn</td><td>department</td><td>29</td>"));
    }

    #[test]
    fn renders_placeholder_for_empty_sections() {
        let html = render_html(&[], "empty.csv", None);
        assert!(html.contains("Matched columns (0)"));
        assert!(html.contains("None."));
        assert!(!html.contains("To:"));
    }

    #[test]
    fn escapes_markup_in_names() {
        let report = vec![ReportRow {
            target_column: "<script>".to_string(),
            best_source: Some("a&b".to_string()),
            score: 50,
            status: MatchStatus::Matched,
        }];
        let html = render_html(&report, "x.csv", None);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn outbox_notifier_writes_one_html_file() {
        let dir = tempdir().unwrap();
        let notifier = OutboxNotifier::new(
            dir.path().to_path_buf(),
            Some("data-team@example.com".to_string()),
            Uuid::new_v4(),
        );
        notifier.notify(&sample_report(), "people.csv").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].extension().unwrap(), "html");
        let contents = std::fs::read_to_string(&entries[0]).unwrap();
        assert!(contents.contains("people.csv"));
    }
}
