//! Run configuration: target schema, match threshold, store layout, and
//! notification settings.
//!
//! Configuration is resolved exactly once at process entry and passed down
//! by reference; no module below this one reads environment state. The
//! precedence order is CLI flags, then the optional YAML config file, then
//! `TABLEMAP_*` environment variables, then built-in defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{error::MappingError, matcher, store};

pub const ENV_TARGET_COLUMNS: &str = "TABLEMAP_TARGET_COLUMNS";
pub const ENV_THRESHOLD: &str = "TABLEMAP_THRESHOLD";
pub const ENV_DATABASE: &str = "TABLEMAP_DB";
pub const ENV_OUTBOX: &str = "TABLEMAP_OUTBOX";
pub const ENV_RECIPIENT: &str = "TABLEMAP_RECIPIENT";

pub const DEFAULT_DATABASE: &str = "tablemap.db";
pub const DEFAULT_REPORT_TABLE: &str = "mapping_report";
pub const DEFAULT_RECORDS_TABLE: &str = "mapped_records";
pub const DEFAULT_PROVENANCE_COLUMN: &str = "source_file";

/// Target schema file: the ordered list of output columns, optionally with
/// a per-schema threshold override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSchema {
    pub target_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
}

impl TargetSchema {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading target schema {path:?}"))?;
        let schema: TargetSchema = serde_yaml::from_str(&text)
            .with_context(|| format!("Parsing target schema {path:?}"))?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self).context("Serializing target schema")?;
        fs::write(path, text).with_context(|| format!("Writing target schema {path:?}"))
    }
}

/// Optional YAML config file. Every field falls back to an environment
/// variable or a built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    target_columns: Option<Vec<String>>,
    threshold: Option<u8>,
    database: Option<PathBuf>,
    report_table: Option<String>,
    records_table: Option<String>,
    provenance_column: Option<String>,
    notification: Option<NotificationFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct NotificationFile {
    outbox: PathBuf,
    recipient: Option<String>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Reading config file {path:?}"))?;
        let file: ConfigFile = serde_yaml::from_str(&text)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(file)
    }
}

/// CLI-level settings that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub schema_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub threshold: Option<u8>,
    pub database: Option<PathBuf>,
    pub outbox: Option<PathBuf>,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// Ordered output schema; order is invariant for a deployment.
    pub target_columns: Vec<String>,
    pub threshold: u8,
    pub database: PathBuf,
    pub report_table: String,
    pub records_table: String,
    pub provenance_column: String,
    pub notification: Option<NotificationConfig>,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub outbox: PathBuf,
    pub recipient: Option<String>,
}

impl MappingConfig {
    /// Defaults around a target list; used where no file or environment
    /// input is in play.
    pub fn with_defaults(target_columns: Vec<String>) -> Self {
        Self {
            target_columns,
            threshold: matcher::DEFAULT_THRESHOLD,
            database: PathBuf::from(DEFAULT_DATABASE),
            report_table: DEFAULT_REPORT_TABLE.to_string(),
            records_table: DEFAULT_RECORDS_TABLE.to_string(),
            provenance_column: DEFAULT_PROVENANCE_COLUMN.to_string(),
            notification: None,
        }
    }

    /// Resolve and validate the full configuration for one invocation.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let schema = match &overrides.schema_path {
            Some(path) => Some(TargetSchema::load(path)?),
            None => None,
        };

        let target_columns = schema
            .as_ref()
            .map(|schema| schema.target_columns.clone())
            .or_else(|| file.target_columns.clone())
            .or_else(|| env_var(ENV_TARGET_COLUMNS).map(|raw| split_column_list(&raw)))
            .ok_or(MappingError::EmptyTargetSchema)?;

        let threshold = match overrides
            .threshold
            .or(schema.as_ref().and_then(|schema| schema.threshold))
            .or(file.threshold)
        {
            Some(value) => value,
            None => match env_var(ENV_THRESHOLD) {
                Some(raw) => parse_threshold(&raw)?,
                None => matcher::DEFAULT_THRESHOLD,
            },
        };

        let database = overrides
            .database
            .clone()
            .or(file.database)
            .or_else(|| env_var(ENV_DATABASE).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let recipient = file
            .notification
            .as_ref()
            .and_then(|n| n.recipient.clone())
            .or_else(|| env_var(ENV_RECIPIENT));
        let outbox = overrides
            .outbox
            .clone()
            .or_else(|| file.notification.as_ref().map(|n| n.outbox.clone()))
            .or_else(|| env_var(ENV_OUTBOX).map(PathBuf::from));

        let config = Self {
            target_columns,
            threshold,
            database,
            report_table: file
                .report_table
                .unwrap_or_else(|| DEFAULT_REPORT_TABLE.to_string()),
            records_table: file
                .records_table
                .unwrap_or_else(|| DEFAULT_RECORDS_TABLE.to_string()),
            provenance_column: file
                .provenance_column
                .unwrap_or_else(|| DEFAULT_PROVENANCE_COLUMN.to_string()),
            notification: outbox.map(|outbox| NotificationConfig { outbox, recipient }),
        };
        config.validate()?;
        debug!(
            "Resolved configuration: {} target column(s), threshold {}, database {:?}",
            config.target_columns.len(),
            config.threshold,
            config.database
        );
        Ok(config)
    }

    /// Reject configurations the store or matcher could not honor.
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.target_columns.is_empty() {
            return Err(MappingError::EmptyTargetSchema);
        }
        if self.threshold > 100 {
            return Err(MappingError::ThresholdOutOfRange(u16::from(self.threshold)));
        }
        if let Some(duplicate) = self.target_columns.iter().duplicates().next() {
            return Err(MappingError::DuplicateTarget(duplicate.clone()));
        }

        let provenance_id = store::sql_identifier(&self.provenance_column);
        if provenance_id.is_empty() {
            return Err(MappingError::InvalidTargetName(
                self.provenance_column.clone(),
            ));
        }
        let mut seen: Vec<(String, &String)> = Vec::with_capacity(self.target_columns.len());
        for target in &self.target_columns {
            let identifier = store::sql_identifier(target);
            if identifier.is_empty() {
                return Err(MappingError::InvalidTargetName(target.clone()));
            }
            if identifier == provenance_id {
                return Err(MappingError::ProvenanceCollision {
                    target: target.clone(),
                    provenance: self.provenance_column.clone(),
                });
            }
            if let Some((_, first)) = seen.iter().find(|(id, _)| *id == identifier) {
                return Err(MappingError::IdentifierCollision {
                    first: (*first).clone(),
                    second: target.clone(),
                    identifier,
                });
            }
            seen.push((identifier, target));
        }
        Ok(())
    }
}

fn split_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_threshold(raw: &str) -> Result<u8> {
    let value: u16 = raw
        .trim()
        .parse()
        .with_context(|| format!("Parsing {ENV_THRESHOLD} value '{raw}'"))?;
    if value > 100 {
        return Err(MappingError::ThresholdOutOfRange(value).into());
    }
    Ok(value as u8)
}

fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn target_schema_round_trips_through_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.yml");
        let schema = TargetSchema {
            target_columns: names(&["first_name", "last_name"]),
            threshold: Some(80),
        };
        schema.save(&path).unwrap();
        let loaded = TargetSchema::load(&path).unwrap();
        assert_eq!(loaded.target_columns, schema.target_columns);
        assert_eq!(loaded.threshold, Some(80));
    }

    #[test]
    fn config_file_feeds_resolution() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tablemap.yml");
        fs::write(
            &path,
            "target_columns:\n- first_name\n- email\nthreshold: 85\ndatabase: runs.db\nnotification:\n  outbox: outbox\n  recipient: data-team@example.com\n",
        )
        .unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(path),
            ..ConfigOverrides::default()
        };
        let config = MappingConfig::resolve(&overrides).unwrap();
        assert_eq!(config.target_columns, names(&["first_name", "email"]));
        assert_eq!(config.threshold, 85);
        assert_eq!(config.database, PathBuf::from("runs.db"));
        let notification = config.notification.unwrap();
        assert_eq!(notification.outbox, PathBuf::from("outbox"));
        assert_eq!(
            notification.recipient.as_deref(),
            Some("data-team@example.com")
        );
    }

    #[test]
    fn cli_threshold_beats_schema_and_file() {
        let dir = tempdir().unwrap();
        let schema_path = dir.path().join("schema.yml");
        TargetSchema {
            target_columns: names(&["first_name"]),
            threshold: Some(90),
        }
        .save(&schema_path)
        .unwrap();
        let overrides = ConfigOverrides {
            schema_path: Some(schema_path),
            threshold: Some(55),
            ..ConfigOverrides::default()
        };
        let config = MappingConfig::resolve(&overrides).unwrap();
        assert_eq!(config.threshold, 55);
    }

    #[test]
    fn validation_rejects_duplicates_and_collisions() {
        let mut config = MappingConfig::with_defaults(names(&["email", "email"]));
        assert!(matches!(
            config.validate(),
            Err(MappingError::DuplicateTarget(name)) if name == "email"
        ));

        config.target_columns = names(&["First Name", "first_name"]);
        assert!(matches!(
            config.validate(),
            Err(MappingError::IdentifierCollision { identifier, .. }) if identifier == "first_name"
        ));

        config.target_columns = names(&["source_file"]);
        assert!(matches!(
            config.validate(),
            Err(MappingError::ProvenanceCollision { .. })
        ));

        config.target_columns = names(&["---"]);
        assert!(matches!(
            config.validate(),
            Err(MappingError::InvalidTargetName(_))
        ));
    }

    #[test]
    fn validation_rejects_out_of_range_threshold() {
        let mut config = MappingConfig::with_defaults(names(&["first_name"]));
        config.threshold = 101;
        assert!(matches!(
            config.validate(),
            Err(MappingError::ThresholdOutOfRange(101))
        ));
    }

    #[test]
    fn empty_targets_are_a_configuration_error() {
        let config = MappingConfig::with_defaults(Vec::new());
        assert!(matches!(
            config.validate(),
            Err(MappingError::EmptyTargetSchema)
        ));
    }

    #[test]
    fn column_list_splitting_trims_and_drops_blanks() {
        assert_eq!(
            split_column_list(" first_name , last_name ,, email "),
            names(&["first_name", "last_name", "email"])
        );
    }

    #[test]
    fn threshold_parsing_enforces_range() {
        assert_eq!(parse_threshold("70").unwrap(), 70);
        assert_eq!(parse_threshold(" 100 ").unwrap(), 100);
        assert!(parse_threshold("101").is_err());
        assert!(parse_threshold("abc").is_err());
    }
}
