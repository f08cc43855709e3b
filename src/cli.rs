use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Map tabular files of unknown schema onto a fixed target schema",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match a file against the target schema, land the rows, and notify
    Map(MapArgs),
    /// Show the mapping a file would produce without writing anywhere
    Plan(PlanArgs),
    /// Scaffold a target schema YAML file from an input file's header
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Input file to map (csv, txt, tsv, or json)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Target schema YAML file listing the output columns
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Pipeline configuration YAML file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Minimum score for a source column to count as matched
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,
    /// SQLite database receiving the report and the mapped records
    #[arg(long = "db")]
    pub database: Option<PathBuf>,
    /// Directory receiving rendered HTML notifications
    #[arg(long)]
    pub outbox: Option<PathBuf>,
    /// Delimiter character for delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Limit number of data rows ingested
    #[arg(long)]
    pub limit: Option<usize>,
}

impl MapArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            schema_path: self.schema.clone(),
            config_path: self.config.clone(),
            threshold: self.threshold,
            database: self.database.clone(),
            outbox: self.outbox.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Input file to evaluate (csv, txt, tsv, or json)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Target schema YAML file listing the output columns
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Pipeline configuration YAML file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Minimum score for a source column to count as matched
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,
    /// Write the plan as JSON to this path
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Delimiter character for delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl PlanArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            schema_path: self.schema.clone(),
            config_path: self.config.clone(),
            threshold: self.threshold,
            database: None,
            outbox: None,
        }
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Input file whose header seeds the target schema
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination schema YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Overwrite the destination if it already exists
    #[arg(long)]
    pub force: bool,
    /// Delimiter character for delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
