pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod io_utils;
pub mod matcher;
pub mod notify;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod similarity;
pub mod store;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Result, bail};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InitArgs},
    config::TargetSchema,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tablemap", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Map(args) => pipeline::execute(&args),
        Commands::Plan(args) => pipeline::plan(&args),
        Commands::Init(args) => handle_init(&args),
    }
}

fn handle_init(args: &InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!("{:?} already exists; pass --force to overwrite", args.output);
    }
    let options =
        pipeline::ingest_options(args.delimiter, args.input_encoding.as_deref(), None)?;
    let dataset = ingest::read_dataset(&args.input, &options)?;
    if dataset.headers.is_empty() {
        bail!("{:?} exposes no columns to scaffold from", args.input);
    }
    let schema = TargetSchema {
        target_columns: dataset.headers.clone(),
        threshold: None,
    };
    schema.save(&args.output)?;
    info!(
        "Wrote target schema with {} column(s) to {:?}",
        schema.target_columns.len(),
        args.output
    );
    Ok(())
}
