//! # The Patent Discovery Command Line Utility
//!
//! Fetches patents from PatentsView, stores them in PostgreSQL and analyses the citation
//! network between them.
//!
//! ## Configuration
//! Before using the tool, configure it with your PatentsView api key:
//! ```bash
//! patents config update --api-key YOUR_API_KEY
//! ```
//!
//! ## Usage Examples
//!
//! ### Starting the database
//! ```bash
//! patents db start
//! patents schema init
//! ```
//!
//! ### Ingesting patents
//! ```bash
//! patents ingest idea "A rechargeable battery pack with solar charging cells"
//! patents ingest assignee "Example Corp" --since 2020 --max-results 50
//! patents ingest ipc H01M --year 2021 --dry-run
//! ```
//!
//! ### Exploring
//! ```bash
//! patents search battery
//! patents show 10000001
//! patents graph rank --limit 20
//! patents graph path 10000003 10000001
//! ```
use std::env;
use std::fs::File;
use std::process::exit;

use clap::Parser;
use cli::{Command, LogLevel, Opts, SchemaCommand};
use commands::{configuration, db, graph, ingest, patents};
use discovery::error::DiscoveryError;
use discovery::{config, ApplicationRuntime, ApplicationRuntimeBuilder, Operation};
use env_logger::Env;
use log::debug;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<(), DiscoveryError> {
    let opts: Opts = Opts::parse();

    configure_logging(&opts); // Handles the -v option

    match opts.cmd {
        Command::Ingest(ingest_cmd) => {
            ingest::execute(&get_runtime(opts.in_memory).await, ingest_cmd).await?;
        }
        Command::Search(search) => {
            patents::search(&get_runtime(opts.in_memory).await, search.term).await?;
        }
        Command::Show(show) => {
            patents::show(&get_runtime(opts.in_memory).await, show.patent_number).await?;
        }
        Command::Stats => patents::stats(&get_runtime(opts.in_memory).await).await?,
        Command::Keywords(keywords) => {
            patents::keywords(
                &get_runtime(opts.in_memory).await,
                keywords.idea,
                keywords.max,
            )
            .await?;
        }
        Command::Graph(graph_cmd) => {
            graph::execute(&get_runtime(opts.in_memory).await, graph_cmd.cmd).await?;
        }
        Command::Schema(schema) => match schema.cmd {
            SchemaCommand::Init => {
                get_runtime(opts.in_memory)
                    .await
                    .execute(Operation::InitSchema)
                    .await?;
                println!("Database schema is in place");
            }
        },
        Command::Db(db_cmd) => db::execute(&db_cmd.cmd, &config::load()?)?,
        Command::Config(config_cmd) => configuration::execute(config_cmd.cmd)?,
    }

    Ok(())
}

/// Builds the runtime, or explains what is wrong and exits
async fn get_runtime(in_memory: bool) -> ApplicationRuntime {
    let mut builder = ApplicationRuntimeBuilder::new();
    if in_memory {
        builder = builder.use_in_memory_db();
    }
    match builder.build().await {
        Ok(runtime) => runtime,
        Err(err) => {
            match err {
                DiscoveryError::TomlParse { .. } | DiscoveryError::InvalidEnvironment { .. } => {
                    eprintln!("Configuration error: '{err}'. Use 'patents config list' to inspect it");
                }
                DiscoveryError::Connection(_) | DiscoveryError::Sql(_) => {
                    eprintln!(
                        "Unable to reach the database: '{err}'. Use 'patents db start' or --in-memory"
                    );
                }
                _ => {
                    eprintln!("Failed to create runtime: '{err}'");
                }
            }

            exit(1);
        }
    }
}

fn configure_logging(opts: &Opts) {
    let mut tmp_dir = env::temp_dir();
    tmp_dir.push("patents.log");

    if opts.verbosity.is_some() {
        println!("Logging to {}", &tmp_dir.to_string_lossy());
    }

    // If nothing else was specified in RUST_LOG, use 'warn'
    let level = opts.verbosity.unwrap_or(LogLevel::Warn).to_string();
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    // Falls back to stderr when the log file cannot be created
    if let Ok(file) = File::create(&tmp_dir) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    debug!("Logging started");
}
