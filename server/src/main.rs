//! # Patent discovery REST server
//!
//! Serves the stored patents, the database statistics and the citation graph analyses as JSON.
//!
//! ```bash
//! patent-server --in-memory --address 127.0.0.1:5000
//! ```
use std::sync::Arc;

use clap::Parser;
use discovery::error::DiscoveryError;
use discovery::ApplicationRuntimeBuilder;
use env_logger::Env;
use log::{error, info};
use tokio::net::TcpListener;

mod api;
mod error;

#[derive(Parser)]
#[command(author, version, about)]
struct Opts {
    /// Keep patents in memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
    /// Address to listen on, i.e. 0.0.0.0:5000. Overrides the configuration file
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), DiscoveryError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let mut builder = ApplicationRuntimeBuilder::new();
    if opts.in_memory {
        builder = builder.use_in_memory_db();
    }
    let runtime = builder.build().await?;

    let address = opts
        .address
        .unwrap_or_else(|| runtime.config().server.address.clone());
    let app = api::router(Arc::new(runtime));

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {e}");
    }
    info!("Shutting down");
}
