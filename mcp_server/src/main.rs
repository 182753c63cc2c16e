//! # Patent discovery MCP server
//!
//! Exposes the patent search, ingestion and statistics tools to AI assistants as
//! JSON-RPC 2.0 over TCP.
//!
//! ```bash
//! patent-mcp --in-memory
//! echo '{"jsonrpc":"2.0","id":1,"method":"tools/list"}' | nc 127.0.0.1 8080
//! ```
use std::sync::Arc;

use clap::Parser;
use discovery::error::DiscoveryError;
use discovery::ApplicationRuntimeBuilder;
use env_logger::Env;
use handler::McpHandler;
use log::{error, info};
use tokio::net::TcpListener;

mod handler;
mod protocol;
mod server;
#[cfg(test)]
mod test_support;
mod tools;

#[derive(Parser)]
#[command(author, version, about)]
struct Opts {
    /// Keep patents in memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
    /// Address to listen on. Overrides the configuration file
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), DiscoveryError> {
    // stdout is left alone, log to stderr
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let opts = Opts::parse();

    let mut builder = ApplicationRuntimeBuilder::new();
    if opts.in_memory {
        builder = builder.use_in_memory_db();
    }
    let runtime = builder.build().await?;
    let address = opts
        .address
        .unwrap_or_else(|| runtime.config().mcp.address.clone());

    let listener = TcpListener::bind(&address).await?;
    info!("Serving on {address}");
    server::run(
        listener,
        Arc::new(McpHandler::new(Arc::new(runtime))),
        shutdown_signal(),
    )
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {e}");
    }
    info!("Shutdown signal received, cleaning up");
}
