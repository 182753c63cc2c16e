use std::fmt::{self, Formatter};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use discovery::service::ingestion::DEFAULT_MAX_RESULTS;
use patentsview::keywords::DEFAULT_MAX_KEYWORDS;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub(crate) enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
/// Patent discovery - fetch patents from PatentsView, store them in PostgreSQL and explore
/// the citation network.
///
/// Dates are ISO8601 without a time zone, i.e. `2023-06-01`.
///
/// The PatentsView api key is read from the configuration file or from the
/// `PATENTSVIEW_API_KEY` environment variable.
#[command(author, version, about)] // Read from Cargo.toml
pub(crate) struct Opts {
    #[command(subcommand)]
    pub cmd: Command,

    #[arg(global = true, short, long)]
    pub verbosity: Option<LogLevel>,

    /// Keep patents in memory for the duration of the command instead of using PostgreSQL
    #[arg(global = true, long)]
    pub in_memory: bool,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch patents from PatentsView, parse them and store them
    Ingest(Ingest),
    /// List stored patents, newest first
    Search(Search),
    /// Show a stored patent with its claims and citations
    Show(Show),
    /// Database statistics
    Stats,
    /// Show the search keywords extracted from an invention idea
    Keywords(Keywords),
    /// Citation network analysis
    Graph(Graph),
    /// Subcommands for the relational schema
    Schema(Schema),
    /// Manage the database containers with docker compose
    Db(Db),
    /// Subcommands for configuration
    Config(Config),
}

#[derive(Args)]
pub(crate) struct Ingest {
    #[command(subcommand)]
    pub source: IngestCommand,
    /// Maximum number of patents to keep
    #[arg(short, long, global = true, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
    /// Fetch and parse, but leave the database alone
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Clone)]
pub(crate) enum IngestCommand {
    /// Patents whose abstract matches the keywords of an invention idea
    Idea {
        /// Free text description, i.e. "A mobile device with touchscreen for browsing"
        idea: String,
    },
    /// Patents held by a company or organisation
    Assignee {
        name: String,
        /// Only patents granted from the start of this year
        #[arg(short, long)]
        since: Option<i32>,
    },
    /// Patents in an IPC technology area, i.e. H01M
    Ipc {
        code: String,
        /// Only patents granted from the start of this year
        #[arg(short, long)]
        year: i32,
    },
    /// Specific patents
    Numbers {
        #[arg(num_args(1..), required = true)]
        numbers: Vec<String>,
    },
}

#[derive(Args)]
pub(crate) struct Search {
    /// Matched against title and abstract, case insensitive
    pub term: Option<String>,
}

#[derive(Args)]
pub(crate) struct Show {
    pub patent_number: String,
}

#[derive(Args)]
pub(crate) struct Keywords {
    pub idea: String,
    #[arg(short, long, default_value_t = DEFAULT_MAX_KEYWORDS)]
    pub max: usize,
}

#[derive(Args)]
pub(crate) struct Graph {
    #[command(subcommand)]
    pub cmd: GraphCommand,
}

#[derive(Subcommand)]
pub(crate) enum GraphCommand {
    /// The most influential patents by PageRank
    Rank {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Groups of patents that cite each other
    Communities {
        #[arg(short, long, default_value_t = 2)]
        min_size: usize,
    },
    /// The shortest chain of citations between two patents
    Path { from: String, to: String },
    /// Write the citation graph as Cypher statements for Neo4j
    Export {
        /// Defaults to standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub(crate) struct Schema {
    #[command(subcommand)]
    pub cmd: SchemaCommand,
}

#[derive(Subcommand)]
pub(crate) enum SchemaCommand {
    /// Create tables, indexes and triggers. Safe to run more than once
    Init,
}

#[derive(Args)]
pub(crate) struct Db {
    #[command(subcommand)]
    pub cmd: DbCommand,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DbCommand {
    /// Start PostgreSQL and Neo4j in the background
    Start,
    /// Stop the containers
    Stop,
    Restart,
    /// Show the state of the containers
    Status,
    /// Show the container logs
    Logs {
        #[arg(short, long)]
        follow: bool,
        /// Only this service, i.e. postgres
        service: Option<String>,
    },
    /// Dump the PostgreSQL database to a file
    Backup {
        /// Defaults to a time stamped file in the backup directory
        file: Option<PathBuf>,
    },
    /// Load a dump created by `backup`
    Restore { file: PathBuf },
    /// Remove the containers and their volumes, then start afresh. All data is lost
    Reset,
}

#[derive(Args)]
pub(crate) struct Config {
    #[command(subcommand)]
    pub cmd: ConfigCommand,
}

/// Create, modify or list the configuration file.
#[derive(Subcommand, Clone)]
pub(crate) enum ConfigCommand {
    /// Update the configuration file, creating it if need be
    Update(UpdateConfiguration),
    /// write current configuration to standard output
    List,
    /// Remove the current configuration
    Remove,
}

#[derive(Args, Clone, Default)]
pub(crate) struct UpdateConfiguration {
    /// The PatentsView api key, see <https://patentsview.org/apis/keyrequest>
    #[arg(long)]
    pub api_key: Option<String>,
    /// The PatentsView search API, typically <https://search.patentsview.org>
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub db_host: Option<String>,
    #[arg(long)]
    pub db_port: Option<u16>,
    #[arg(long)]
    pub db_name: Option<String>,
    #[arg(long)]
    pub db_user: Option<String>,
    #[arg(long)]
    pub db_password: Option<String>,
    /// Address of the REST server, i.e. 127.0.0.1:5000
    #[arg(long)]
    pub server_address: Option<String>,
    /// Address of the MCP server, i.e. 127.0.0.1:8080
    #[arg(long)]
    pub mcp_address: Option<String>,
    /// The docker compose file describing the database containers
    #[arg(long)]
    pub compose_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Opts::command().debug_assert();
    }

    #[test]
    fn ingest_flags_follow_the_source() {
        let opts = Opts::parse_from([
            "patents",
            "ingest",
            "assignee",
            "Example Corp",
            "--since",
            "2020",
            "--dry-run",
            "-m",
            "5",
        ]);
        let Command::Ingest(ingest) = opts.cmd else {
            panic!("expected ingest");
        };
        assert!(ingest.dry_run);
        assert_eq!(ingest.max_results, 5);
        assert!(matches!(
            ingest.source,
            IngestCommand::Assignee { ref name, since: Some(2020) } if name == "Example Corp"
        ));
    }

    #[test]
    fn db_logs_parse() {
        let opts = Opts::parse_from(["patents", "db", "logs", "-f", "postgres"]);
        let Command::Db(db) = opts.cmd else {
            panic!("expected db");
        };
        assert_eq!(
            db.cmd,
            DbCommand::Logs {
                follow: true,
                service: Some("postgres".into())
            }
        );
    }
}
