use std::sync::Arc;

use config::AppConfiguration;
use error::DiscoveryError;
use log::{debug, info};
use patentsview::keywords::extract_keywords;
use patentsview::PatentsView;
use repository::{MemoryPatentRepository, PatentRepository, PostgresPatentRepository};
use service::graph::{Community, GraphService, RankedPatent};
use service::ingestion::{Ingest, IngestReport, IngestionService, PatentSource};
use service::patent_service::PatentService;
use types::{DatabaseStats, PatentDetail, PatentSummary};

pub mod config;
pub mod error;
pub mod parser;
pub mod repository;
pub mod service;
pub mod types;

pub struct ApplicationRuntime {
    config: AppConfiguration,
    repository: Arc<dyn PatentRepository>,
    pub patent_service: Arc<PatentService>,
    pub ingestion_service: Arc<IngestionService>,
    pub graph_service: Arc<GraphService>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Ingest(Ingest),
    ListPatents { search: Option<String> },
    PatentDetail(String),
    Stats,
    Keywords { user_idea: String, max_keywords: usize },
    PageRank { limit: usize },
    Communities { min_size: usize },
    CitationPath { from: String, to: String },
    ExportCypher,
    InitSchema,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Ingested(IngestReport),
    Patents(Vec<PatentSummary>),
    Patent(Box<PatentDetail>),
    Stats(DatabaseStats),
    Keywords(String),
    Ranked(Vec<RankedPatent>),
    Communities(Vec<Community>),
    Path(Option<Vec<String>>),
    Cypher(String),
    SchemaInitialised,
}

impl ApplicationRuntime {
    #[must_use]
    pub fn config(&self) -> &AppConfiguration {
        &self.config
    }

    pub fn repository(&self) -> Arc<dyn PatentRepository> {
        self.repository.clone()
    }

    /// Executes the specified `Operation` and returns the result.
    ///
    /// # Errors
    ///
    /// - `DiscoveryError::PatentsView` or `DiscoveryError::RateLimited` when fetching fails
    /// - `DiscoveryError::Sql` when the database refuses a statement
    /// - `DiscoveryError::PatentNotFound` for `Operation::PatentDetail` of an unknown patent
    pub async fn execute(&self, operation: Operation) -> Result<OperationResult, DiscoveryError> {
        debug!("Executing {operation:?}");
        match operation {
            Operation::Ingest(ingest) => {
                let report = self.ingestion_service.run(&ingest).await?;
                Ok(OperationResult::Ingested(report))
            }
            Operation::ListPatents { search } => {
                let patents = self.patent_service.list_patents(search.as_deref()).await?;
                Ok(OperationResult::Patents(patents))
            }
            Operation::PatentDetail(patent_number) => {
                let patent = self.patent_service.patent_detail(&patent_number).await?;
                Ok(OperationResult::Patent(Box::new(patent)))
            }
            Operation::Stats => Ok(OperationResult::Stats(
                self.patent_service.database_stats().await?,
            )),
            Operation::Keywords {
                user_idea,
                max_keywords,
            } => Ok(OperationResult::Keywords(extract_keywords(
                &user_idea,
                max_keywords,
            ))),
            Operation::PageRank { limit } => Ok(OperationResult::Ranked(
                self.graph_service.page_rank(limit).await?,
            )),
            Operation::Communities { min_size } => Ok(OperationResult::Communities(
                self.graph_service.communities(min_size).await?,
            )),
            Operation::CitationPath { from, to } => Ok(OperationResult::Path(
                self.graph_service.shortest_path(&from, &to).await?,
            )),
            Operation::ExportCypher => Ok(OperationResult::Cypher(
                self.graph_service.export_cypher().await?,
            )),
            Operation::InitSchema => {
                self.repository.initialize_schema().await?;
                Ok(OperationResult::SchemaInitialised)
            }
        }
    }
}

#[derive(Default)]
pub struct ApplicationRuntimeBuilder {
    config: Option<AppConfiguration>,
    use_in_memory_db: bool,
    source: Option<Arc<dyn PatentSource>>,
    repository: Option<Arc<dyn PatentRepository>>,
}

impl ApplicationRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the supplied configuration instead of loading it from disk
    #[must_use]
    pub fn with_config(mut self, config: AppConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn use_in_memory_db(mut self) -> Self {
        self.use_in_memory_db = true;
        self
    }

    #[must_use]
    pub fn with_patentsview_client(mut self, client: PatentsView) -> Self {
        self.source = Some(Arc::new(client));
        self
    }

    #[must_use]
    pub fn with_patent_source(mut self, source: Arc<dyn PatentSource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn PatentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Wires the client, the repository and the services together.
    ///
    /// The schema is created when the runtime uses PostgreSQL.
    ///
    /// # Errors
    /// If the configuration cannot be loaded, the PatentsView client cannot be created
    /// or the database is unreachable
    pub async fn build(self) -> Result<ApplicationRuntime, DiscoveryError> {
        let config = match self.config {
            Some(config) => config,
            None => config::load()?,
        };

        let source: Arc<dyn PatentSource> = match self.source {
            Some(source) => source,
            None => Arc::new(PatentsView::from(&config.patentsview)?),
        };

        let repository: Arc<dyn PatentRepository> = match self.repository {
            Some(repository) => repository,
            None if self.use_in_memory_db => {
                info!("Using the in-memory patent store");
                Arc::new(MemoryPatentRepository::new())
            }
            None => {
                let repository = PostgresPatentRepository::connect(&config.database).await?;
                repository.initialize_schema().await?;
                Arc::new(repository)
            }
        };

        Ok(ApplicationRuntime {
            patent_service: Arc::new(PatentService::new(repository.clone())),
            ingestion_service: Arc::new(IngestionService::new(source, repository.clone())),
            graph_service: Arc::new(GraphService::new(repository.clone())),
            repository,
            config,
        })
    }
}
