//! The fetch → parse → store pipeline.
//!
//! Patents are fetched from PatentsView through the [`PatentSource`] seam, truncated to the
//! requested number of results, parsed and optionally written to the repository: patents
//! first, then claims, then citations.
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use patentsview::models::patent::RawPatent;
use patentsview::{PatentsView, PatentsViewError};

use crate::error::DiscoveryError;
use crate::parser::PatentParser;
use crate::repository::PatentRepository;
use crate::types::{LoadResult, ParsedBatch};

pub const DEFAULT_MAX_RESULTS: usize = 100;

// What the pipeline needs from the PatentsView client
#[async_trait]
pub trait PatentSource: Send + Sync {
    async fn fetch_by_user_idea(&self, user_idea: &str) -> Result<Vec<RawPatent>, PatentsViewError>;
    async fn fetch_by_assignee(
        &self,
        assignee_name: &str,
        start_year: Option<i32>,
    ) -> Result<Vec<RawPatent>, PatentsViewError>;
    async fn fetch_by_technology_area(
        &self,
        ipc_code: &str,
        year: i32,
    ) -> Result<Vec<RawPatent>, PatentsViewError>;
    async fn fetch_by_patent_numbers(
        &self,
        patent_numbers: &[String],
    ) -> Result<Vec<RawPatent>, PatentsViewError>;
}

#[async_trait]
impl PatentSource for PatentsView {
    async fn fetch_by_user_idea(&self, user_idea: &str) -> Result<Vec<RawPatent>, PatentsViewError> {
        self.fetch_by_user_idea(user_idea).await
    }

    async fn fetch_by_assignee(
        &self,
        assignee_name: &str,
        start_year: Option<i32>,
    ) -> Result<Vec<RawPatent>, PatentsViewError> {
        self.fetch_by_assignee(assignee_name, start_year).await
    }

    async fn fetch_by_technology_area(
        &self,
        ipc_code: &str,
        year: i32,
    ) -> Result<Vec<RawPatent>, PatentsViewError> {
        self.fetch_by_technology_area(ipc_code, year).await
    }

    async fn fetch_by_patent_numbers(
        &self,
        patent_numbers: &[String],
    ) -> Result<Vec<RawPatent>, PatentsViewError> {
        self.fetch_by_patent_numbers(patent_numbers).await
    }
}

/// Where to look for patents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestSource {
    /// Free text description of an invention, reduced to keywords
    Idea(String),
    Assignee {
        name: String,
        start_year: Option<i32>,
    },
    TechnologyArea {
        ipc: String,
        year: i32,
    },
    PatentNumbers(Vec<String>),
}

impl Display for IngestSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IngestSource::Idea(idea) => write!(f, "idea '{idea}'"),
            IngestSource::Assignee {
                name,
                start_year: Some(year),
            } => write!(f, "assignee '{name}' since {year}"),
            IngestSource::Assignee { name, .. } => write!(f, "assignee '{name}'"),
            IngestSource::TechnologyArea { ipc, year } => {
                write!(f, "technology area {ipc} since {year}")
            }
            IngestSource::PatentNumbers(numbers) => write!(f, "patents {}", numbers.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingest {
    pub source: IngestSource,
    pub max_results: usize,
    /// Write the parsed patents to the repository
    pub store: bool,
}

impl Ingest {
    #[must_use]
    pub fn new(source: IngestSource) -> Self {
        Ingest {
            source,
            max_results: DEFAULT_MAX_RESULTS,
            store: false,
        }
    }

    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }
}

/// Outcome of one run of the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub raw: Vec<RawPatent>,
    pub batch: ParsedBatch,
    /// `None` unless the run was asked to store
    pub stored: Option<LoadResult>,
}

impl IngestReport {
    #[must_use]
    pub fn patents_stored(&self) -> usize {
        self.stored.map_or(0, |r| r.patents)
    }
}

pub struct IngestionService {
    source: Arc<dyn PatentSource>,
    repository: Arc<dyn PatentRepository>,
    parser: PatentParser,
}

impl IngestionService {
    pub fn new(source: Arc<dyn PatentSource>, repository: Arc<dyn PatentRepository>) -> Self {
        Self {
            source,
            repository,
            parser: PatentParser::new(),
        }
    }

    pub async fn fetch(&self, source: &IngestSource) -> Result<Vec<RawPatent>, DiscoveryError> {
        info!("Fetching patents for {source}");
        let raw = match source {
            IngestSource::Idea(idea) => self.source.fetch_by_user_idea(idea).await?,
            IngestSource::Assignee { name, start_year } => {
                self.source.fetch_by_assignee(name, *start_year).await?
            }
            IngestSource::TechnologyArea { ipc, year } => {
                self.source.fetch_by_technology_area(ipc, *year).await?
            }
            IngestSource::PatentNumbers(numbers) => {
                self.source.fetch_by_patent_numbers(numbers).await?
            }
        };
        Ok(raw)
    }

    #[must_use]
    pub fn parse(&self, raw: &[RawPatent]) -> ParsedBatch {
        self.parser.parse_patents(raw)
    }

    /// Stores a parsed batch. An empty batch leaves the repository untouched.
    pub async fn load(&self, batch: &ParsedBatch) -> Result<LoadResult, DiscoveryError> {
        if batch.is_empty() {
            info!("No patents to load");
            return Ok(LoadResult::default());
        }

        let patents = self.repository.upsert_patents(&batch.patents).await?;
        let claims = self.repository.replace_claims(&batch.claims).await?;
        let citations = self.repository.insert_citations(&batch.citations).await?;

        let result = LoadResult {
            patents,
            claims,
            citations,
        };
        info!(
            "Successfully loaded: {} patents, {} claims, {} citations",
            result.patents, result.claims, result.citations
        );
        Ok(result)
    }

    pub async fn run(&self, ingest: &Ingest) -> Result<IngestReport, DiscoveryError> {
        let mut raw = self.fetch(&ingest.source).await?;
        if raw.len() > ingest.max_results {
            debug!("Keeping {} of {} patents", ingest.max_results, raw.len());
            raw.truncate(ingest.max_results);
        }

        let batch = self.parse(&raw);
        let stored = if ingest.store {
            Some(self.load(&batch).await?)
        } else {
            None
        };

        Ok(IngestReport { raw, batch, stored })
    }
}
