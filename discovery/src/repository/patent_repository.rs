use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DiscoveryError;
use crate::types::{
    AssigneeCount, CitationEdge, ParsedCitation, ParsedClaim, ParsedPatent, PatentDetail,
    PatentSummary, RecordCounts,
};

/// Persistent storage of the parsed patent data.
///
/// Both implementations share the same semantics, so anything exercised against the
/// in-memory store holds for PostgreSQL as well.
#[async_trait]
pub trait PatentRepository: Send + Sync {
    /// Creates the schema, tables, indexes and triggers unless they already exist
    async fn initialize_schema(&self) -> Result<(), DiscoveryError>;

    /// Inserts the patents, replacing every column of those already stored.
    /// Returns the number of patents written.
    async fn upsert_patents(&self, patents: &[ParsedPatent]) -> Result<usize, DiscoveryError>;

    /// Replaces the claims of each patent found in `claims`.
    ///
    /// Claims of patents not stored are skipped.
    async fn replace_claims(&self, claims: &[ParsedClaim]) -> Result<usize, DiscoveryError>;

    /// Inserts the citations not already known, returning how many were new
    async fn insert_citations(
        &self,
        citations: &[ParsedCitation],
    ) -> Result<usize, DiscoveryError>;

    /// Patents with `search` in the title or abstract, ignoring case, newest first.
    /// A blank `search` matches every patent.
    async fn list_patents(
        &self,
        search: &str,
        limit: usize,
    ) -> Result<Vec<PatentSummary>, DiscoveryError>;

    async fn find_patent(&self, patent_number: &str)
        -> Result<Option<PatentDetail>, DiscoveryError>;

    async fn record_counts(&self) -> Result<RecordCounts, DiscoveryError>;

    async fn count_granted_since(&self, since: NaiveDate) -> Result<i64, DiscoveryError>;

    async fn top_assignees(&self, limit: usize) -> Result<Vec<AssigneeCount>, DiscoveryError>;

    async fn citation_edges(&self) -> Result<Vec<CitationEdge>, DiscoveryError>;
}
