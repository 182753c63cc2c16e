// Storage of patents, claims and citations.
pub mod memory;
pub mod patent_repository;
pub mod postgres;

pub use memory::MemoryPatentRepository;
pub use patent_repository::PatentRepository;
pub use postgres::postgres_patent_repo::PostgresPatentRepository;

#[cfg(test)]
pub(crate) mod mock {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::mock;

    use super::PatentRepository;
    use crate::error::DiscoveryError;
    use crate::types::{
        AssigneeCount, CitationEdge, ParsedCitation, ParsedClaim, ParsedPatent, PatentDetail,
        PatentSummary, RecordCounts,
    };

    mock! {
        pub Repo {}

        #[async_trait]
        impl PatentRepository for Repo {
            async fn initialize_schema(&self) -> Result<(), DiscoveryError>;
            async fn upsert_patents(&self, patents: &[ParsedPatent]) -> Result<usize, DiscoveryError>;
            async fn replace_claims(&self, claims: &[ParsedClaim]) -> Result<usize, DiscoveryError>;
            async fn insert_citations(&self, citations: &[ParsedCitation]) -> Result<usize, DiscoveryError>;
            async fn list_patents(&self, search: &str, limit: usize) -> Result<Vec<PatentSummary>, DiscoveryError>;
            async fn find_patent(&self, patent_number: &str) -> Result<Option<PatentDetail>, DiscoveryError>;
            async fn record_counts(&self) -> Result<RecordCounts, DiscoveryError>;
            async fn count_granted_since(&self, since: NaiveDate) -> Result<i64, DiscoveryError>;
            async fn top_assignees(&self, limit: usize) -> Result<Vec<AssigneeCount>, DiscoveryError>;
            async fn citation_edges(&self) -> Result<Vec<CitationEdge>, DiscoveryError>;
        }
    }
}
