use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio_postgres::{Client, Row};

use crate::config::DatabaseConfiguration;
use crate::error::DiscoveryError;
use crate::repository::postgres::{connect, schema};
use crate::repository::PatentRepository;
use crate::types::{
    AssigneeCount, CitationEdge, ClaimRecord, ParsedCitation, ParsedClaim, ParsedPatent,
    PatentDetail, PatentSummary, RecordCounts,
};

const UPSERT_PATENT_SQL: &str = r"
    INSERT INTO patents.patents
        (patent_number, title, abstract, filing_date, grant_date,
         assignee_name, inventor_names, raw_data)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (patent_number) DO UPDATE SET
        title = EXCLUDED.title,
        abstract = EXCLUDED.abstract,
        filing_date = EXCLUDED.filing_date,
        grant_date = EXCLUDED.grant_date,
        assignee_name = EXCLUDED.assignee_name,
        inventor_names = EXCLUDED.inventor_names,
        raw_data = EXCLUDED.raw_data
";

const INSERT_CLAIM_SQL: &str = r"
    INSERT INTO patents.claims (patent_id, claim_number, claim_text)
    VALUES ($1, $2, $3)
    ON CONFLICT (patent_id, claim_number) DO UPDATE SET claim_text = EXCLUDED.claim_text
";

const INSERT_CITATION_SQL: &str = r"
    INSERT INTO patents.citations (citing_patent_number, cited_patent_number, citation_type)
    VALUES ($1, $2, $3)
    ON CONFLICT (citing_patent_number, cited_patent_number) DO NOTHING
";

const LIST_PATENTS_SQL: &str = r"
    SELECT patent_number, title, abstract, grant_date, assignee_name
    FROM patents.patents
    WHERE $1::TEXT IS NULL
       OR title ILIKE $1 ESCAPE '\'
       OR abstract ILIKE $1 ESCAPE '\'
    ORDER BY grant_date DESC NULLS LAST, patent_number
    LIMIT $2
";

const FIND_PATENT_SQL: &str = r"
    SELECT patent_number, title, abstract, filing_date, grant_date,
           assignee_name, inventor_names, raw_data
    FROM patents.patents
    WHERE patent_number = $1
";

const FIND_CLAIMS_SQL: &str = r"
    SELECT c.claim_number, c.claim_text
    FROM patents.claims c
    JOIN patents.patents p ON c.patent_id = p.id
    WHERE p.patent_number = $1
    ORDER BY c.claim_number
";

const CITED_PATENTS_SQL: &str = r"
    SELECT cited_patent_number FROM patents.citations
    WHERE citing_patent_number = $1 AND citation_type = 'backward'
    ORDER BY id
";

const CITING_PATENTS_SQL: &str = r"
    SELECT citing_patent_number FROM patents.citations
    WHERE cited_patent_number = $1 AND citation_type = 'forward'
    ORDER BY id
";

const TOP_ASSIGNEES_SQL: &str = r"
    SELECT assignee_name, COUNT(*) AS patent_count
    FROM patents.patents
    WHERE assignee_name IS NOT NULL
    GROUP BY assignee_name
    ORDER BY patent_count DESC, assignee_name
    LIMIT $1
";

pub struct PostgresPatentRepository {
    client: Mutex<Client>,
}

impl PostgresPatentRepository {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    /// Connects to the configured database
    ///
    /// # Errors
    /// See [`connect`]
    pub async fn connect(config: &DatabaseConfiguration) -> Result<Self, DiscoveryError> {
        Ok(Self::new(connect(config).await?))
    }
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn row_to_summary(row: &Row) -> PatentSummary {
    PatentSummary {
        patent_number: row.get("patent_number"),
        title: row.get("title"),
        abstract_text: row.get("abstract"),
        grant_date: row.get("grant_date"),
        assignee_name: row.get("assignee_name"),
    }
}

#[async_trait]
impl PatentRepository for PostgresPatentRepository {
    async fn initialize_schema(&self) -> Result<(), DiscoveryError> {
        let client = self.client.lock().await;
        for statement in schema::SCHEMA_STATEMENTS {
            client
                .batch_execute(statement)
                .await
                .map_err(|e| DiscoveryError::Schema(e.to_string()))?;
        }
        info!("Database schema is in place");
        Ok(())
    }

    async fn upsert_patents(&self, patents: &[ParsedPatent]) -> Result<usize, DiscoveryError> {
        if patents.is_empty() {
            return Ok(0);
        }
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        let stmt = tx.prepare(UPSERT_PATENT_SQL).await?;

        for patent in patents {
            debug!("Upserting patent {}", patent.patent_number);
            tx.execute(
                &stmt,
                &[
                    &patent.patent_number,
                    &patent.title,
                    &patent.abstract_text,
                    &patent.filing_date,
                    &patent.grant_date,
                    &patent.assignee_name,
                    &patent.inventor_names,
                    &patent.raw_data,
                ],
            )
            .await?;
        }
        tx.commit().await?;

        info!("Inserted {} patents", patents.len());
        Ok(patents.len())
    }

    async fn replace_claims(&self, claims: &[ParsedClaim]) -> Result<usize, DiscoveryError> {
        if claims.is_empty() {
            return Ok(0);
        }
        let mut by_patent: BTreeMap<&str, Vec<&ParsedClaim>> = BTreeMap::new();
        for claim in claims {
            by_patent
                .entry(claim.patent_number.as_str())
                .or_default()
                .push(claim);
        }

        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        let insert = tx.prepare(INSERT_CLAIM_SQL).await?;
        let mut inserted = 0;

        for (patent_number, patent_claims) in by_patent {
            let Some(row) = tx
                .query_opt(
                    "SELECT id FROM patents.patents WHERE patent_number = $1",
                    &[&patent_number],
                )
                .await?
            else {
                warn!("Patent {patent_number} not found, skipping claims");
                continue;
            };
            let patent_id: i32 = row.get(0);

            tx.execute(
                "DELETE FROM patents.claims WHERE patent_id = $1",
                &[&patent_id],
            )
            .await?;
            for claim in patent_claims {
                tx.execute(&insert, &[&patent_id, &claim.claim_number, &claim.claim_text])
                    .await?;
                inserted += 1;
            }
        }
        tx.commit().await?;

        info!("Inserted {inserted} claims");
        Ok(inserted)
    }

    async fn insert_citations(
        &self,
        citations: &[ParsedCitation],
    ) -> Result<usize, DiscoveryError> {
        if citations.is_empty() {
            return Ok(0);
        }
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        let stmt = tx.prepare(INSERT_CITATION_SQL).await?;
        let mut inserted = 0;

        for citation in citations {
            let rows = tx
                .execute(
                    &stmt,
                    &[
                        &citation.citing_patent,
                        &citation.cited_patent,
                        &citation.citation_type.as_str(),
                    ],
                )
                .await?;
            if rows > 0 {
                inserted += 1;
            }
        }
        tx.commit().await?;

        info!("Inserted {inserted} citations");
        Ok(inserted)
    }

    async fn list_patents(
        &self,
        search: &str,
        limit: usize,
    ) -> Result<Vec<PatentSummary>, DiscoveryError> {
        let search = Some(search.trim())
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let client = self.client.lock().await;
        let rows = client
            .query(LIST_PATENTS_SQL, &[&search, &to_limit(limit)])
            .await?;
        Ok(rows.iter().map(row_to_summary).collect())
    }

    async fn find_patent(
        &self,
        patent_number: &str,
    ) -> Result<Option<PatentDetail>, DiscoveryError> {
        let client = self.client.lock().await;
        let Some(row) = client.query_opt(FIND_PATENT_SQL, &[&patent_number]).await? else {
            return Ok(None);
        };

        let claims: Vec<ClaimRecord> = client
            .query(FIND_CLAIMS_SQL, &[&patent_number])
            .await?
            .iter()
            .map(|r| ClaimRecord {
                claim_number: r.get(0),
                claim_text: r.get(1),
            })
            .collect();
        let cited_patents: Vec<String> = client
            .query(CITED_PATENTS_SQL, &[&patent_number])
            .await?
            .iter()
            .map(|r| r.get(0))
            .collect();
        let citing_patents: Vec<String> = client
            .query(CITING_PATENTS_SQL, &[&patent_number])
            .await?
            .iter()
            .map(|r| r.get(0))
            .collect();

        let raw_data: Option<serde_json::Value> = row.get("raw_data");
        Ok(Some(PatentDetail {
            patent_number: row.get("patent_number"),
            title: row.get("title"),
            abstract_text: row.get("abstract"),
            filing_date: row.get("filing_date"),
            grant_date: row.get("grant_date"),
            assignee_name: row.get("assignee_name"),
            inventor_names: row.get("inventor_names"),
            raw_data: raw_data.unwrap_or(serde_json::Value::Null),
            claims,
            cited_patents,
            citing_patents,
        }))
    }

    async fn record_counts(&self) -> Result<RecordCounts, DiscoveryError> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                r"SELECT
                    (SELECT COUNT(*) FROM patents.patents),
                    (SELECT COUNT(*) FROM patents.claims),
                    (SELECT COUNT(*) FROM patents.citations)",
                &[],
            )
            .await?;
        Ok(RecordCounts {
            total_patents: row.get(0),
            total_claims: row.get(1),
            total_citations: row.get(2),
        })
    }

    async fn count_granted_since(&self, since: NaiveDate) -> Result<i64, DiscoveryError> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                "SELECT COUNT(*) FROM patents.patents WHERE grant_date >= $1",
                &[&since],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn top_assignees(&self, limit: usize) -> Result<Vec<AssigneeCount>, DiscoveryError> {
        let client = self.client.lock().await;
        let rows = client.query(TOP_ASSIGNEES_SQL, &[&to_limit(limit)]).await?;
        Ok(rows
            .iter()
            .map(|r| AssigneeCount {
                assignee_name: r.get(0),
                patent_count: r.get(1),
            })
            .collect())
    }

    async fn citation_edges(&self) -> Result<Vec<CitationEdge>, DiscoveryError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT citing_patent_number, cited_patent_number FROM patents.citations ORDER BY id",
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| CitationEdge {
                citing: r.get(0),
                cited: r.get(1),
            })
            .collect())
    }
}

/// `%term%` with the LIKE wildcards in `term` matching themselves
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_in_search_terms_are_literal() {
        assert_eq!(like_pattern("battery"), "%battery%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern(r"c:\x"), r"%c:\\x%");
    }
}
