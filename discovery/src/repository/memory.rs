use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};

use crate::error::DiscoveryError;
use crate::repository::PatentRepository;
use crate::types::{
    AssigneeCount, CitationEdge, CitationType, ClaimRecord, ParsedCitation, ParsedClaim,
    ParsedPatent, PatentDetail, PatentSummary, RecordCounts,
};

#[derive(Default)]
struct Store {
    patents: BTreeMap<String, ParsedPatent>,
    claims: HashMap<String, BTreeMap<i32, String>>,
    citations: Vec<ParsedCitation>,
    citation_pairs: HashSet<(String, String)>,
}

/// Keeps everything in process memory, used for `--in-memory` runs and tests
#[derive(Default)]
pub struct MemoryPatentRepository {
    store: Mutex<Store>,
}

impl MemoryPatentRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest grant date first, undated last
pub(crate) fn by_grant_date_desc(a: &PatentSummary, b: &PatentSummary) -> Ordering {
    match (a.grant_date, b.grant_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.patent_number.cmp(&b.patent_number))
}

fn matches(patent: &ParsedPatent, needle: &str) -> bool {
    patent.title.to_lowercase().contains(needle)
        || patent
            .abstract_text
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(needle))
}

#[async_trait]
impl PatentRepository for MemoryPatentRepository {
    async fn initialize_schema(&self) -> Result<(), DiscoveryError> {
        debug!("In-memory store needs no schema");
        Ok(())
    }

    async fn upsert_patents(&self, patents: &[ParsedPatent]) -> Result<usize, DiscoveryError> {
        let mut store = self.store.lock()?;
        for patent in patents {
            store
                .patents
                .insert(patent.patent_number.clone(), patent.clone());
        }
        Ok(patents.len())
    }

    async fn replace_claims(&self, claims: &[ParsedClaim]) -> Result<usize, DiscoveryError> {
        let mut by_patent: BTreeMap<&str, Vec<&ParsedClaim>> = BTreeMap::new();
        for claim in claims {
            by_patent
                .entry(claim.patent_number.as_str())
                .or_default()
                .push(claim);
        }

        let mut store = self.store.lock()?;
        let mut inserted = 0;
        for (patent_number, patent_claims) in by_patent {
            if !store.patents.contains_key(patent_number) {
                warn!("Patent {patent_number} not found, skipping claims");
                continue;
            }
            let replacement: BTreeMap<i32, String> = patent_claims
                .iter()
                .map(|c| (c.claim_number, c.claim_text.clone()))
                .collect();
            inserted += patent_claims.len();
            store.claims.insert(patent_number.to_string(), replacement);
        }
        Ok(inserted)
    }

    async fn insert_citations(
        &self,
        citations: &[ParsedCitation],
    ) -> Result<usize, DiscoveryError> {
        let mut store = self.store.lock()?;
        let mut inserted = 0;
        for citation in citations {
            let pair = (
                citation.citing_patent.clone(),
                citation.cited_patent.clone(),
            );
            if store.citation_pairs.insert(pair) {
                store.citations.push(citation.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_patents(
        &self,
        search: &str,
        limit: usize,
    ) -> Result<Vec<PatentSummary>, DiscoveryError> {
        let needle = Some(search.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let store = self.store.lock()?;
        let mut summaries: Vec<PatentSummary> = store
            .patents
            .values()
            .filter(|p| needle.as_deref().map_or(true, |n| matches(p, n)))
            .map(PatentSummary::from)
            .collect();
        summaries.sort_by(by_grant_date_desc);
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn find_patent(
        &self,
        patent_number: &str,
    ) -> Result<Option<PatentDetail>, DiscoveryError> {
        let store = self.store.lock()?;
        let Some(patent) = store.patents.get(patent_number) else {
            return Ok(None);
        };

        let claims = store
            .claims
            .get(patent_number)
            .map(|claims| {
                claims
                    .iter()
                    .map(|(number, text)| ClaimRecord {
                        claim_number: *number,
                        claim_text: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let cited_patents = store
            .citations
            .iter()
            .filter(|c| c.citing_patent == patent_number && c.citation_type == CitationType::Backward)
            .map(|c| c.cited_patent.clone())
            .collect();
        let citing_patents = store
            .citations
            .iter()
            .filter(|c| c.cited_patent == patent_number && c.citation_type == CitationType::Forward)
            .map(|c| c.citing_patent.clone())
            .collect();

        Ok(Some(PatentDetail {
            patent_number: patent.patent_number.clone(),
            title: patent.title.clone(),
            abstract_text: patent.abstract_text.clone(),
            filing_date: patent.filing_date,
            grant_date: patent.grant_date,
            assignee_name: patent.assignee_name.clone(),
            inventor_names: patent.inventor_names.clone(),
            raw_data: patent.raw_data.clone(),
            claims,
            cited_patents,
            citing_patents,
        }))
    }

    async fn record_counts(&self) -> Result<RecordCounts, DiscoveryError> {
        let store = self.store.lock()?;
        let to_i64 = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(RecordCounts {
            total_patents: to_i64(store.patents.len()),
            total_claims: to_i64(store.claims.values().map(BTreeMap::len).sum()),
            total_citations: to_i64(store.citations.len()),
        })
    }

    async fn count_granted_since(&self, since: NaiveDate) -> Result<i64, DiscoveryError> {
        let store = self.store.lock()?;
        let count = store
            .patents
            .values()
            .filter(|p| p.grant_date.is_some_and(|d| d >= since))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn top_assignees(&self, limit: usize) -> Result<Vec<AssigneeCount>, DiscoveryError> {
        let store = self.store.lock()?;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for name in store.patents.values().filter_map(|p| p.assignee_name.as_deref()) {
            *counts.entry(name).or_default() += 1;
        }
        let mut assignees: Vec<AssigneeCount> = counts
            .into_iter()
            .map(|(name, count)| AssigneeCount {
                assignee_name: name.to_string(),
                patent_count: count,
            })
            .collect();
        assignees.sort_by(|a, b| {
            b.patent_count
                .cmp(&a.patent_count)
                .then_with(|| a.assignee_name.cmp(&b.assignee_name))
        });
        assignees.truncate(limit);
        Ok(assignees)
    }

    async fn citation_edges(&self) -> Result<Vec<CitationEdge>, DiscoveryError> {
        let store = self.store.lock()?;
        Ok(store
            .citations
            .iter()
            .map(|c| CitationEdge {
                citing: c.citing_patent.clone(),
                cited: c.cited_patent.clone(),
            })
            .collect())
    }
}
