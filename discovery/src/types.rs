use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// A patent extracted from a PatentsView record, ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPatent {
    pub patent_number: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub assignee_name: Option<String>,
    pub inventor_names: Option<String>,
    pub raw_data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedClaim {
    pub patent_number: String,
    pub claim_number: i32,
    pub claim_text: String,
}

/// Direction of a citation relative to the patent it was extracted from.
///
/// `Backward`: the patent cites an older one. `Forward`: a newer patent cites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    Forward,
    Backward,
}

impl CitationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Forward => "forward",
            CitationType::Backward => "backward",
        }
    }
}

impl Display for CitationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CitationType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(CitationType::Forward),
            "backward" => Ok(CitationType::Backward),
            other => Err(DiscoveryError::BadInput(format!(
                "Unknown citation type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedCitation {
    pub citing_patent: String,
    pub cited_patent: String,
    pub citation_type: CitationType,
}

/// Everything extracted from one batch of raw patents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    pub patents: Vec<ParsedPatent>,
    pub claims: Vec<ParsedClaim>,
    pub citations: Vec<ParsedCitation>,
}

impl ParsedBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patents.is_empty()
    }
}

/// Number of records written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub patents: usize,
    pub claims: usize,
    pub citations: usize,
}

/// A row of the patent list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentSummary {
    pub patent_number: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub grant_date: Option<NaiveDate>,
    pub assignee_name: Option<String>,
}

impl From<&ParsedPatent> for PatentSummary {
    fn from(p: &ParsedPatent) -> Self {
        PatentSummary {
            patent_number: p.patent_number.clone(),
            title: p.title.clone(),
            abstract_text: p.abstract_text.clone(),
            grant_date: p.grant_date,
            assignee_name: p.assignee_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_number: i32,
    pub claim_text: String,
}

/// A stored patent with its claims and citations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentDetail {
    pub patent_number: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub grant_date: Option<NaiveDate>,
    pub assignee_name: Option<String>,
    pub inventor_names: Option<String>,
    pub raw_data: serde_json::Value,
    pub claims: Vec<ClaimRecord>,
    /// Patents this one cites
    pub cited_patents: Vec<String>,
    /// Patents citing this one
    pub citing_patents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeCount {
    pub assignee_name: String,
    pub patent_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub total_patents: i64,
    pub total_claims: i64,
    pub total_citations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_patents: i64,
    pub total_claims: i64,
    pub total_citations: i64,
    pub recent_patents_1year: i64,
    pub average_claims_per_patent: f64,
    pub top_assignees: Vec<AssigneeCount>,
}

/// A directed citation link, `citing` → `cited`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationEdge {
    pub citing: String,
    pub cited: String,
}
