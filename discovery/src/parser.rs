//! Turns raw PatentsView records into the patents, claims and citations we store.
//!
//! Records without a patent number are skipped with a warning, as are their claims and
//! citations. Unparseable dates are logged and left empty.
use chrono::NaiveDate;
use log::{info, warn};
use patentsview::models::patent::{RawAssignee, RawInventor, RawPatent};

use crate::types::{CitationType, ParsedBatch, ParsedCitation, ParsedClaim, ParsedPatent};

pub const UNTITLED: &str = "Untitled";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PatentParser;

impl PatentParser {
    #[must_use]
    pub fn new() -> Self {
        PatentParser
    }

    #[must_use]
    pub fn parse_patents(&self, raw_patents: &[RawPatent]) -> ParsedBatch {
        let mut batch = ParsedBatch::default();

        for raw in raw_patents {
            let Some(patent_number) = raw
                .patent_number
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
            else {
                warn!("Skipping patent record without a patent number");
                continue;
            };

            batch.patents.push(parse_patent(patent_number, raw));
            batch.claims.extend(parse_claims(patent_number, raw));
            batch.citations.extend(parse_citations(patent_number, raw));
        }

        info!(
            "Parsed {} patents, {} claims, {} citations",
            batch.patents.len(),
            batch.claims.len(),
            batch.citations.len()
        );
        batch
    }
}

fn parse_patent(patent_number: &str, raw: &RawPatent) -> ParsedPatent {
    ParsedPatent {
        patent_number: patent_number.to_string(),
        title: raw
            .patent_title
            .clone()
            .unwrap_or_else(|| UNTITLED.to_string()),
        abstract_text: raw.patent_abstract.clone(),
        filing_date: raw.app_date.as_deref().and_then(parse_date),
        grant_date: raw.patent_date.as_deref().and_then(parse_date),
        assignee_name: raw.assignees.first().and_then(assignee_name),
        inventor_names: inventor_names(&raw.inventors),
        raw_data: raw.to_value(),
    }
}

/// Accepts `2020-01-15` and `20200115`
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok());
    if parsed.is_none() {
        warn!("Could not parse date: {value}");
    }
    parsed
}

fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn assignee_name(assignee: &RawAssignee) -> Option<String> {
    match assignee.assignee_organization.as_deref() {
        Some(organization) if !organization.trim().is_empty() => Some(organization.to_string()),
        _ => full_name(
            assignee.assignee_first_name.as_deref(),
            assignee.assignee_last_name.as_deref(),
        ),
    }
}

fn inventor_names(inventors: &[RawInventor]) -> Option<String> {
    let names: Vec<String> = inventors
        .iter()
        .filter_map(|i| {
            full_name(
                i.inventor_name_first.as_deref(),
                i.inventor_name_last.as_deref(),
            )
        })
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn parse_claims(patent_number: &str, raw: &RawPatent) -> Vec<ParsedClaim> {
    raw.claims
        .iter()
        .enumerate()
        .filter_map(|(idx, claim)| {
            let text = claim.claim_text.as_deref().map(str::trim)?;
            if text.is_empty() {
                return None;
            }
            let position = i32::try_from(idx + 1).unwrap_or(i32::MAX);
            Some(ParsedClaim {
                patent_number: patent_number.to_string(),
                claim_number: claim.claim_number.unwrap_or(position),
                claim_text: text.to_string(),
            })
        })
        .collect()
}

fn parse_citations(patent_number: &str, raw: &RawPatent) -> Vec<ParsedCitation> {
    let backward = raw
        .cited_patents
        .iter()
        .filter_map(|c| c.cited_patent_number.as_deref())
        .filter(|n| !n.trim().is_empty())
        .map(|cited| ParsedCitation {
            citing_patent: patent_number.to_string(),
            cited_patent: cited.trim().to_string(),
            citation_type: CitationType::Backward,
        });

    let forward = raw
        .citedby_patents
        .iter()
        .filter_map(|c| c.citedby_patent_number.as_deref())
        .filter(|n| !n.trim().is_empty())
        .map(|citing| ParsedCitation {
            citing_patent: citing.trim().to_string(),
            cited_patent: patent_number.to_string(),
            citation_type: CitationType::Forward,
        });

    backward.chain(forward).collect()
}
