//! The patent discovery tools. Every tool answers with a markdown document.
use std::fmt::Write;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use discovery::error::DiscoveryError;
use discovery::service::ingestion::{IngestSource, DEFAULT_MAX_RESULTS};
use discovery::types::{DatabaseStats, LoadResult, ParsedBatch, RecordCounts};
use discovery::ApplicationRuntime;
use log::{info, warn};
use patentsview::keywords::{extract_keywords, DEFAULT_MAX_KEYWORDS};
use patentsview::models::patent::RawPatent;
use serde_json::{json, Value};
use thiserror::Error;

use crate::protocol::Tool;

const SHOWN_BY_IDEA: usize = 10;
const SHOWN_BY_ASSIGNEE: usize = 20;
const ABSTRACT_PREVIEW: usize = 200;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0} is required")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

pub struct PatentTools {
    runtime: Arc<ApplicationRuntime>,
}

impl PatentTools {
    pub fn new(runtime: Arc<ApplicationRuntime>) -> Self {
        Self { runtime }
    }

    #[must_use]
    pub fn definitions() -> Vec<Tool> {
        vec![
            tool(
                "fetch_patents_by_idea",
                "Fetch patents from PatentsView based on a user's invention idea. Extracts keywords and searches patent abstracts.",
                json!({
                    "type": "object",
                    "properties": {
                        "user_idea": {
                            "type": "string",
                            "description": "Description of the invention idea (e.g., 'A mobile device with touchscreen for browsing')"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of patents to fetch (default: 100)",
                            "default": DEFAULT_MAX_RESULTS
                        }
                    },
                    "required": ["user_idea"]
                }),
            ),
            tool(
                "ingest_and_store_patents",
                "Complete pipeline: fetch patents from PatentsView, parse them and store them in the database.",
                json!({
                    "type": "object",
                    "properties": {
                        "user_idea": {
                            "type": "string",
                            "description": "Description of the invention idea to search for"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of patents to fetch and store (default: 100)",
                            "default": DEFAULT_MAX_RESULTS
                        }
                    },
                    "required": ["user_idea"]
                }),
            ),
            tool(
                "fetch_patents_by_assignee",
                "Fetch patents by company or organization name (assignee).",
                json!({
                    "type": "object",
                    "properties": {
                        "assignee_name": {
                            "type": "string",
                            "description": "Name of the company/organization (e.g., 'Apple Inc', 'IBM')"
                        },
                        "start_year": {
                            "type": "integer",
                            "description": "Optional: Year to start search from (e.g., 2020)"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of patents to fetch (default: 100)",
                            "default": DEFAULT_MAX_RESULTS
                        }
                    },
                    "required": ["assignee_name"]
                }),
            ),
            tool(
                "get_database_stats",
                "Get statistics about the patent database (counts of patents, claims, citations).",
                json!({"type": "object", "properties": {}}),
            ),
            tool(
                "extract_keywords_from_idea",
                "Extract relevant keywords from a user's invention idea (useful for understanding what will be searched).",
                json!({
                    "type": "object",
                    "properties": {
                        "user_idea": {
                            "type": "string",
                            "description": "Description of the invention idea"
                        },
                        "max_keywords": {
                            "type": "integer",
                            "description": "Maximum keywords to extract (default: 10)",
                            "default": DEFAULT_MAX_KEYWORDS
                        }
                    },
                    "required": ["user_idea"]
                }),
            ),
        ]
    }

    /// Runs the named tool. `arguments` may be `Value::Null` when the caller sent none.
    ///
    /// # Errors
    /// Unknown tools, missing required arguments and PatentsView failures
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        info!("Calling tool {name}");
        match name {
            "fetch_patents_by_idea" => self.fetch_by_idea(arguments).await,
            "ingest_and_store_patents" => self.ingest_and_store(arguments).await,
            "fetch_patents_by_assignee" => self.fetch_by_assignee(arguments).await,
            "get_database_stats" => Ok(self.database_stats().await),
            "extract_keywords_from_idea" => {
                let user_idea = required_str(arguments, "user_idea")?;
                let max_keywords = usize_or(arguments, "max_keywords", DEFAULT_MAX_KEYWORDS);
                Ok(format_keywords(
                    user_idea,
                    &extract_keywords(user_idea, max_keywords),
                ))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn fetch(
        &self,
        source: IngestSource,
        max_results: usize,
    ) -> Result<Vec<RawPatent>, ToolError> {
        let mut raw = self.runtime.ingestion_service.fetch(&source).await?;
        raw.truncate(max_results);
        Ok(raw)
    }

    async fn fetch_by_idea(&self, arguments: &Value) -> Result<String, ToolError> {
        let user_idea = required_str(arguments, "user_idea")?;
        let max_results = usize_or(arguments, "max_results", DEFAULT_MAX_RESULTS);
        let raw = self
            .fetch(IngestSource::Idea(user_idea.to_string()), max_results)
            .await?;
        Ok(format_search_results(
            user_idea,
            &extract_keywords(user_idea, DEFAULT_MAX_KEYWORDS),
            &raw,
        ))
    }

    async fn fetch_by_assignee(&self, arguments: &Value) -> Result<String, ToolError> {
        let assignee_name = required_str(arguments, "assignee_name")?;
        let start_year = arguments
            .get("start_year")
            .and_then(Value::as_i64)
            .and_then(|year| i32::try_from(year).ok());
        let max_results = usize_or(arguments, "max_results", DEFAULT_MAX_RESULTS);
        let raw = self
            .fetch(
                IngestSource::Assignee {
                    name: assignee_name.to_string(),
                    start_year,
                },
                max_results,
            )
            .await?;
        Ok(format_assignee_results(assignee_name, start_year, &raw))
    }

    async fn ingest_and_store(&self, arguments: &Value) -> Result<String, ToolError> {
        let user_idea = required_str(arguments, "user_idea")?;
        let max_results = usize_or(arguments, "max_results", DEFAULT_MAX_RESULTS);

        let mut text = format!("# Patent Ingestion Pipeline\n\n**User Idea:** {user_idea}\n\n");
        text.push_str("## Step 1: Fetching from PatentsView\n");
        let raw = self
            .fetch(IngestSource::Idea(user_idea.to_string()), max_results)
            .await?;
        let _ = writeln!(text, "✓ Fetched {} patents from PatentsView\n", raw.len());
        if raw.is_empty() {
            text.push_str("⚠️ No patents found. Pipeline stopped.\n");
            return Ok(text);
        }

        text.push_str("## Step 2: Parsing Patent Data\n");
        let batch = self.runtime.ingestion_service.parse(&raw);
        let _ = writeln!(text, "✓ Parsed {} patents", batch.patents.len());
        let _ = writeln!(text, "✓ Extracted {} claims", batch.claims.len());
        let _ = writeln!(text, "✓ Extracted {} citations\n", batch.citations.len());

        text.push_str("## Step 3: Storing in the database\n");
        match self.store(&batch).await {
            Ok((loaded, totals)) => {
                let _ = writeln!(text, "✓ Inserted {} patents", loaded.patents);
                let _ = writeln!(text, "✓ Inserted {} claims", loaded.claims);
                let _ = writeln!(text, "✓ Inserted {} citations\n", loaded.citations);
                text.push_str("## Database Statistics\n");
                let _ = writeln!(text, "- Total Patents: {}", totals.total_patents);
                let _ = writeln!(text, "- Total Claims: {}", totals.total_claims);
                let _ = writeln!(text, "- Total Citations: {}\n", totals.total_citations);
                text.push_str("✅ **Pipeline completed successfully!**\n");
            }
            Err(e) => {
                warn!("Storing patents failed: {e}");
                let _ = writeln!(text, "❌ **Database Error:** {e}");
                text.push_str("\nPlease check database connection settings.\n");
            }
        }
        Ok(text)
    }

    async fn store(&self, batch: &ParsedBatch) -> Result<(LoadResult, RecordCounts), DiscoveryError> {
        let loaded = self.runtime.ingestion_service.load(batch).await?;
        let totals = self.runtime.repository().record_counts().await?;
        Ok((loaded, totals))
    }

    async fn database_stats(&self) -> String {
        match self.runtime.patent_service.database_stats().await {
            Ok(stats) => format_stats(&stats, Local::now().naive_local()),
            Err(e) => {
                warn!("Unable to read database statistics: {e}");
                format!(
                    "# Database Statistics\n\n\
                     ❌ **Error:** Could not retrieve statistics\n\
                     **Details:** {e}\n\n\
                     Please check database connection settings.\n"
                )
            }
        }
    }
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn required_str<'a>(arguments: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ToolError::MissingArgument(key))
}

fn usize_or(arguments: &Value, key: &str, default: usize) -> usize {
    arguments
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// 1234567 → "1,234,567"
fn with_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

pub(crate) fn format_search_results(user_idea: &str, keywords: &str, raw: &[RawPatent]) -> String {
    let mut text = String::from("# Patent Search Results\n\n");
    let _ = writeln!(text, "**Search Query:** {user_idea}");
    let _ = writeln!(text, "**Keywords Extracted:** {keywords}");
    let _ = writeln!(text, "**Patents Found:** {}\n", raw.len());

    if raw.is_empty() {
        text.push_str("\nNo patents found matching your idea.\n");
        return text;
    }

    text.push_str("## Top Patents:\n\n");
    for (i, patent) in raw.iter().take(SHOWN_BY_IDEA).enumerate() {
        let _ = writeln!(
            text,
            "### {}. {}",
            i + 1,
            patent.patent_number.as_deref().unwrap_or("N/A")
        );
        let _ = writeln!(
            text,
            "**Title:** {}",
            patent.patent_title.as_deref().unwrap_or("Untitled")
        );
        let _ = writeln!(
            text,
            "**Date:** {}",
            patent.patent_date.as_deref().unwrap_or("N/A")
        );
        let _ = writeln!(
            text,
            "**Abstract:** {}\n",
            preview(
                patent.patent_abstract.as_deref().unwrap_or("No abstract"),
                ABSTRACT_PREVIEW
            )
        );
    }
    if raw.len() > SHOWN_BY_IDEA {
        let _ = writeln!(
            text,
            "\n*({} more patents found but not displayed)*",
            raw.len() - SHOWN_BY_IDEA
        );
    }
    text
}

pub(crate) fn format_assignee_results(
    assignee_name: &str,
    start_year: Option<i32>,
    raw: &[RawPatent],
) -> String {
    let mut text = String::from("# Patents by Assignee\n\n");
    let _ = writeln!(text, "**Assignee:** {assignee_name}");
    if let Some(year) = start_year {
        let _ = writeln!(text, "**Since Year:** {year}");
    }
    let _ = writeln!(text, "**Patents Found:** {}\n", raw.len());

    if raw.is_empty() {
        text.push_str("\nNo patents found for this assignee.\n");
        return text;
    }

    text.push_str("## Patents:\n\n");
    for (i, patent) in raw.iter().take(SHOWN_BY_ASSIGNEE).enumerate() {
        let _ = writeln!(
            text,
            "{}. **{}** - {} ({})",
            i + 1,
            patent.patent_number.as_deref().unwrap_or("N/A"),
            patent.patent_title.as_deref().unwrap_or("Untitled"),
            patent.patent_date.as_deref().unwrap_or("N/A")
        );
    }
    if raw.len() > SHOWN_BY_ASSIGNEE {
        let _ = writeln!(
            text,
            "\n*({} more patents not displayed)*",
            raw.len() - SHOWN_BY_ASSIGNEE
        );
    }
    text
}

pub(crate) fn format_stats(stats: &DatabaseStats, now: NaiveDateTime) -> String {
    let mut text = String::from("# Patent Database Statistics\n\n");
    let _ = writeln!(text, "**Total Patents:** {}", with_thousands(stats.total_patents));
    let _ = writeln!(text, "**Total Claims:** {}", with_thousands(stats.total_claims));
    let _ = writeln!(
        text,
        "**Total Citations:** {}\n",
        with_thousands(stats.total_citations)
    );
    if stats.total_patents > 0 {
        let _ = writeln!(
            text,
            "**Average Claims per Patent:** {:.1}",
            stats.average_claims_per_patent
        );
    }
    let _ = writeln!(text, "\n*Last updated: {}*", now.format("%Y-%m-%d %H:%M:%S"));
    text
}

pub(crate) fn format_keywords(user_idea: &str, keywords: &str) -> String {
    let list: Vec<&str> = keywords.split_whitespace().collect();
    let mut text = String::from("# Keyword Extraction\n\n");
    let _ = writeln!(text, "**Original Text:**\n{user_idea}\n");
    let _ = writeln!(text, "**Extracted Keywords ({}):**", list.len());
    for (i, keyword) in list.iter().enumerate() {
        let _ = writeln!(text, "{}. {keyword}", i + 1);
    }
    let _ = writeln!(text, "\n**Search Query:**\n{keywords}");
    text
}
