use serde::{Deserialize, Serialize};

use super::patent::RawPatent;

/// Body of a PatentsView search request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchRequest {
    pub q: serde_json::Value,
    pub f: Vec<String>,
    pub o: PageOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub per_page: u32,
    pub page: u32,
}

/// One page of search results. `patents` is absent when the query matched nothing.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct PatentsPage {
    #[serde(default)]
    pub patents: Option<Vec<RawPatent>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total_hits: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}
