use serde::{Deserialize, Serialize};

use crate::{DEFAULT_HOST, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE};

pub const API_KEY_PLACEHOLDER: &str = "<your PatentsView api key goes here>";

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct PatentsViewClientConfiguration {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub per_page: u32,
    pub max_pages: u32,
}

impl Default for PatentsViewClientConfiguration {
    fn default() -> Self {
        PatentsViewClientConfiguration {
            url: DEFAULT_HOST.into(),
            api_key: None,
            timeout_seconds: 30,
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PatentsViewClientConfiguration {
    /// Does the configuration hold something that looks like a real api key?
    #[must_use]
    pub fn has_valid_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty() && key != API_KEY_PLACEHOLDER)
    }
}
