//!
//! ```rust,ignore
//! // 1. Using the builder with explicit configuration
//! let patents_view = PatentsView::builder()
//!     .host("https://search.patentsview.org")
//!     .api_key("your_api_key")
//!     .timeout(30)
//!     .build()
//!     .expect("Failed to create PatentsView client");
//!
//! // 2. Using environment variables
//! let patents_view = PatentsViewBuilder::create_from_env()
//!     .expect("Failed to create PatentsView client");
//! ```
use crate::{Credentials, PatentsView, DEFAULT_HOST, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, PATENT_ENDPOINT};
use log::debug;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Error type for `PatentsViewBuilder` operations
#[derive(Error, Debug)]
pub enum PatentsViewBuilderError {
    #[error("URL parsing error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("PatentsView client initialization error: {0}")]
    ClientInitError(String),

    #[error("Timeout must be positive")]
    InvalidTimeout,

    #[error("Page size must be between 1 and 1000, got {0}")]
    InvalidPageSize(u32),
}

/// Names of the environment variables used to configure the client
pub struct PatentsViewEnvVars;

impl PatentsViewEnvVars {
    pub const URL: &'static str = "PATENTSVIEW_URL";
    pub const API_KEY: &'static str = "PATENTSVIEW_API_KEY";
}

/// Builder for creating PatentsView client instances
#[derive(Default)]
pub struct PatentsViewBuilder {
    host: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
    per_page: Option<u32>,
    max_pages: Option<u32>,
}

impl PatentsViewBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PatentsView host URL, default is the public USPTO host
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::ApiKey(api_key.into()));
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets a request timeout in seconds
    #[must_use]
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(Duration::from_secs(seconds));
        self
    }

    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Picks up the host and api key from the environment, if set
    #[must_use]
    pub fn from_env(self) -> Self {
        let mut builder = self;

        if let Ok(host) = env::var(PatentsViewEnvVars::URL) {
            builder = builder.host(host);
        }
        if let Ok(api_key) = env::var(PatentsViewEnvVars::API_KEY) {
            builder = builder.credentials(Credentials::from_api_key(Some(&api_key)));
        }

        builder
    }

    /// Builds a PatentsView client instance with the configured parameters
    ///
    /// # Errors
    /// If the host is not a valid URL, the timeout is zero or the page size is out of range
    pub fn build(self) -> Result<PatentsView, PatentsViewBuilderError> {
        let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host_url = Url::parse(&host)?;

        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 || per_page > 1000 {
            return Err(PatentsViewBuilderError::InvalidPageSize(per_page));
        }

        let mut client_builder = Client::builder();
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(PatentsViewBuilderError::InvalidTimeout);
            }
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder
            .build()
            .map_err(|e| PatentsViewBuilderError::ClientInitError(e.to_string()))?;

        let patents_view = PatentsView {
            host: host_url,
            endpoint: PATENT_ENDPOINT.to_string(),
            credentials: self.credentials.unwrap_or(Credentials::Anonymous),
            per_page,
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            client,
        };
        debug!("Created PatentsView client: {:#?}", patents_view);

        Ok(patents_view)
    }

    /// Convenience method to create a client from environment variables
    ///
    /// # Errors
    /// See [`PatentsViewBuilder::build`]
    pub fn create_from_env() -> Result<PatentsView, PatentsViewBuilderError> {
        Self::new().from_env().build()
    }
}

impl PatentsView {
    /// Create a PatentsView client builder
    #[must_use]
    pub fn builder() -> PatentsViewBuilder {
        PatentsViewBuilder::new()
    }
}
