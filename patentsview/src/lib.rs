//!
//! `patentsview` is a client for the USPTO PatentsView search API.
//!
//! The types are shaped around patent discovery: searching by an invention idea, an assignee,
//! a technology class or a list of patent numbers, and retrieving the claims and citations
//! needed to build a local patent database.
use std::{
    error::Error,
    fmt::{self, Formatter},
};

use log::{debug, info, warn};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use url::{ParseError, Url};

use config::PatentsViewClientConfiguration;
use keywords::{extract_keywords, DEFAULT_MAX_KEYWORDS};
use models::page::{PageOptions, PatentsPage, SearchRequest};
use models::patent::RawPatent;
use query::Query;

pub mod builder;
pub mod config;
pub mod keywords;
pub mod models;
pub mod query;

type Result<T> = std::result::Result<T, PatentsViewError>;

pub const DEFAULT_HOST: &str = "https://search.patentsview.org";
pub const PATENT_ENDPOINT: &str = "api/v1/patent/";
pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Fields requested from PatentsView unless the caller asks for something else
pub const DEFAULT_FIELDS: [&str; 12] = [
    "patent_number",
    "patent_title",
    "patent_abstract",
    "patent_date",
    "app_date",
    "assignees",
    "inventors",
    "claims",
    "cited_patents",
    "citedby_patents",
    "ipc_classes",
    "cpc_classes",
];

#[derive(Debug)]
pub enum PatentsViewError {
    Unauthorized,
    NotFound(String),
    RateLimited { retry_after: Option<u64> },
    Fault { code: StatusCode, message: String },
    RequiredParameter(String),
    RequestError(reqwest::Error),
    SerializationError(serde_json::error::Error),
    ParseError(ParseError),
}

#[allow(clippy::enum_glob_use)]
impl fmt::Display for PatentsViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use crate::PatentsViewError::*;

        match self {
            Unauthorized => write!(f, "PatentsView rejected the API key"),
            NotFound(url) => write!(f, "Not found: '{url}'"),
            RateLimited { retry_after: Some(secs) } => {
                write!(f, "PatentsView rate limit exceeded, retry after {secs}s")
            }
            RateLimited { retry_after: None } => write!(f, "PatentsView rate limit exceeded"),
            Fault { code, message } => write!(f, "PatentsView error ({code}): {message}"),
            RequiredParameter(param_name) => {
                write!(f, "Parameter '{param_name}' must contain a value")
            }
            RequestError(e) => write!(f, "Request to PatentsView failed: {e}"),
            SerializationError(e) => write!(f, "Could not serialize/deserialize: {e}"),
            ParseError(e) => write!(f, "Invalid PatentsView URL: {e}"),
        }
    }
}

impl Error for PatentsViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PatentsViewError::RequestError(e) => Some(e),
            PatentsViewError::SerializationError(e) => Some(e),
            PatentsViewError::ParseError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for PatentsViewError {
    fn from(error: ParseError) -> PatentsViewError {
        PatentsViewError::ParseError(error)
    }
}

impl From<reqwest::Error> for PatentsViewError {
    fn from(error: reqwest::Error) -> PatentsViewError {
        PatentsViewError::RequestError(error)
    }
}

impl From<serde_json::error::Error> for PatentsViewError {
    fn from(error: serde_json::error::Error) -> PatentsViewError {
        PatentsViewError::SerializationError(error)
    }
}

#[derive(Clone)]
pub enum Credentials {
    Anonymous,
    ApiKey(String),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Anonymous => request,
            Credentials::ApiKey(ref key) => request.header(API_KEY_HEADER, key.as_str()),
        }
    }

    /// Api key if present and non-blank, anonymous otherwise
    #[must_use]
    pub fn from_api_key(api_key: Option<&str>) -> Self {
        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => Credentials::ApiKey(key.to_string()),
            _ => Credentials::Anonymous,
        }
    }
}

// Never print the key itself
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Anonymous"),
            Credentials::ApiKey(_) => write!(f, "ApiKey(***)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatentsView {
    host: Url,
    endpoint: String,
    credentials: Credentials,
    per_page: u32,
    max_pages: u32,
    pub client: Client,
}

impl PatentsView {
    #[allow(clippy::missing_errors_doc)]
    pub fn new<H>(host: H, credentials: Credentials) -> Result<PatentsView>
    where
        H: Into<String>,
    {
        let host = Url::parse(&host.into())?;
        if matches!(credentials, Credentials::Anonymous) {
            warn!("No API key provided. Set the PATENTSVIEW_API_KEY environment variable.");
        }

        Ok(PatentsView {
            host,
            endpoint: PATENT_ENDPOINT.to_string(),
            credentials,
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            client: Client::new(),
        })
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn from(cfg: &PatentsViewClientConfiguration) -> Result<PatentsView> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        let mut patents_view = PatentsView::new(
            cfg.url.clone(),
            Credentials::from_api_key(cfg.api_key.as_deref()),
        )?;
        patents_view.client = client;
        patents_view.per_page = cfg.per_page;
        patents_view.max_pages = cfg.max_pages;
        Ok(patents_view)
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    async fn post<D, S>(&self, body: &S) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize,
    {
        let url = self.host.join(&self.endpoint)?;
        let data = serde_json::to_vec::<S>(body)?;

        let mut request = self
            .client
            .request(Method::POST, url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(data);
        request = self.credentials.apply(request);
        debug!("request '{:?}'", request);

        let response = request.send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await?;
        debug!("status {:?} body length {}", status, body.len());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PatentsViewError::Unauthorized),
            StatusCode::NOT_FOUND => Err(PatentsViewError::NotFound(url.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(PatentsViewError::RateLimited { retry_after }),
            failed if !failed.is_success() => Err(PatentsViewError::Fault {
                code: status,
                message: body,
            }),
            _ => {
                let data = if body.is_empty() { "null" } else { body.as_str() };
                Ok(serde_json::from_str::<D>(data)?)
            }
        }
    }

    /// Retrieves a single page of search results
    #[allow(clippy::missing_errors_doc)]
    pub async fn search_page(
        &self,
        query: &Query,
        fields: &[String],
        per_page: u32,
        page: u32,
    ) -> Result<PatentsPage> {
        let request = SearchRequest {
            q: query.to_json(),
            f: fields.to_vec(),
            o: PageOptions { per_page, page },
        };
        self.post::<PatentsPage, SearchRequest>(&request).await
    }

    /// Fetches every page of results for `query`, up to `max_pages` pages.
    ///
    /// A response without a `patents` member yields an empty result.
    #[allow(clippy::missing_errors_doc)]
    pub async fn fetch_patents_by_query(
        &self,
        query: &Query,
        fields: Option<&[&str]>,
        per_page: u32,
        max_pages: u32,
    ) -> Result<Vec<RawPatent>> {
        let fields: Vec<String> = fields
            .unwrap_or(&DEFAULT_FIELDS)
            .iter()
            .map(|f| (*f).to_string())
            .collect();

        info!("Fetching patents with query: {query}");
        let first_page = self.search_page(query, &fields, per_page, 1).await?;

        let Some(mut all_patents) = first_page.patents else {
            info!("Response holds no patents");
            return Ok(Vec::new());
        };
        info!("Fetched {} patents from page 1", all_patents.len());

        let total_pages = first_page.total_pages.unwrap_or(1);
        info!(
            "Total results: {}, Total pages: {}",
            first_page.count.unwrap_or(all_patents.len() as u64),
            total_pages
        );

        for page in 2..=max_pages.min(total_pages) {
            let page_result = self.search_page(query, &fields, per_page, page).await?;
            if let Some(mut patents) = page_result.patents {
                all_patents.append(&mut patents);
                info!("Fetched page {page}, total patents: {}", all_patents.len());
            }
        }

        info!("Total patents fetched: {}", all_patents.len());
        Ok(all_patents)
    }

    async fn fetch_with_defaults(&self, query: &Query) -> Result<Vec<RawPatent>> {
        self.fetch_patents_by_query(query, None, self.per_page, self.max_pages)
            .await
    }

    /// Searches patent abstracts for the keywords found in a free text description of an idea
    #[allow(clippy::missing_errors_doc)]
    pub async fn fetch_by_user_idea(&self, user_idea: &str) -> Result<Vec<RawPatent>> {
        let keywords = extract_keywords(user_idea, DEFAULT_MAX_KEYWORDS);
        if keywords.is_empty() {
            warn!("No usable keywords in '{user_idea}', nothing to search for");
            return Ok(Vec::new());
        }
        self.fetch_with_defaults(&Query::by_user_idea(&keywords))
            .await
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn fetch_by_technology_area(
        &self,
        ipc_code: &str,
        year: i32,
    ) -> Result<Vec<RawPatent>> {
        if ipc_code.trim().is_empty() {
            return Err(PatentsViewError::RequiredParameter("ipc_code".to_string()));
        }
        self.fetch_with_defaults(&Query::by_technology_area(ipc_code, year))
            .await
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn fetch_by_patent_numbers(
        &self,
        patent_numbers: &[String],
    ) -> Result<Vec<RawPatent>> {
        if patent_numbers.is_empty() {
            return Err(PatentsViewError::RequiredParameter(
                "patent_numbers".to_string(),
            ));
        }
        self.fetch_with_defaults(&Query::by_patent_numbers(patent_numbers))
            .await
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn fetch_by_assignee(
        &self,
        assignee_name: &str,
        start_year: Option<i32>,
    ) -> Result<Vec<RawPatent>> {
        if assignee_name.trim().is_empty() {
            return Err(PatentsViewError::RequiredParameter(
                "assignee_name".to_string(),
            ));
        }
        self.fetch_with_defaults(&Query::by_assignee(assignee_name, start_year))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn page_body(numbers: &[&str], total_pages: u32) -> String {
        let patents: Vec<_> = numbers
            .iter()
            .map(|n| json!({"patent_number": n, "patent_title": format!("Title {n}")}))
            .collect();
        json!({
            "patents": patents,
            "count": numbers.len(),
            "total_pages": total_pages
        })
        .to_string()
    }

    #[tokio::test]
    async fn fetch_stops_at_max_pages() -> Result<()> {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("POST", "/api/v1/patent/")
            .match_body(Matcher::PartialJson(json!({"o": {"page": 1}})))
            .with_status(200)
            .with_body(page_body(&["1", "2"], 3))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("POST", "/api/v1/patent/")
            .match_body(Matcher::PartialJson(json!({"o": {"page": 2}})))
            .with_status(200)
            .with_body(page_body(&["3"], 3))
            .expect(1)
            .create_async()
            .await;

        let client = PatentsView::new(server.url(), Credentials::Anonymous)?;
        let patents = client
            .fetch_patents_by_query(&Query::by_patent_numbers(&["1".to_string()]), None, 2, 2)
            .await?;

        let numbers: Vec<_> = patents
            .iter()
            .filter_map(|p| p.patent_number.clone())
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
        page1.assert_async().await;
        page2.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_patents_member_gives_empty_result() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v1/patent/")
            .with_status(200)
            .with_body(r#"{"count": 0, "total_pages": 0}"#)
            .create_async()
            .await;

        let client = PatentsView::new(server.url(), Credentials::Anonymous)?;
        let patents = client.fetch_by_user_idea("quantum battery charger").await?;
        assert!(patents.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn api_key_is_sent_in_header() -> Result<()> {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/patent/")
            .match_header("x-api-key", "secret-key")
            .match_body(Matcher::PartialJson(json!({
                "q": {"_contains": {"assignee_organization": "Acme"}}
            })))
            .with_status(200)
            .with_body(page_body(&["42"], 1))
            .create_async()
            .await;

        let client = PatentsView::new(server.url(), Credentials::ApiKey("secret-key".into()))?;
        let patents = client.fetch_by_assignee("Acme", None).await?;
        assert_eq!(patents.len(), 1);
        m.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_maps_to_unauthorized() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v1/patent/")
            .with_status(403)
            .with_body(r#"{"detail": "bad key"}"#)
            .create_async()
            .await;

        let client = PatentsView::new(server.url(), Credentials::ApiKey("bad".into()))?;
        match client.fetch_by_assignee("Acme", Some(2020)).await {
            Err(PatentsViewError::Unauthorized) => {}
            other => panic!("Expected Unauthorized, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after() -> Result<()> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/v1/patent/")
            .with_status(429)
            .with_header("retry-after", "12")
            .create_async()
            .await;

        let client = PatentsView::new(server.url(), Credentials::Anonymous)?;
        match client.fetch_by_technology_area("H04L", 2023).await {
            Err(PatentsViewError::RateLimited { retry_after }) => {
                assert_eq!(retry_after, Some(12));
            }
            other => panic!("Expected RateLimited, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_assignee_is_rejected_without_request() {
        let client = PatentsView::new("http://localhost:1", Credentials::Anonymous).unwrap();
        let result = client.fetch_by_assignee("  ", None).await;
        assert!(matches!(
            result,
            Err(PatentsViewError::RequiredParameter(ref p)) if p == "assignee_name"
        ));
    }

    #[test]
    fn blank_api_key_is_anonymous() {
        assert!(matches!(
            Credentials::from_api_key(Some("  ")),
            Credentials::Anonymous
        ));
        assert!(matches!(
            Credentials::from_api_key(Some("k")),
            Credentials::ApiKey(_)
        ));
        assert_eq!(format!("{:?}", Credentials::ApiKey("k".into())), "ApiKey(***)");
    }
}
