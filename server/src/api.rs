//! HTTP endpoints backing the patent search page and the statistics dashboard.
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use discovery::service::graph::{Community, RankedPatent};
use discovery::service::ingestion::{Ingest, IngestSource, DEFAULT_MAX_RESULTS};
use discovery::types::{DatabaseStats, PatentDetail, PatentSummary};
use discovery::ApplicationRuntime;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;

type AppState = Arc<ApplicationRuntime>;

const USER_IDEA_REQUIRED: &str = "user_idea is required";

/// Query string parameters, rejected as `{"error": ...}`
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct Params<T>(T);

/// Path parameters, rejected as `{"error": ...}`
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct PathParam<T>(T);

pub fn router(runtime: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/patents", get(list_patents))
        .route("/api/patents/{patent_number}", get(patent_detail))
        .route("/api/search", post(search))
        .route("/api/stats", get(stats))
        .route("/api/graph/pagerank", get(page_rank))
        .route("/api/graph/communities", get(communities))
        .route("/api/graph/path", get(citation_path))
        .layer(cors)
        .with_state(runtime)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    search: Option<String>,
}

async fn list_patents(
    State(runtime): State<AppState>,
    Params(params): Params<ListParams>,
) -> Result<Json<Vec<PatentSummary>>, ApiError> {
    let patents = runtime
        .patent_service
        .list_patents(params.search.as_deref())
        .await?;
    Ok(Json(patents))
}

async fn patent_detail(
    State(runtime): State<AppState>,
    PathParam(patent_number): PathParam<String>,
) -> Result<Json<PatentDetail>, ApiError> {
    Ok(Json(
        runtime.patent_service.patent_detail(&patent_number).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    user_idea: Option<String>,
    #[serde(default)]
    store: bool,
    max_results: Option<usize>,
}

// The body is parsed by hand so that garbage gets the same 400 as a missing idea
async fn search(State(runtime): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request: SearchRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest(USER_IDEA_REQUIRED.to_string()))?;
    let user_idea = request
        .user_idea
        .filter(|idea| !idea.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(USER_IDEA_REQUIRED.to_string()))?;

    info!("Searching patents for '{user_idea}'");
    let ingest = Ingest::new(IngestSource::Idea(user_idea.clone()))
        .max_results(request.max_results.unwrap_or(DEFAULT_MAX_RESULTS))
        .store(request.store);
    let report = runtime.ingestion_service.run(&ingest).await?;

    if report.raw.is_empty() {
        return Ok(Json(json!({
            "message": "No patents found",
            "user_idea": user_idea,
            "patents": [],
        })));
    }

    let patents: Vec<PatentSummary> = report
        .batch
        .patents
        .iter()
        .map(PatentSummary::from)
        .collect();
    Ok(Json(json!({
        "user_idea": user_idea,
        "patents_found": patents.len(),
        "patents_stored": report.patents_stored(),
        "patents": patents,
    })))
}

async fn stats(State(runtime): State<AppState>) -> Result<Json<DatabaseStats>, ApiError> {
    Ok(Json(runtime.patent_service.database_stats().await?))
}

#[derive(Debug, Deserialize)]
struct PageRankParams {
    #[serde(default = "default_rank_limit")]
    limit: usize,
}

fn default_rank_limit() -> usize {
    10
}

async fn page_rank(
    State(runtime): State<AppState>,
    Params(params): Params<PageRankParams>,
) -> Result<Json<Vec<RankedPatent>>, ApiError> {
    Ok(Json(runtime.graph_service.page_rank(params.limit).await?))
}

#[derive(Debug, Deserialize)]
struct CommunityParams {
    #[serde(default = "default_min_size")]
    min_size: usize,
}

fn default_min_size() -> usize {
    2
}

async fn communities(
    State(runtime): State<AppState>,
    Params(params): Params<CommunityParams>,
) -> Result<Json<Vec<Community>>, ApiError> {
    Ok(Json(
        runtime.graph_service.communities(params.min_size).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct PathParams {
    from: Option<String>,
    to: Option<String>,
}

async fn citation_path(
    State(runtime): State<AppState>,
    Params(params): Params<PathParams>,
) -> Result<Json<Value>, ApiError> {
    let (Some(from), Some(to)) = (params.from, params.to) else {
        return Err(ApiError::BadRequest(
            "from and to are required".to_string(),
        ));
    };

    match runtime.graph_service.shortest_path(&from, &to).await? {
        Some(path) => Ok(Json(json!({
            "from": from,
            "to": to,
            "hops": path.len().saturating_sub(1),
            "path": path,
        }))),
        None => Err(ApiError::NotFound(format!(
            "No citation path between {from} and {to}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use discovery::config::AppConfiguration;
    use discovery::ApplicationRuntimeBuilder;
    use mockito::Server;
    use patentsview::{Credentials, PatentsView};
    use tower::ServiceExt;

    const PATENT_ENDPOINT: &str = "/api/v1/patent/";

    async fn app(host: &str) -> Router {
        let client = PatentsView::new(host, Credentials::ApiKey("test-key".into())).unwrap();
        let runtime = ApplicationRuntimeBuilder::new()
            .with_config(AppConfiguration::default())
            .use_in_memory_db()
            .with_patentsview_client(client)
            .build()
            .await
            .unwrap();
        router(Arc::new(runtime))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_search(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn patents_page() -> String {
        json!({
            "patents": [
                {
                    "patent_number": "10000001",
                    "patent_title": "Solar battery cell",
                    "patent_abstract": "A cell.",
                    "patent_date": "2019-04-02",
                    "assignees": [{"assignee_organization": "Example Corp"}],
                    "claims": [{"claim_number": 1, "claim_text": "A cell."}]
                },
                {
                    "patent_number": "10000002",
                    "patent_title": "Battery pack charger",
                    "patent_date": "2021-08-17",
                    "cited_patents": [{"cited_patent_number": "10000001"}]
                }
            ],
            "count": 2,
            "total_hits": 2,
            "total_pages": 1
        })
        .to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let server = Server::new_async().await;
        let (status, body) = send(&app(&server.url()).await, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn search_requires_an_idea() {
        let server = Server::new_async().await;
        let app = app(&server.url()).await;

        for body in ["not json", "{}", r#"{"user_idea": "   "}"#] {
            let (status, reply) = send(&app, post_search(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(reply, json!({"error": "user_idea is required"}));
        }
    }

    #[tokio::test]
    async fn search_stores_and_lists() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", PATENT_ENDPOINT)
            .with_status(200)
            .with_body(patents_page())
            .expect(1)
            .create_async()
            .await;
        let app = app(&server.url()).await;

        let (status, body) = send(
            &app,
            post_search(r#"{"user_idea": "solar powered battery charger", "store": true}"#),
        )
        .await;
        m.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patents_found"], 2);
        assert_eq!(body["patents_stored"], 2);
        assert_eq!(body["patents"][0]["patent_number"], "10000001");

        let (status, listed) = send(&app, get("/api/patents?search=charger")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["patent_number"], "10000002");

        let (status, detail) = send(&app, get("/api/patents/10000002")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["cited_patents"], json!(["10000001"]));

        let (_, stats) = send(&app, get("/api/stats")).await;
        assert_eq!(stats["total_patents"], 2);
        assert_eq!(stats["total_citations"], 1);

        let (status, path) = send(&app, get("/api/graph/path?from=10000002&to=10000001")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(path["path"], json!(["10000002", "10000001"]));
        assert_eq!(path["hops"], 1);

        let (_, ranked) = send(&app, get("/api/graph/pagerank?limit=1")).await;
        assert_eq!(ranked[0]["patent_number"], "10000001");
    }

    #[tokio::test]
    async fn search_without_results() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", PATENT_ENDPOINT)
            .with_status(200)
            .with_body(r#"{"patents": [], "count": 0, "total_hits": 0, "total_pages": 0}"#)
            .create_async()
            .await;

        let (status, body) = send(
            &app(&server.url()).await,
            post_search(r#"{"user_idea": "quantum teapot"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "No patents found", "user_idea": "quantum teapot", "patents": []})
        );
    }

    #[tokio::test]
    async fn unknown_patent_and_path_are_not_found() {
        let server = Server::new_async().await;
        let app = app(&server.url()).await;

        let (status, body) = send(&app, get("/api/patents/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Patent not found"}));

        let (status, _) = send(&app, get("/api/graph/path?from=1&to=2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/api/graph/path?from=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_parameters_are_json_errors() {
        let server = Server::new_async().await;
        let app = app(&server.url()).await;

        for uri in [
            "/api/graph/pagerank?limit=abc",
            "/api/graph/pagerank?limit=-1",
            "/api/graph/communities?min_size=two",
        ] {
            let (status, body) = send(&app, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "uri: {uri}");
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_internal_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", PATENT_ENDPOINT)
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let (status, body) = send(
            &app(&server.url()).await,
            post_search(r#"{"user_idea": "solar powered battery charger"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().is_some());
    }
}
