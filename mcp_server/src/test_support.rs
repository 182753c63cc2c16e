use std::sync::Arc;

use discovery::config::AppConfiguration;
use discovery::ApplicationRuntimeBuilder;
use patentsview::{Credentials, PatentsView};

use crate::handler::McpHandler;

/// A handler over an in-memory store, talking to PatentsView at `host`
pub(crate) async fn handler(host: &str) -> McpHandler {
    let client = PatentsView::new(host, Credentials::ApiKey("test-key".into())).unwrap();
    let runtime = ApplicationRuntimeBuilder::new()
        .with_config(AppConfiguration::default())
        .use_in_memory_db()
        .with_patentsview_client(client)
        .build()
        .await
        .unwrap();
    McpHandler::new(Arc::new(runtime))
}
