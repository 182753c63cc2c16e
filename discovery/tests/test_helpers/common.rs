use discovery::config::AppConfiguration;
use discovery::error::DiscoveryError;
use discovery::{ApplicationRuntime, ApplicationRuntimeBuilder};
use patentsview::{Credentials, PatentsView};

/// A runtime with an in-memory store, talking to PatentsView at `host`
pub async fn create_test_runtime(host: &str) -> Result<ApplicationRuntime, DiscoveryError> {
    let client = PatentsView::new(host, Credentials::ApiKey("test-key".to_string()))?;

    ApplicationRuntimeBuilder::new()
        .with_config(AppConfiguration::default())
        .use_in_memory_db()
        .with_patentsview_client(client)
        .build()
        .await
}
