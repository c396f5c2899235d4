use async_trait::async_trait;
use blockcerts_explorer_lookup::{ExplorerError, JsonFetcher};
use serde_json::Value;

mockall::mock! {
    pub Fetcher {}

    #[async_trait]
    impl JsonFetcher for Fetcher {
        async fn get_json(&self, url: &str) -> Result<Value, ExplorerError>;
    }
}
