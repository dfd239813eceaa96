use crate::k8s::HttpProxy;

/// Lists the `HTTPProxy` resources currently admitted to the cluster.
///
/// Implementations are responsible for their own consistency; the validator
/// calls `list_http_proxies` exactly once per validation and never retries.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn list_http_proxies(&self) -> anyhow::Result<Vec<HttpProxy>>;
}
