use crate::{
    core::Store,
    k8s::{Api, Client, HttpProxy, ListParams},
};
use anyhow::Result;
use tracing::{debug, error};

/// Lists `HTTPProxy` resources from the cluster API on every call.
#[derive(Clone)]
pub struct ClusterStore {
    client: Client,
}

impl ClusterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Store for ClusterStore {
    async fn list_http_proxies(&self) -> Result<Vec<HttpProxy>> {
        let api = Api::<HttpProxy>::all(self.client.clone());
        match api.list(&ListParams::default()).await {
            Ok(list) => {
                debug!(proxies = list.items.len(), "Listed HTTPProxies");
                Ok(list.items)
            }
            Err(error) => {
                error!(%error, "Failed to list HTTPProxies");
                Err(error.into())
            }
        }
    }
}
