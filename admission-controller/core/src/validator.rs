use crate::{
    k8s::{HttpProxy, ResourceExt},
    IngressClasses, Store,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// The reason given when the store cannot be listed.
pub const LIST_FAILED_REASON: &str = "could not list resources in cluster";

/// Detects `HTTPProxy` resources that claim a virtual host already claimed by
/// another proxy in one of the targeted ingress classes.
#[derive(Clone)]
pub struct Validator {
    store: Arc<dyn Store>,
    classes: IngressClasses,
}

/// The outcome of validating a single proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    /// Empty iff `valid`.
    pub reason: String,
}

/// The store could not be listed, so the proxy could not be checked.
///
/// Callers should still reject the proxy; [`Error::verdict`] describes the
/// rejection.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    List(#[from] anyhow::Error),
}

// === impl Validator ===

impl Validator {
    pub fn new(store: Arc<dyn Store>, classes: IngressClasses) -> Self {
        Self { store, classes }
    }

    /// Validates `proxy` against all proxies currently in the store.
    ///
    /// Proxies outside of the targeted ingress classes are always valid and
    /// do not cause the store to be listed.
    pub async fn validate(&self, proxy: &HttpProxy) -> Result<Verdict, Error> {
        if !self.classes.matches(proxy) {
            debug!(name = %proxy.name_any(), "Proxy is not in a targeted ingress class");
            return Ok(Verdict::valid());
        }

        let proxies = self.store.list_http_proxies().await?;
        let conflicts = self.conflicts(proxy, &proxies);
        if conflicts.is_empty() {
            return Ok(Verdict::valid());
        }

        let name = proxy.metadata.name.as_deref().unwrap_or_default();
        info!(name, ?conflicts, "Virtual host conflict");
        Ok(Verdict::invalid(format!(
            "{name} is in conflict with [{}]",
            conflicts.join(" ")
        )))
    }

    /// Returns the names of targeted proxies in `proxies` that claim the same
    /// virtual host as `proxy`, in enumeration order.
    ///
    /// FQDNs are compared verbatim: no case folding or trailing-dot handling.
    /// Proxies without a virtual host never conflict, and the stored revision
    /// of `proxy` itself is skipped so that updates do not conflict with
    /// themselves.
    fn conflicts<'p>(&self, proxy: &HttpProxy, proxies: &'p [HttpProxy]) -> Vec<&'p str> {
        let Some(fqdn) = proxy.fqdn() else {
            return Vec::new();
        };

        // TODO: Validate delegated proxies against the roots that include
        // them.
        proxies
            .iter()
            .filter(|p| !is_same_resource(p, proxy))
            .filter(|p| p.fqdn() == Some(fqdn) && self.classes.matches(p))
            .map(|p| p.metadata.name.as_deref().unwrap_or_default())
            .collect()
    }
}

fn is_same_resource(a: &HttpProxy, b: &HttpProxy) -> bool {
    a.metadata.name.is_some()
        && a.metadata.name == b.metadata.name
        && a.namespace() == b.namespace()
}

// === impl Verdict ===

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: String::new(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

// === impl Error ===

impl Error {
    /// The conservative rejection issued when the proxy could not be checked.
    pub fn verdict(&self) -> Verdict {
        Verdict::invalid(LIST_FAILED_REASON)
    }
}
