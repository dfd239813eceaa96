use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes a root or delegated routing configuration served by Contour.
///
/// Only the fields that determine which virtual host a proxy claims, and
/// under which ingress class, are modeled. Routes, includes and the TCP proxy
/// are ignored when decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "projectcontour.io",
    version = "v1",
    kind = "HTTPProxy",
    root = "HttpProxy",
    plural = "httpproxies",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct HttpProxySpec {
    /// Only set on root proxies.
    #[serde(rename = "virtualhost", default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<VirtualHost>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct VirtualHost {
    pub fqdn: String,
}

// === impl HttpProxy ===

impl HttpProxy {
    /// The fully-qualified hostname claimed by this proxy, if it is a root
    /// proxy.
    pub fn fqdn(&self) -> Option<&str> {
        self.spec.virtual_host.as_ref().map(|vh| vh.fqdn.as_str())
    }

    pub fn ingress_class_name(&self) -> &str {
        self.spec.ingress_class_name.as_deref().unwrap_or_default()
    }
}

// === impl HttpProxySpec ===

impl HttpProxySpec {
    pub fn root(fqdn: impl Into<String>) -> Self {
        Self {
            virtual_host: Some(VirtualHost { fqdn: fqdn.into() }),
            ingress_class_name: None,
        }
    }

    pub fn with_ingress_class_name(mut self, class: impl Into<String>) -> Self {
        self.ingress_class_name = Some(class.into());
        self
    }
}
