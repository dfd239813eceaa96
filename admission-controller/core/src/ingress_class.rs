//! Resolves which ingress class an `HTTPProxy` belongs to and whether that
//! class is served by this admission controller.

use crate::k8s::{HttpProxy, ResourceExt};
use std::{collections::BTreeSet, convert::Infallible, fmt, str::FromStr};

/// The class Contour serves when it is not configured with explicit classes.
pub const DEFAULT_INGRESS_CLASS: &str = "contour";

/// Legacy annotation that overrides `spec.ingressClassName` when set.
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// The set of ingress classes targeted by this controller.
///
/// An empty set targets proxies without a class and proxies in the
/// [`DEFAULT_INGRESS_CLASS`], mirroring Contour's own behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngressClasses(BTreeSet<String>);

/// Returns the effective ingress class of `proxy`.
///
/// A non-empty `kubernetes.io/ingress.class` annotation takes precedence over
/// `spec.ingressClassName`, which may be empty.
pub fn effective_class(proxy: &HttpProxy) -> &str {
    match proxy.annotations().get(INGRESS_CLASS_ANNOTATION) {
        Some(class) if !class.is_empty() => class.as_str(),
        _ => proxy.ingress_class_name(),
    }
}

// === impl IngressClasses ===

impl IngressClasses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if a proxy of the given class is subject to validation.
    pub fn targets(&self, class: &str) -> bool {
        if self.0.is_empty() {
            return class.is_empty() || class == DEFAULT_INGRESS_CLASS;
        }

        self.0.contains(class)
    }

    /// Returns true if `proxy`'s effective class is targeted.
    pub fn matches(&self, proxy: &HttpProxy) -> bool {
        self.targets(effective_class(proxy))
    }
}

impl<S: Into<String>> FromIterator<S> for IngressClasses {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Parses a comma-separated list of class names. Blank entries are dropped so
/// that an empty list selects the default classes.
impl FromStr for IngressClasses {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .collect())
    }
}

impl fmt::Display for IngressClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes = self.0.iter();
        if let Some(first) = classes.next() {
            f.write_str(first)?;
        }
        for class in classes {
            write!(f, ",{class}")?;
        }
        Ok(())
    }
}
