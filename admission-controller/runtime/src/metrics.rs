use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counts admission reviews by outcome.
#[derive(Clone, Debug, Default)]
pub struct AdmissionMetrics {
    reviews: Family<ResultLabels, Counter>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The proxy was admitted.
    Allowed,
    /// The proxy was rejected by policy.
    Denied,
    /// The proxy could not be checked.
    Error,
    /// The request could not be read as an admission review.
    Invalid,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct ResultLabels {
    result: &'static str,
}

// === impl AdmissionMetrics ===

impl AdmissionMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reviews = Family::<ResultLabels, Counter>::default();
        reg.register(
            "reviews",
            "Total number of admission reviews handled",
            reviews.clone(),
        );
        Self { reviews }
    }

    pub(crate) fn observe(&self, outcome: Outcome) {
        self.reviews
            .get_or_create(&ResultLabels {
                result: outcome.as_str(),
            })
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn count(&self, outcome: Outcome) -> u64 {
        self.reviews
            .get_or_create(&ResultLabels {
                result: outcome.as_str(),
            })
            .get()
    }
}

// === impl Outcome ===

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
            Self::Error => "error",
            Self::Invalid => "invalid",
        }
    }
}
