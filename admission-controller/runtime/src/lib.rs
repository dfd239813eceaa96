#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use httpproxy_admission_core as core;
pub use httpproxy_admission_k8s_api as k8s;

mod admission;
mod args;
mod codec;
mod metrics;
mod store;

pub use self::{
    admission::Admission, args::Args, codec::Codec, metrics::AdmissionMetrics, store::ClusterStore,
};
