#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ingress_class;
mod store;
pub mod validator;


pub use self::{
    ingress_class::{effective_class, IngressClasses},
    store::Store,
    validator::{Validator, Verdict},
};
pub use httpproxy_admission_k8s_api as k8s;
