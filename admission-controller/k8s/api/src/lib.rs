#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod httpproxy;

pub use self::httpproxy::{HttpProxy, HttpProxySpec, VirtualHost};
pub use kube::{
    api::{Api, ListParams},
    core::{DynamicObject, GroupVersionKind},
    Client, Resource, ResourceExt,
};
