use crate::{
    admission::Admission,
    codec::Codec,
    core::{IngressClasses, Validator},
    metrics::AdmissionMetrics,
    store::ClusterStore,
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "httpproxy-admission",
    about = "Rejects HTTPProxy resources that claim an already claimed virtual host"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "httpproxy_admission=info,warn",
        env = "HTTPPROXY_ADMISSION_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    server: kubert::ServerArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Disables the admission controller server.
    #[clap(long)]
    admission_controller_disabled: bool,

    /// Comma-separated ingress classes to validate.
    ///
    /// When unset, proxies without a class and proxies in the `contour` class
    /// are validated.
    #[clap(long, env = "HTTPPROXY_ADMISSION_INGRESS_CLASSES")]
    ingress_classes: Option<IngressClasses>,

    /// Pretty-prints admission responses.
    #[clap(long)]
    pretty_json: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            server,
            admission_controller_disabled,
            ingress_classes,
            pretty_json,
        } = self;

        let server = if admission_controller_disabled {
            None
        } else {
            Some(server)
        };

        let mut prom = <Registry>::default();
        let metrics = AdmissionMetrics::register(prom.sub_registry_with_prefix("admission"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .with_optional_server(server)
            .build()
            .await?;

        let classes = ingress_classes.unwrap_or_default();
        if classes.is_empty() {
            info!("Validating proxies in the default ingress class");
        } else {
            info!(%classes, "Validating proxies in configured ingress classes");
        }

        let store = ClusterStore::new(runtime.client());
        let validator = Validator::new(Arc::new(store), classes);
        let codec = if pretty_json {
            Codec::pretty()
        } else {
            Codec::default()
        };
        let runtime = runtime.spawn_server(move || Admission::new(validator, codec, metrics));

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_ingress_classes() {
        let args = Args::try_parse_from([
            "httpproxy-admission",
            "--ingress-classes",
            "targetted, other-targetted,,",
            "--pretty-json",
        ])
        .expect("args must parse");
        assert_eq!(
            args.ingress_classes,
            Some(
                ["targetted", "other-targetted"]
                    .into_iter()
                    .collect::<IngressClasses>()
            )
        );
        assert!(args.pretty_json);
        assert!(!args.admission_controller_disabled);
    }

    #[test]
    fn ingress_classes_default_to_unset() {
        let args = Args::try_parse_from(["httpproxy-admission"]).expect("args must parse");
        assert!(args.ingress_classes.unwrap_or_default().is_empty());
        assert!(!args.pretty_json);
    }
}
