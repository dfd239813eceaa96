use crate::{
    codec::{Codec, RawRequest},
    core::Validator,
    k8s::{GroupVersionKind, HttpProxy, Resource, ResourceExt},
    metrics::{AdmissionMetrics, Outcome},
};
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use kube::core::{admission::AdmissionResponse, Status};
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// The only path on which admission reviews are accepted.
pub const ADMISSION_PATH: &str = "/validate";

const BAD_REQUEST: &str = "BadRequest";
const INTERNAL_ERROR: &str = "InternalError";

/// Serves `HTTPProxy` admission reviews.
#[derive(Clone)]
pub struct Admission {
    validator: Validator,
    codec: Codec,
    metrics: AdmissionMetrics,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(#[source] BoxError),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Body = http_body_util::Full<bytes::Bytes>;

// === impl Admission ===

impl<B> tower::Service<Request<B>> for Admission
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Infallible>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        trace!(method = %req.method(), uri = %req.uri());
        if req.method() != http::Method::POST || req.uri().path() != ADMISSION_PATH {
            return Box::pin(future::ok(empty_response(http::StatusCode::NOT_FOUND)));
        }

        let admission = self.clone();
        Box::pin(async move {
            let bytes = match req.into_body().collect().await {
                Ok(body) => body.to_bytes(),
                Err(error) => {
                    let error = Error::Request(error.into());
                    warn!(%error, "Failed to read request body");
                    admission.metrics.observe(Outcome::Invalid);
                    return Ok(empty_response(http::StatusCode::BAD_REQUEST));
                }
            };
            Ok(admission.review(&bytes).await)
        })
    }
}

impl Admission {
    pub fn new(validator: Validator, codec: Codec, metrics: AdmissionMetrics) -> Self {
        Self {
            validator,
            codec,
            metrics,
        }
    }

    async fn review(self, bytes: &[u8]) -> Response<Body> {
        let req = match self.codec.decode_request(bytes) {
            Ok(req) => req,
            Err(error) => {
                warn!(%error, "Invalid admission request");
                self.metrics.observe(Outcome::Invalid);
                return empty_response(http::StatusCode::BAD_REQUEST);
            }
        };
        debug!(?req);

        let (outcome, rsp) = self.admit(req).await;
        self.metrics.observe(outcome);
        debug!(?rsp);

        match self.codec.encode_review(&rsp.into_review()) {
            Ok(body) => json_response(body),
            Err(error) => {
                let error = Error::from(error);
                error!(%error, "Failed to encode admission response");
                Response::builder()
                    .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from(error.to_string()))
                    .expect("error response must be valid")
            }
        }
    }

    async fn admit(&self, raw: RawRequest) -> (Outcome, AdmissionResponse) {
        let RawRequest {
            request: req,
            object,
        } = raw;
        let rsp = AdmissionResponse::from(&req);

        if req.kind != httpproxy_kind() {
            let message = format!(
                "Review is not for HTTPProxy resource. Instead got {} with name {}",
                format_kind(&req.kind),
                req.name
            );
            info!(uid = %req.uid, %message, "Denied");
            return (Outcome::Denied, deny(rsp, BAD_REQUEST, message));
        }

        let proxy = match self.codec.decode_proxy(object) {
            Ok(proxy) => proxy,
            Err(error) => {
                warn!(uid = %req.uid, %error, "Failed to decode HTTPProxy");
                return (Outcome::Error, deny(rsp, INTERNAL_ERROR, error));
            }
        };

        match self.validator.validate(&proxy).await {
            Ok(verdict) if verdict.valid => (Outcome::Allowed, rsp),
            Ok(verdict) => {
                info!(
                    uid = %req.uid,
                    name = %proxy.name_any(),
                    reason = %verdict.reason,
                    "Denied"
                );
                (Outcome::Denied, deny(rsp, BAD_REQUEST, verdict.reason))
            }
            Err(error) => {
                error!(
                    uid = %req.uid,
                    %error,
                    reason = %error.verdict().reason,
                    "Failed to validate HTTPProxy"
                );
                (Outcome::Error, deny(rsp, INTERNAL_ERROR, error))
            }
        }
    }
}

fn httpproxy_kind() -> GroupVersionKind {
    GroupVersionKind::gvk(
        &HttpProxy::group(&()),
        &HttpProxy::version(&()),
        &HttpProxy::kind(&()),
    )
}

fn format_kind(gvk: &GroupVersionKind) -> String {
    format!("{}/{}, Kind={}", gvk.group, gvk.version, gvk.kind)
}

fn deny(mut rsp: AdmissionResponse, reason: &str, message: impl ToString) -> AdmissionResponse {
    let code = if reason == BAD_REQUEST {
        http::StatusCode::BAD_REQUEST
    } else {
        http::StatusCode::INTERNAL_SERVER_ERROR
    };
    rsp.allowed = false;
    rsp.result = Status::failure(&message.to_string(), reason).with_code(code.as_u16());
    rsp
}

fn json_response(body: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("admission review response must be valid")
}

fn empty_response(status: http::StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::default())
        .expect("empty response must be valid")
}
