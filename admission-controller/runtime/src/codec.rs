use crate::k8s::{DynamicObject, HttpProxy};
use kube::core::admission;
use thiserror::Error;

pub type Review = admission::AdmissionReview<DynamicObject>;
pub type AdmissionRequest = admission::AdmissionRequest<DynamicObject>;

/// Encodes and decodes admission reviews as JSON.
///
/// Constructed once at startup and shared by every admission request.
#[derive(Copy, Clone, Debug, Default)]
pub struct Codec {
    pretty: bool,
}

/// An admission request whose object has not yet been decoded.
///
/// `request.object` and `request.old_object` are always `None`; the object
/// under review is kept as raw JSON so that it can be decoded separately from
/// the envelope.
#[derive(Debug)]
pub struct RawRequest {
    pub request: AdmissionRequest,
    pub object: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to parse admission review: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("admission review missing 'request'")]
    MissingRequest,

    #[error("admission request missing 'object'")]
    MissingObject,

    #[error("failed to decode HTTPProxy: {0}")]
    Object(#[source] serde_json::Error),
}

// === impl Codec ===

impl Codec {
    /// Returns a codec that pretty-prints encoded reviews.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Decodes the request carried by a serialized `AdmissionReview`.
    ///
    /// Only the envelope must be well formed. The embedded objects are
    /// detached before the envelope is decoded.
    pub fn decode_request(&self, bytes: &[u8]) -> Result<RawRequest, DecodeError> {
        let mut review =
            serde_json::from_slice::<serde_json::Value>(bytes).map_err(DecodeError::Envelope)?;
        let object = match review.get_mut("request").and_then(|r| r.as_object_mut()) {
            Some(request) => {
                request.remove("oldObject");
                request.remove("object").filter(|o| !o.is_null())
            }
            None => None,
        };

        let review = serde_json::from_value::<Review>(review).map_err(DecodeError::Envelope)?;
        let request = review
            .try_into()
            .map_err(|_| DecodeError::MissingRequest)?;
        Ok(RawRequest { request, object })
    }

    /// Decodes the object under review as an `HTTPProxy`.
    pub fn decode_proxy(
        &self,
        object: Option<serde_json::Value>,
    ) -> Result<HttpProxy, DecodeError> {
        let object = object.ok_or(DecodeError::MissingObject)?;
        serde_json::from_value(object).map_err(DecodeError::Object)
    }

    pub fn encode_review(&self, review: &Review) -> serde_json::Result<Vec<u8>> {
        if self.pretty {
            serde_json::to_vec_pretty(review)
        } else {
            serde_json::to_vec(review)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::{admission::AdmissionResponse, Status};
    use pretty_assertions::assert_eq;

    fn review_json(kind: serde_json::Value, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": kind,
                "resource": {
                    "group": "projectcontour.io",
                    "version": "v1",
                    "resource": "httpproxies",
                },
                "name": "proxy-new",
                "namespace": "default",
                "operation": "CREATE",
                "userInfo": { "username": "admin" },
                "object": object,
            },
        }))
        .unwrap()
    }

    fn httpproxy_kind() -> serde_json::Value {
        serde_json::json!({ "group": "projectcontour.io", "version": "v1", "kind": "HTTPProxy" })
    }

    #[test]
    fn decodes_request_and_proxy() {
        let bytes = review_json(
            httpproxy_kind(),
            serde_json::json!({
                "metadata": { "name": "proxy-new" },
                "spec": {
                    "virtualhost": { "fqdn": "foo.bar.com" },
                    "ingressClassName": "targetted",
                },
                "status": { "loadBalancer": {} },
            }),
        );

        let codec = Codec::default();
        let RawRequest { request, object } =
            codec.decode_request(&bytes).expect("review must decode");
        assert_eq!(request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(request.kind.kind, "HTTPProxy");
        assert_eq!(request.name, "proxy-new");
        assert!(request.object.is_none());

        let proxy = codec.decode_proxy(object).expect("proxy must decode");
        assert_eq!(proxy.fqdn(), Some("foo.bar.com"));
        assert_eq!(proxy.ingress_class_name(), "targetted");
    }

    #[test]
    fn rejects_malformed_envelopes() {
        let codec = Codec::default();
        assert!(matches!(
            codec.decode_request(b"garbage request body"),
            Err(DecodeError::Envelope(_))
        ));
        assert!(matches!(
            codec.decode_request(br#"{"apiVersion":"admission.k8s.io/v1","kind":"AdmissionReview"}"#),
            Err(DecodeError::MissingRequest)
        ));
    }

    #[test]
    fn rejects_objects_that_are_not_proxies() {
        let codec = Codec::default();
        for object in [
            serde_json::json!({
                "metadata": { "name": "proxy-new" },
                "spec": { "virtualhost": "foo.bar.com" },
            }),
            serde_json::json!({ "metadata": "x", "spec": {} }),
            serde_json::json!("notanobject"),
            serde_json::json!([1, 2]),
        ] {
            let bytes = review_json(httpproxy_kind(), object.clone());
            let req = codec
                .decode_request(&bytes)
                .expect("envelope must decode regardless of the object");
            assert_eq!(req.object.as_ref(), Some(&object));
            assert!(
                matches!(codec.decode_proxy(req.object), Err(DecodeError::Object(_))),
                "{object}"
            );
        }

        let bytes = review_json(httpproxy_kind(), serde_json::Value::Null);
        let req = codec.decode_request(&bytes).expect("review must decode");
        assert!(matches!(
            codec.decode_proxy(req.object),
            Err(DecodeError::MissingObject)
        ));
    }

    #[test]
    fn response_round_trip() {
        let bytes = review_json(httpproxy_kind(), serde_json::json!({ "metadata": {} }));
        let codec = Codec::pretty();
        let req = codec.decode_request(&bytes).expect("review must decode");

        let mut rsp = AdmissionResponse::from(&req.request);
        rsp.allowed = false;
        rsp.result = Status::failure("proxy-new is in conflict with [proxy1]", "BadRequest")
            .with_code(400);

        let encoded = codec
            .encode_review(&rsp.clone().into_review())
            .expect("review must encode");
        let decoded = serde_json::from_slice::<Review>(&encoded).expect("review must decode");
        assert_eq!(decoded.types.kind, "AdmissionReview");
        assert!(decoded.request.is_none());
        let decoded = decoded.response.expect("review must carry a response");
        assert_eq!(decoded.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert!(!decoded.allowed);
        assert_eq!(decoded.result, rsp.result);
    }
}
