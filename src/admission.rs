//! Admission review adapter
//!
//! Turns a pod `AdmissionRequest` into an `AdmissionResponse` carrying the
//! mutation patch. The HTTP/TLS server that receives the review and writes
//! the response back lives outside this crate.

use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use tracing::{debug, error, info, warn};

use crate::Mutator;

/// Process a single pod mutation request
///
/// - No object in the request (e.g. DELETE): allowed unchanged
/// - Mutation failure: denied with the error message
/// - Otherwise: allowed, with the JSON Patch attached when non-empty
pub fn mutate_request(mutator: &Mutator, request: &AdmissionRequest<Pod>) -> AdmissionResponse {
    let uid = &request.uid;

    let pod = match &request.object {
        Some(pod) => pod,
        None => {
            debug!(uid = %uid, "No pod object in request, allowing unchanged");
            return AdmissionResponse::from(request);
        }
    };

    let patch = match mutator.patch(pod) {
        Ok(patch) => patch,
        Err(e) => {
            warn!(
                uid = %uid,
                pod = ?pod.metadata.name,
                namespace = ?request.namespace,
                error = %e,
                "Pod mutation failed, denying"
            );
            return AdmissionResponse::from(request).deny(e.to_string());
        }
    };

    if patch.0.is_empty() {
        debug!(uid = %uid, pod = ?pod.metadata.name, "Nothing to mutate, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    info!(
        uid = %uid,
        pod = ?pod.metadata.name,
        namespace = ?request.namespace,
        patch_ops = patch.0.len(),
        "Applying patch to pod"
    );

    match AdmissionResponse::from(request).with_patch(patch) {
        Ok(response) => response,
        Err(e) => {
            error!(uid = %uid, error = %e, "Failed to serialize patch");
            AdmissionResponse::from(request).deny(format!("patch serialization error: {e}"))
        }
    }
}

/// Answer a full `AdmissionReview`, rejecting reviews that carry no request
pub fn review_response(
    mutator: &Mutator,
    review: AdmissionReview<Pod>,
) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<Pod> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    mutate_request(mutator, &request).into_review()
}
