//! Request handlers

pub mod chart;
pub mod health;
pub mod party;
pub mod report;
pub mod voucher;

use axum::http::HeaderMap;
use core_kernel::OperationMetadata;

/// Port metadata carrying the request id as correlation id
pub(crate) fn request_metadata(headers: &HeaderMap) -> Option<OperationMetadata> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(OperationMetadata::with_correlation_id)
}
