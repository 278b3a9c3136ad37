//! Voucher handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::VoucherId;
use domain_ledger::Voucher;

use crate::dto::voucher::*;
use crate::dto::WindowQuery;
use crate::{error::ApiError, AppState};

/// Validates and posts a voucher
pub async fn post_voucher(
    State(state): State<AppState>,
    Json(request): Json<PostVoucherRequest>,
) -> Result<(StatusCode, Json<Voucher>), ApiError> {
    request.validate()?;
    let voucher = state.service.post_voucher(request.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

/// Lists vouchers by date, then posting order
pub async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<Voucher>>, ApiError> {
    Ok(Json(state.service.list_vouchers(query.window()?).await?))
}

pub async fn get_voucher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Voucher>, ApiError> {
    Ok(Json(state.service.get_voucher(VoucherId::from_uuid(id)).await?))
}

/// Replaces a voucher's date, narration, and entries
pub async fn replace_voucher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PostVoucherRequest>,
) -> Result<Json<Voucher>, ApiError> {
    request.validate()?;
    let voucher = state
        .service
        .replace_voucher(VoucherId::from_uuid(id), request.into_draft()?)
        .await?;
    Ok(Json(voucher))
}

pub async fn delete_voucher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_voucher(VoucherId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Posts the mirror image of a voucher
pub async fn reverse_voucher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReverseVoucherRequest>,
) -> Result<(StatusCode, Json<Voucher>), ApiError> {
    request.validate()?;
    let reversal = state
        .service
        .reverse_voucher(VoucherId::from_uuid(id), request.date, &request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(reversal)))
}
