//! Party handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::PartyId;
use domain_party::{Party, PartyPortExt};

use crate::dto::party::*;
use crate::handlers::request_metadata;
use crate::{error::ApiError, AppState};

/// Creates a party; its ledger is created on first resolve
pub async fn create_party(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<Party>), ApiError> {
    request.validate()?;
    let party = state
        .parties
        .create_party(request.into_party(), request_metadata(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(party)))
}

pub async fn list_parties(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListPartiesQuery>,
) -> Result<Json<Vec<Party>>, ApiError> {
    let parties = state
        .parties
        .list_parties(query.active_only, request_metadata(&headers))
        .await?;
    Ok(Json(parties))
}

pub async fn get_party(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Party>, ApiError> {
    let party = state
        .parties
        .get_party(PartyId::from_uuid(id), request_metadata(&headers))
        .await?;
    Ok(Json(party))
}

/// Finds or creates the party's ledger and binds it
pub async fn resolve_party_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<PartyLedgerResponse>, ApiError> {
    let party_id = PartyId::from_uuid(id);
    let ledger = state.binder.resolve_ledger_for(party_id).await?;
    let party = state
        .parties
        .get_party(party_id, request_metadata(&headers))
        .await?;
    Ok(Json(PartyLedgerResponse { party, ledger }))
}
