//! Chart of accounts handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{GroupId, LedgerId};
use domain_ledger::{AccountStatement, Group, Ledger, OpeningBalance};

use crate::dto::chart::*;
use crate::dto::WindowQuery;
use crate::{error::ApiError, AppState};

/// Lists groups in insertion order
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(state.service.chart().list_groups().await?))
}

/// Creates a root or child group
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    request.validate()?;
    let chart = state.service.chart();

    let group = match request.parent_id {
        Some(parent_id) => {
            let parent = chart.get_group(GroupId::from_uuid(parent_id)).await?;
            let child = Group::child(request.name, &parent);
            match request.nature {
                Some(nature) => child.with_nature(nature),
                None => child,
            }
        }
        None => {
            let nature = request.nature.ok_or_else(|| {
                ApiError::Validation("a root group needs a nature".to_string(), None)
            })?;
            Group::root(request.name, nature)
        }
    };

    let created = chart.insert_group(group).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Re-parents a group, rejecting cycles
pub async fn move_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MoveGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let moved = state
        .service
        .chart()
        .move_group(GroupId::from_uuid(id), request.parent_id.map(GroupId::from_uuid))
        .await?;
    Ok(Json(moved))
}

pub async fn list_ledgers(State(state): State<AppState>) -> Result<Json<Vec<Ledger>>, ApiError> {
    Ok(Json(state.service.chart().list_ledgers().await?))
}

/// Creates a ledger under an existing group
pub async fn create_ledger(
    State(state): State<AppState>,
    Json(request): Json<CreateLedgerRequest>,
) -> Result<(StatusCode, Json<Ledger>), ApiError> {
    request.validate()?;
    let chart = state.service.chart();
    let group = chart.get_group(GroupId::from_uuid(request.group_id)).await?;

    let mut ledger = Ledger::new(request.name, &group, request.ledger_type);
    if let Some(opening) = request.opening_balance {
        ledger = ledger.with_opening(OpeningBalance::new(opening.amount, opening.side, opening.as_of)?);
    }
    if !request.is_posting {
        ledger = ledger.non_posting();
    }

    let created = chart.insert_ledger(ledger).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ledger>, ApiError> {
    Ok(Json(state.service.chart().get_ledger(LedgerId::from_uuid(id)).await?))
}

/// Opening, lines with running balance, and closing for one ledger
pub async fn ledger_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AccountStatement>, ApiError> {
    let statement = state
        .service
        .account_statement(LedgerId::from_uuid(id), query.window()?)
        .await?;
    Ok(Json(statement))
}
