//! Report handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use core_kernel::GroupId;
use domain_ledger::{
    BalanceSheetSummary, GroupBalanceNode, ProfitAndLossReport, ReceivablesPayablesReport,
    TrialBalanceReport,
};

use crate::dto::report::{BalanceQuery, BalancesResponse};
use crate::dto::{AsOfQuery, WindowQuery};
use crate::{error::ApiError, AppState};

pub async fn trial_balance(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<TrialBalanceReport>, ApiError> {
    Ok(Json(state.service.trial_balance(query.as_of).await?))
}

pub async fn profit_and_loss(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ProfitAndLossReport>, ApiError> {
    Ok(Json(state.service.profit_and_loss(query.window()?).await?))
}

pub async fn receivables_payables(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<ReceivablesPayablesReport>, ApiError> {
    Ok(Json(state.service.receivables_payables(query.as_of).await?))
}

pub async fn balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<BalanceSheetSummary>, ApiError> {
    Ok(Json(state.service.balance_sheet(query.as_of).await?))
}

/// Signed balance per ledger, cumulative or movement
pub async fn balances(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let mode = query.balance_mode()?;
    let set = state.service.balances(mode).await?;
    Ok(Json(BalancesResponse::new(mode, set)?))
}

/// Roll-up of one group's subtree
pub async fn group_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<GroupBalanceNode>, ApiError> {
    let tree = state
        .service
        .group_tree(GroupId::from_uuid(id), query.balance_mode()?)
        .await?;
    Ok(Json(tree))
}
