//! Budgets API endpoints.

use api_types::{
    ApiResponse,
    budget::{BudgetNew, BudgetQuery, BudgetReset, BudgetSpend, BudgetUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Budget, BudgetPatch, BudgetPeriod, NewBudget};
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<ApiResponse<Budget>>), ServerError> {
    let period: BudgetPeriod = label(&payload.period)?;
    let cmd = NewBudget {
        end_date: payload.end_date,
        category_id: payload.category_id,
        wallet_id: payload.wallet_id,
        description: payload.description,
        alert_threshold: payload.alert_threshold,
        alert_enabled: payload.alert_enabled.unwrap_or(true),
        rollover_enabled: payload.rollover_enabled,
        ..NewBudget::new(
            payload.name,
            payload.amount,
            payload.currency,
            period,
            payload.start_date,
        )
    };

    created(state.engine.create_budget(user.id(), cmd).await?)
}

/// All budgets, or only those active on `active_on`.
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetQuery>,
) -> ApiResult<Vec<Budget>> {
    let budgets = match query.active_on {
        Some(date) => state.engine.active_budgets_for_date(user.id(), date).await?,
        None => state.engine.budgets(user.id()).await?,
    };
    ok(budgets)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> ApiResult<Budget> {
    ok(state.engine.budget(user.id(), budget_id).await?)
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> ApiResult<Budget> {
    let patch = BudgetPatch {
        name: payload.name,
        description: payload.description,
        amount: payload.amount,
        end_date: payload.end_date,
        alert_threshold: payload.alert_threshold,
        alert_enabled: payload.alert_enabled,
        rollover_enabled: payload.rollover_enabled,
    };
    ok(state
        .engine
        .update_budget(user.id(), budget_id, patch)
        .await?)
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state.engine.delete_budget(user.id(), budget_id).await?)
}

/// Adds spend by hand, for budgets not fed by transactions.
pub async fn spend(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetSpend>,
) -> ApiResult<Budget> {
    ok(state
        .engine
        .update_budget_spent(user.id(), budget_id, payload.amount)
        .await?)
}

pub async fn reset(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetReset>,
) -> ApiResult<Budget> {
    ok(state
        .engine
        .reset_budget_for_new_period(user.id(), budget_id, payload.start_date, payload.end_date)
        .await?)
}

pub async fn pause(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> ApiResult<Budget> {
    ok(state.engine.pause_budget(user.id(), budget_id).await?)
}

pub async fn resume(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> ApiResult<Budget> {
    ok(state.engine.resume_budget(user.id(), budget_id).await?)
}

pub async fn over_threshold(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<Budget>> {
    ok(state
        .engine
        .budgets_exceeding_threshold(user.id())
        .await?)
}

pub async fn exceeded(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<Budget>> {
    ok(state.engine.exceeded_budgets(user.id()).await?)
}
