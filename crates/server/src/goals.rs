//! Savings goals API endpoints.

use api_types::{
    ApiResponse,
    goal::{GoalContribution, GoalNew, GoalUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{GoalPatch, GoalStatus, NewGoal, SavingsGoal};
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<ApiResponse<SavingsGoal>>), ServerError> {
    let cmd = NewGoal {
        wallet_id: payload.wallet_id,
        target_date: payload.target_date,
        description: payload.description,
        priority: payload.priority,
        ..NewGoal::new(payload.name, payload.target_amount, payload.currency)
    };

    created(state.engine.create_goal(user.id(), cmd).await?)
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<SavingsGoal>> {
    ok(state.engine.goals(user.id()).await?)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<SavingsGoal> {
    ok(state.engine.goal(user.id(), goal_id).await?)
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> ApiResult<SavingsGoal> {
    let status = payload
        .status
        .as_deref()
        .map(label::<GoalStatus>)
        .transpose()?;
    let patch = GoalPatch {
        name: payload.name,
        description: payload.description,
        target_amount: payload.target_amount,
        target_date: payload.target_date,
        priority: payload.priority,
        status,
    };
    ok(state.engine.update_goal(user.id(), goal_id, patch).await?)
}

pub async fn contribute(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalContribution>,
) -> ApiResult<SavingsGoal> {
    ok(state
        .engine
        .add_to_goal(user.id(), goal_id, payload.amount)
        .await?)
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state.engine.delete_goal(user.id(), goal_id).await?)
}
