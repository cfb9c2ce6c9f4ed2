//! Recurring templates API endpoints.

use api_types::{
    ApiResponse,
    recurring::{RecurringNew, RecurringRun},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Frequency, NewRecurring, RecurringRunReport, RecurringTransaction, TransactionType};
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurringNew>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringTransaction>>), ServerError> {
    let kind: TransactionType = label(&payload.transaction_type)?;
    let frequency: Frequency = label(&payload.frequency)?;
    let defaults = NewRecurring::new(
        payload.wallet_id,
        payload.name,
        kind,
        payload.amount,
        frequency,
        payload.start_date,
    );
    let cmd = NewRecurring {
        currency: payload.currency,
        interval_count: payload.interval_count.unwrap_or(defaults.interval_count),
        end_date: payload.end_date,
        max_occurrences: payload.max_occurrences,
        auto_create: payload.auto_create.unwrap_or(defaults.auto_create),
        category_id: payload.category_id,
        description: payload.description,
        ..defaults
    };

    created(state.engine.create_recurring(user.id(), cmd).await?)
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<RecurringTransaction>> {
    ok(state.engine.recurring_for_user(user.id()).await?)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<RecurringTransaction> {
    ok(state.engine.recurring(user.id(), template_id).await?)
}

pub async fn pause(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<RecurringTransaction> {
    ok(state.engine.pause_recurring(user.id(), template_id).await?)
}

pub async fn resume(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<RecurringTransaction> {
    ok(state.engine.resume_recurring(user.id(), template_id).await?)
}

pub async fn cancel(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<RecurringTransaction> {
    ok(state.engine.cancel_recurring(user.id(), template_id).await?)
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state.engine.delete_recurring(user.id(), template_id).await?)
}

/// Runs the sweep on demand. The sweep covers every user's due templates.
pub async fn run(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurringRun>,
) -> ApiResult<RecurringRunReport> {
    let today = payload.date.unwrap_or_else(|| state.today());
    tracing::info!(user_id = user.id(), %today, "manual recurring sweep requested");
    ok(state.engine.run_recurring(today).await?)
}
