//! Subscriptions API endpoints.

use api_types::{
    ApiResponse,
    subscription::{SubscriptionBilling, SubscriptionDateQuery, SubscriptionNew},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Frequency, NewSubscription, Subscription, Transaction};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

#[derive(Debug, Serialize)]
pub struct BillingProcessed {
    pub subscription: Subscription,
    /// The expense booked for the bill, when one was posted.
    pub transaction: Option<Transaction>,
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<SubscriptionNew>,
) -> Result<(StatusCode, Json<ApiResponse<Subscription>>), ServerError> {
    let frequency: Frequency = label(&payload.billing_frequency)?;
    let defaults = NewSubscription::new(
        payload.wallet_id,
        payload.name,
        payload.amount,
        frequency,
        payload.start_date,
    );
    let cmd = NewSubscription {
        currency: payload.currency,
        next_billing_date: payload.next_billing_date,
        end_date: payload.end_date,
        category_id: payload.category_id,
        provider_name: payload.provider_name,
        description: payload.description,
        reminder_enabled: payload.reminder_enabled.unwrap_or(defaults.reminder_enabled),
        reminder_days_before: payload.reminder_days_before,
        auto_create_transaction: payload
            .auto_create_transaction
            .unwrap_or(defaults.auto_create_transaction),
        free_trial_end_date: payload.free_trial_end_date,
        website_url: payload.website_url,
        notes: payload.notes,
        ..defaults
    };

    created(state.engine.create_subscription(user.id(), cmd).await?)
}

/// Active and trialing subscriptions.
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<Subscription>> {
    ok(state.engine.active_subscriptions(user.id()).await?)
}

pub async fn due(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<SubscriptionDateQuery>,
) -> ApiResult<Vec<Subscription>> {
    let date = query.date.unwrap_or_else(|| state.today());
    ok(state.engine.subscriptions_due(user.id(), date).await?)
}

pub async fn reminders(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<SubscriptionDateQuery>,
) -> ApiResult<Vec<Subscription>> {
    let today = query.date.unwrap_or_else(|| state.today());
    ok(state
        .engine
        .subscriptions_needing_reminder(user.id(), today)
        .await?)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
) -> ApiResult<Subscription> {
    ok(state
        .engine
        .subscription(user.id(), subscription_id)
        .await?)
}

pub async fn pause(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
) -> ApiResult<Subscription> {
    ok(state
        .engine
        .pause_subscription(user.id(), subscription_id)
        .await?)
}

pub async fn resume(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
) -> ApiResult<Subscription> {
    ok(state
        .engine
        .resume_subscription(user.id(), subscription_id)
        .await?)
}

pub async fn cancel(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
) -> ApiResult<Subscription> {
    let today = state.today();
    ok(state
        .engine
        .cancel_subscription(user.id(), subscription_id, today)
        .await?)
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state
        .engine
        .delete_subscription(user.id(), subscription_id)
        .await?)
}

/// Records the pending bill and moves to the next cycle.
pub async fn bill(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<SubscriptionBilling>,
) -> ApiResult<BillingProcessed> {
    let post_transaction = match payload.post_transaction {
        Some(post) => post,
        None => {
            state
                .engine
                .subscription(user.id(), subscription_id)
                .await?
                .auto_create_transaction
        }
    };
    let (subscription, transaction) = state
        .engine
        .process_subscription_billing(user.id(), subscription_id, post_transaction)
        .await?;
    ok(BillingProcessed {
        subscription,
        transaction,
    })
}
