//! Wallets API endpoints.

use api_types::{
    ApiResponse,
    wallet::{TotalBalance, TotalBalanceQuery, WalletList, WalletNew, WalletUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewWallet, Wallet, WalletPatch, WalletType};
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<ApiResponse<Wallet>>), ServerError> {
    let wallet_type: WalletType = label(&payload.wallet_type)?;
    let mut cmd = NewWallet::new(payload.name, wallet_type, payload.currency)
        .exclude_from_totals(payload.exclude_from_totals);
    if let Some(initial) = payload.initial_balance {
        cmd = cmd.initial_balance(initial);
    }
    if let Some(limit) = payload.credit_limit {
        cmd = cmd.credit_limit(limit);
    }
    cmd.description = payload.description;

    created(state.engine.create_wallet(user.id(), cmd).await?)
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<WalletList>,
) -> ApiResult<Vec<Wallet>> {
    ok(state
        .engine
        .wallets(user.id(), query.include_archived)
        .await?)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<Wallet> {
    ok(state.engine.wallet(user.id(), wallet_id).await?)
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletUpdate>,
) -> ApiResult<Wallet> {
    let patch = WalletPatch {
        name: payload.name,
        description: payload.description,
        credit_limit: payload.credit_limit,
        exclude_from_totals: payload.exclude_from_totals,
    };
    ok(state
        .engine
        .update_wallet(user.id(), wallet_id, patch)
        .await?)
}

pub async fn archive(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<Wallet> {
    ok(state.engine.archive_wallet(user.id(), wallet_id).await?)
}

pub async fn unarchive(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<Wallet> {
    ok(state.engine.unarchive_wallet(user.id(), wallet_id).await?)
}

pub async fn set_default(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<Wallet> {
    ok(state
        .engine
        .set_default_wallet(user.id(), wallet_id)
        .await?)
}

/// Replays the ledger of a wallet and repairs its stored balance.
pub async fn recompute(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<Wallet> {
    ok(state
        .engine
        .recompute_wallet_balance(user.id(), wallet_id)
        .await?)
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state.engine.delete_wallet(user.id(), wallet_id).await?)
}

pub async fn total(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<TotalBalanceQuery>,
) -> ApiResult<TotalBalance> {
    let total = state
        .engine
        .total_balance(user.id(), query.currency.as_deref())
        .await?;
    ok(TotalBalance {
        currency: query.currency,
        total,
    })
}
