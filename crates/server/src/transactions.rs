//! Transactions API endpoints

use api_types::{
    ApiResponse,
    transaction::{TransactionNew, TransactionQuery, TransactionUpdate, TransferNew},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CreateTransactionCmd, Transaction, TransactionListFilter, TransactionPatch, TransactionType,
    TransferCmd,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

/// Both rows written by a transfer.
#[derive(Debug, Serialize)]
pub struct TransferCreated {
    pub outgoing: Transaction,
    pub incoming: Transaction,
}

fn parse_types(raw: &str) -> Result<Vec<TransactionType>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(label::<TransactionType>)
        .collect()
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ServerError> {
    let kind: TransactionType = label(&payload.transaction_type)?;
    let cmd = CreateTransactionCmd {
        currency: payload.currency_code,
        exchange_rate: payload.exchange_rate,
        category_id: payload.category_id,
        description: payload.description,
        notes: payload.notes,
        merchant_name: payload.merchant_name,
        location: payload.location,
        parent_transaction_id: payload.parent_transaction_id,
        ..CreateTransactionCmd::new(
            payload.wallet_id,
            kind,
            payload.amount,
            payload.transaction_date,
        )
    };

    created(state.engine.create_transaction(user.id(), cmd).await?)
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Vec<Transaction>> {
    let types = query.types.as_deref().map(parse_types).transpose()?;
    let filter = TransactionListFilter {
        from: query.from,
        to: query.to,
        wallet_id: query.wallet_id,
        category_id: query.category_id,
        types,
        recurring_template_id: query.recurring_template_id,
        limit: query.limit,
    };

    ok(state.engine.transactions(user.id(), &filter).await?)
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Transaction> {
    ok(state.engine.transaction(user.id(), transaction_id).await?)
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> ApiResult<Transaction> {
    let transaction_type = payload
        .transaction_type
        .as_deref()
        .map(label::<TransactionType>)
        .transpose()?;
    let patch = TransactionPatch {
        amount: payload.amount,
        transaction_type,
        exchange_rate: payload.exchange_rate,
        transaction_date: payload.transaction_date,
        category_id: payload.category_id,
        description: payload.description,
        notes: payload.notes,
        merchant_name: payload.merchant_name,
        location: payload.location,
    };

    ok(state
        .engine
        .update_transaction(user.id(), transaction_id, patch)
        .await?)
}

/// Soft-deletes a transaction and reverts its balance effect.
pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state
        .engine
        .delete_transaction(user.id(), transaction_id)
        .await?)
}

pub async fn reconcile(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Transaction> {
    ok(state
        .engine
        .reconcile_transaction(user.id(), transaction_id)
        .await?)
}

pub async fn transfer(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransferCreated>>), ServerError> {
    let mut cmd = TransferCmd::new(
        payload.from_wallet_id,
        payload.to_wallet_id,
        payload.amount,
        payload.transaction_date,
    );
    cmd.exchange_rate = payload.exchange_rate;
    cmd.description = payload.description;
    cmd.notes = payload.notes;

    let (outgoing, incoming) = state.engine.transfer(user.id(), cmd).await?;
    created(TransferCreated { outgoing, incoming })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_list_is_comma_separated() {
        let types = parse_types("income, EXPENSE,").unwrap();
        assert_eq!(types, vec![TransactionType::Income, TransactionType::Expense]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(parse_types("INCOME,GIFT").is_err());
    }
}
