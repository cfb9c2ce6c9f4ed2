use std::{str::FromStr, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use server::{ServerState, router};

const ALICE: &str = "alice";
const BOB: &str = "bob";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(ServerState::new(Arc::new(engine), chrono_tz::UTC))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => Decimal::from_str(raw).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn create_wallet(app: &Router, user: &str, initial: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/wallets",
        Some(user),
        Some(json!({
            "name": "Cash",
            "wallet_type": "CASH",
            "currency": "USD",
            "initial_balance": initial,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn missing_or_blank_user_is_unauthenticated() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/wallets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let (status, _) = call(&app, Method::GET, "/wallets", Some("  "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wallet_is_created_inside_the_envelope() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "100.00").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/wallets/{wallet_id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body.get("error").is_none());
    assert_eq!(body["data"]["wallet_type"], "CASH");
    assert_eq!(body["data"]["is_default"], json!(true));
    assert_eq!(decimal(&body["data"]["balance"]), Decimal::new(100, 0));
}

#[tokio::test]
async fn expense_moves_the_wallet_balance() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "100.00").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some(ALICE),
        Some(json!({
            "wallet_id": wallet_id,
            "transaction_type": "expense",
            "amount": "30.00",
            "transaction_date": "2025-03-10",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["transaction_type"], "EXPENSE");

    let (_, body) = call(
        &app,
        Method::GET,
        &format!("/wallets/{wallet_id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(decimal(&body["data"]["balance"]), Decimal::new(70, 0));

    let (status, body) = call(
        &app,
        Method::GET,
        "/transactions?from=2025-03-01&to=2025-03-31&types=EXPENSE",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_wallet_is_forbidden() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "10").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/wallets/{wallet_id}"),
        Some(BOB),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn unknown_wallet_is_not_found() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/wallets/7f1c1b9e-3c5a-4a8e-9d55-2f0d4f2b6a11",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn validation_failures_list_every_field() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/wallets",
        Some(ALICE),
        Some(json!({
            "name": "   ",
            "wallet_type": "CASH",
            "currency": "US1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let details = body["error"]["details"].as_object().unwrap();
    assert!(details.contains_key("name"));
    assert!(details.contains_key("currency"));
}

#[tokio::test]
async fn unknown_label_is_a_validation_error() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/wallets",
        Some(ALICE),
        Some(json!({
            "name": "Jar",
            "wallet_type": "PIGGY_BANK",
            "currency": "USD",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn same_wallet_transfer_is_rejected() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "50").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/transfers",
        Some(ALICE),
        Some(json!({
            "from_wallet_id": wallet_id,
            "to_wallet_id": wallet_id,
            "amount": "5",
            "transaction_date": "2025-03-10",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SAME_WALLET_TRANSFER");
}

#[tokio::test]
async fn rules_categorize_new_transactions() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "100").await;
    let category_id = "0b6f3a4e-1d2c-4e5f-8a9b-0c1d2e3f4a5b";

    let (status, body) = call(
        &app,
        Method::POST,
        "/rules",
        Some(ALICE),
        Some(json!({
            "category_id": category_id,
            "name": "Coffee",
            "field": "MERCHANT",
            "condition": "CONTAINS",
            "value": "coffee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["condition"], "CONTAINS");
    assert_eq!(body["data"]["value"], "coffee");

    let (_, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some(ALICE),
        Some(json!({
            "wallet_id": wallet_id,
            "transaction_type": "EXPENSE",
            "amount": "4.50",
            "transaction_date": "2025-03-10",
            "merchant_name": "Corner Coffee Shop",
        })),
    )
    .await;
    assert_eq!(body["data"]["category_id"], category_id);
    assert_eq!(body["data"]["auto_categorized"], json!(true));

    let (_, body) = call(&app, Method::GET, "/rules", Some(ALICE), None).await;
    assert_eq!(body["data"][0]["apply_count"], json!(1));
}

#[tokio::test]
async fn goal_contributions_complete_the_goal() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/goals",
        Some(ALICE),
        Some(json!({
            "name": "Bike",
            "target_amount": "200",
            "currency": "USD",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let goal_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/goals/{goal_id}/contributions"),
        Some(ALICE),
        Some(json!({ "amount": "200" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn trends_reject_zero_months() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/reports/trends?months=0&today=2025-03-15",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = call(
        &app,
        Method::GET,
        "/reports/trends?months=3&today=2025-03-15",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn manual_sweep_reports_created_occurrences() {
    let app = app().await;
    let wallet_id = create_wallet(&app, ALICE, "1000").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/recurring",
        Some(ALICE),
        Some(json!({
            "wallet_id": wallet_id,
            "name": "Rent",
            "transaction_type": "EXPENSE",
            "amount": "500",
            "frequency": "MONTHLY",
            "start_date": "2025-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/recurring/run",
        Some(ALICE),
        Some(json!({ "date": "2025-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], json!(1));
}
