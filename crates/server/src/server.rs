use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::headers::HeaderMapExt;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use std::sync::Arc;

use crate::{
    ServerError, budgets, goals, recurring, reports, rules, subscriptions, transactions,
    user::{CurrentUser, UserIdHeader},
    wallets,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Timezone used to resolve "today" when a request omits a date.
    pub timezone: Tz,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, timezone: Tz) -> Self {
        Self { engine, timezone }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Rejects requests without a usable `x-user-id` header.
async fn auth(mut request: Request, next: Next) -> Result<Response, ServerError> {
    let Some(UserIdHeader(user_id)) = request.headers().typed_get::<UserIdHeader>() else {
        return Err(ServerError::Unauthenticated);
    };

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/wallets", get(wallets::list).post(wallets::create))
        .route("/wallets/total", get(wallets::total))
        .route(
            "/wallets/{id}",
            get(wallets::get)
                .patch(wallets::update)
                .delete(wallets::delete),
        )
        .route("/wallets/{id}/archive", post(wallets::archive))
        .route("/wallets/{id}/unarchive", post(wallets::unarchive))
        .route("/wallets/{id}/default", post(wallets::set_default))
        .route("/wallets/{id}/recompute", post(wallets::recompute))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route("/transactions/{id}/reconcile", post(transactions::reconcile))
        .route("/transfers", post(transactions::transfer))
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/alerts", get(budgets::over_threshold))
        .route("/budgets/exceeded", get(budgets::exceeded))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::delete),
        )
        .route("/budgets/{id}/spend", post(budgets::spend))
        .route("/budgets/{id}/reset", post(budgets::reset))
        .route("/budgets/{id}/pause", post(budgets::pause))
        .route("/budgets/{id}/resume", post(budgets::resume))
        .route("/recurring", get(recurring::list).post(recurring::create))
        .route("/recurring/run", post(recurring::run))
        .route(
            "/recurring/{id}",
            get(recurring::get).delete(recurring::delete),
        )
        .route("/recurring/{id}/pause", post(recurring::pause))
        .route("/recurring/{id}/resume", post(recurring::resume))
        .route("/recurring/{id}/cancel", post(recurring::cancel))
        .route(
            "/subscriptions",
            get(subscriptions::list).post(subscriptions::create),
        )
        .route("/subscriptions/due", get(subscriptions::due))
        .route("/subscriptions/reminders", get(subscriptions::reminders))
        .route(
            "/subscriptions/{id}",
            get(subscriptions::get).delete(subscriptions::delete),
        )
        .route("/subscriptions/{id}/pause", post(subscriptions::pause))
        .route("/subscriptions/{id}/resume", post(subscriptions::resume))
        .route("/subscriptions/{id}/cancel", post(subscriptions::cancel))
        .route("/subscriptions/{id}/bill", post(subscriptions::bill))
        .route("/goals", get(goals::list).post(goals::create))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/contributions", post(goals::contribute))
        .route("/rules", get(rules::list).post(rules::create))
        .route("/rules/{id}", axum::routing::delete(rules::delete))
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/spending", get(reports::spending))
        .route("/reports/income", get(reports::income))
        .route("/reports/trends", get(reports::trends))
        .route_layer(middleware::from_fn(auth))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
