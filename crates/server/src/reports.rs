//! Reports API endpoints.

use api_types::{DateRange, report::TrendQuery};
use axum::{
    Extension,
    extract::{Query, State},
};
use engine::{CategoryTotal, DashboardSummary, MonthlyTrend};

use crate::{ApiResult, ok, server::ServerState, user::CurrentUser};

const DEFAULT_TREND_MONTHS: u32 = 6;

pub async fn dashboard(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> ApiResult<DashboardSummary> {
    ok(state
        .engine
        .dashboard_summary(user.id(), range.from, range.to)
        .await?)
}

pub async fn spending(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<CategoryTotal>> {
    ok(state
        .engine
        .spending_by_category(user.id(), range.from, range.to)
        .await?)
}

pub async fn income(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<CategoryTotal>> {
    ok(state
        .engine
        .income_by_category(user.id(), range.from, range.to)
        .await?)
}

pub async fn trends(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Vec<MonthlyTrend>> {
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);
    let today = query.today.unwrap_or_else(|| state.today());
    ok(state
        .engine
        .monthly_trends(user.id(), months, today)
        .await?)
}
