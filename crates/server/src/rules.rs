//! Category rules API endpoints.

use api_types::{
    ApiResponse,
    rule::{RuleNew, RuleView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CategoryRule, ConditionKind, NewCategoryRule, RuleField};
use uuid::Uuid;

use crate::{ApiResult, ServerError, created, label, ok, server::ServerState, user::CurrentUser};

fn view(rule: CategoryRule) -> RuleView {
    RuleView {
        id: rule.id,
        category_id: rule.category_id,
        name: rule.name,
        description: rule.description,
        field: rule.field.as_str().to_string(),
        condition: rule.condition.kind().as_str().to_string(),
        value: rule.field_value,
        priority: rule.priority,
        is_active: rule.is_active,
        apply_count: rule.apply_count,
    }
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<RuleNew>,
) -> Result<(StatusCode, Json<ApiResponse<RuleView>>), ServerError> {
    let field: RuleField = label(&payload.field)?;
    let condition: ConditionKind = label(&payload.condition)?;
    let mut cmd = NewCategoryRule::new(
        payload.category_id,
        payload.name,
        field,
        condition,
        payload.value,
    )
    .priority(payload.priority);
    cmd.description = payload.description;

    let rule = state.engine.create_rule(user.id(), cmd).await?;
    created(view(rule))
}

/// Active rules in evaluation order.
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<RuleView>> {
    let rules = state.engine.rules(user.id()).await?;
    ok(rules.into_iter().map(view).collect())
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(rule_id): Path<Uuid>,
) -> ApiResult<()> {
    ok(state.engine.delete_rule(user.id(), rule_id).await?)
}
