use api_types::{ApiError, ApiResponse};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, codes};

pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod budgets;
mod goals;
mod recurring;
mod reports;
mod rules;
mod server;
mod subscriptions;
mod transactions;
mod user;
mod wallets;

/// Successful JSON body wrapped in the response envelope.
pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, ServerError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

pub(crate) fn created<T>(data: T) -> Result<(StatusCode, Json<ApiResponse<T>>), ServerError> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request the engine never saw.
    Generic(String),
    /// Missing or blank `x-user-id` header.
    Unauthenticated,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::BusinessRule { code, .. } if *code == codes::UNAUTHORIZED => {
            StatusCode::FORBIDDEN
        }
        EngineError::BusinessRule { .. } | EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::WriteConflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_for_engine_error(err: EngineError) -> ApiError {
    let code = err.code().to_string();
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ApiError {
                code,
                message: "internal server error".to_string(),
                details: None,
            }
        }
        EngineError::WriteConflict(message) => {
            tracing::warn!("write conflict: {message}");
            ApiError {
                code,
                message: format!("write conflict: {message}"),
                details: None,
            }
        }
        EngineError::Validation(errors) => ApiError {
            code,
            message: "validation failed".to_string(),
            details: Some(errors.fields().clone()),
        },
        other => ApiError {
            code,
            message: other.to_string(),
            details: None,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), error_for_engine_error(err)),
            ServerError::Generic(message) => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    code: "BAD_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),
            ServerError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    code: "UNAUTHENTICATED".to_string(),
                    message: "missing x-user-id header".to_string(),
                    details: None,
                },
            ),
        };

        (status, Json(ApiResponse::failure(error))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses an upper-case label such as `EXPENSE` into an engine enum.
pub(crate) fn label<T>(value: &str) -> Result<T, ServerError>
where
    T: for<'a> TryFrom<&'a str, Error = EngineError>,
{
    T::try_from(value).map_err(ServerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(code: &'static str) -> EngineError {
        EngineError::BusinessRule {
            code,
            message: "rejected".to_string(),
        }
    }

    #[test]
    fn engine_unauthorized_maps_to_403() {
        let res = ServerError::from(rule(codes::UNAUTHORIZED)).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound {
            entity: "Wallet",
            field: "id",
            value: "x".to_string(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::WriteConflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn business_rules_and_validation_map_to_400() {
        let res = ServerError::from(rule(codes::WALLET_ARCHIVED)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = ServerError::from(EngineError::Validation(engine::ValidationErrors::single(
            "amount", "bad",
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_errors_hide_details() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        let api = error_for_engine_error(err);
        assert_eq!(api.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(api.message, "internal server error");
    }

    #[test]
    fn missing_user_maps_to_401() {
        let res = ServerError::Unauthenticated.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
