//! The module contains the errors the engine can return.
//!
//! - [`NotFound`] when an id does not match a non-deleted row.
//! - [`BusinessRule`] when a domain rule rejects the operation; carries a
//!   stable machine-readable code (see [`codes`]).
//! - [`Validation`] with every field violation found, not only the first.
//! - [`WriteConflict`] when an optimistic version check fails.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`BusinessRule`]: EngineError::BusinessRule
//!  [`Validation`]: EngineError::Validation
//!  [`WriteConflict`]: EngineError::WriteConflict
use std::collections::BTreeMap;
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Stable codes carried by [`EngineError::BusinessRule`].
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const WALLET_ARCHIVED: &str = "WALLET_ARCHIVED";
    pub const SAME_WALLET_TRANSFER: &str = "SAME_WALLET_TRANSFER";
    pub const TRANSFER_LINKED: &str = "TRANSFER_LINKED";
    pub const RECURRING_TERMINATED: &str = "RECURRING_TERMINATED";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const CUSTOM_PERIOD_REQUIRES_DATES: &str = "CUSTOM_PERIOD_REQUIRES_DATES";
}

/// Field → message map collected by a validator.
///
/// Validators add every violation they find and fail once at the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a violation. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// `Ok(())` when nothing was recorded.
    pub fn finish(self) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} not found with {field}: '{value}'")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{message}")]
    BusinessRule { code: &'static str, message: String },
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("write conflict: {0}")]
    WriteConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    pub(crate) fn rule(code: &'static str, message: impl Into<String>) -> Self {
        Self::BusinessRule {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code used by the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::BusinessRule { code, .. } => code,
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::WriteConflict(_) => "WRITE_CONFLICT",
            Self::Database(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::NotFound {
                    entity: a,
                    field: fa,
                    value: va,
                },
                Self::NotFound {
                    entity: b,
                    field: fb,
                    value: vb,
                },
            ) => a == b && fa == fb && va == vb,
            (
                Self::BusinessRule { code: a, message: ma },
                Self::BusinessRule { code: b, message: mb },
            ) => a == b && ma == mb,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::WriteConflict(a), Self::WriteConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
