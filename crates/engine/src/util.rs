//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and normalization so every entity maps rows the same way.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, ValidationErrors};

/// Declares a fieldless enum persisted as its `SCREAMING_SNAKE_CASE` label.
///
/// Generates `as_str`, `Display` and a case-insensitive `TryFrom<&str>` that
/// fails with a validation error naming the enum.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Canonical label stored in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::EngineError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.trim().to_ascii_uppercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    other => Err($crate::EngineError::Validation(
                        $crate::ValidationErrors::single(
                            stringify!($name),
                            format!("unknown value '{other}'"),
                        ),
                    )),
                }
            }
        }
    };
}

pub(crate) use labeled_enum;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::Validation(ValidationErrors::single(label, "invalid id")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|raw| parse_uuid(raw, label)).transpose()
}

/// Parse a decimal stored as TEXT.
pub(crate) fn parse_decimal(value: &str, label: &str) -> ResultEngine<Decimal> {
    Decimal::from_str(value.trim()).map_err(|_| {
        EngineError::Validation(ValidationErrors::single(
            label,
            format!("invalid decimal '{value}'"),
        ))
    })
}

pub(crate) fn parse_optional_decimal(
    value: Option<&str>,
    label: &str,
) -> ResultEngine<Option<Decimal>> {
    value.map(|raw| parse_decimal(raw, label)).transpose()
}

pub(crate) fn decimal_text(value: Decimal) -> String {
    value.to_string()
}

pub(crate) fn optional_decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_text)
}

pub(crate) fn optional_uuid_text(value: Option<Uuid>) -> Option<String> {
    value.map(|id| id.to_string())
}

/// Counters are stored as `i32`; negative values never reach the domain.
pub(crate) fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Applies a partial-patch text field: `None` keeps the existing value, an
/// empty string clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

/// Records an error when `value` is blank and returns the trimmed name.
pub(crate) fn require_name(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "must not be empty");
    } else if trimmed.chars().count() > 100 {
        errors.add(field, "must be at most 100 characters");
    }
    trimmed.to_string()
}

pub(crate) fn require_positive(errors: &mut ValidationErrors, field: &str, value: Decimal) {
    if value <= Decimal::ZERO {
        errors.add(field, "must be greater than 0");
    }
}
