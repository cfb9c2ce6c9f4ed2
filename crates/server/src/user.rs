//! Caller identity.
//!
//! Authentication happens upstream; requests reach the ledger with the
//! authenticated user id in the `x-user-id` header.

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{Error as HeaderError, Header};

static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// `TypedHeader` for the `x-user-id` header. Blank values are rejected.
#[derive(Debug)]
pub struct UserIdHeader(pub String);

impl Header for UserIdHeader {
    fn name() -> &'static HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(HeaderError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(HeaderError::invalid());
        }
        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

/// The authenticated caller, inserted into request extensions by the auth
/// middleware.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}
