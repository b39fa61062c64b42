//! Error types for the marketplace service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::ParseEnumError;

/// Failure kinds surfaced by the marketplace operations
#[derive(Error, Debug)]
pub enum MarketError {
    /// Malformed input, rejected before anything is persisted
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or an invalid session
    #[error("{0}")]
    Auth(String),

    /// Unresolvable identifier, malformed or missing alike
    #[error("{0} not found")]
    NotFound(String),

    /// Authenticated, but wrong role or not the owner
    #[error("not permitted")]
    Forbidden,

    /// Checkout attempted with nothing in the cart
    #[error("cart has no products")]
    EmptyCart,

    /// Anything else, mostly storage failures
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ParseEnumError> for MarketError {
    fn from(err: ParseEnumError) -> Self {
        MarketError::Validation(err.to_string())
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            MarketError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MarketError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            MarketError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            MarketError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            MarketError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            MarketError::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            MarketError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for marketplace results
pub type MarketResult<T> = Result<T, MarketError>;

/// Parse a path identifier; malformed ids are reported like missing ones
pub fn parse_id(raw: &str, what: &str) -> MarketResult<uuid::Uuid> {
    raw.trim()
        .parse()
        .map_err(|_| MarketError::NotFound(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (MarketError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (MarketError::Conflict("taken".into()), StatusCode::CONFLICT),
            (MarketError::Auth("nope".into()), StatusCode::UNAUTHORIZED),
            (MarketError::NotFound("order".into()), StatusCode::NOT_FOUND),
            (MarketError::Forbidden, StatusCode::FORBIDDEN),
            (MarketError::EmptyCart, StatusCode::UNPROCESSABLE_ENTITY),
            (
                MarketError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn malformed_and_unknown_ids_are_both_not_found() {
        assert!(matches!(
            parse_id("not-a-uuid", "order"),
            Err(MarketError::NotFound(what)) if what == "order"
        ));
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "order").unwrap(), id);
    }
}
