//! Clients for the remote services behind the API gateway.
//!
//! Each remote concern is a trait so the orchestrator can be driven by
//! in-process fakes in tests; the production implementations are thin
//! `reqwest` JSON clients. Response bodies are never trusted as untyped
//! values - every operation parses into a typed success payload or a typed
//! failure reason.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod orders;

pub use cart::CartStoreClient;
pub use catalog::{CatalogClient, CatalogSnapshot, ProductInfo};
pub use coupon::{CouponServiceClient, Validation};
pub use orders::{OrderItemSnapshot, OrderLedgerClient, OrderSubmission, PaymentFields};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use pazar_core::{CartLine, CouponId, OrderId, ProductId, UserId};

use crate::session::Session;

/// Errors from any remote service call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed in transit.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// The service's own message for this failure, when it sent one.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Remote source of truth for cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch all lines for the session's user.
    async fn fetch_lines(&self, session: &Session) -> Result<Vec<CartLine>, RemoteError>;

    /// Apply a signed quantity delta to a line. The store removes lines
    /// that reach zero.
    async fn adjust(
        &self,
        session: &Session,
        product_id: ProductId,
        delta: i32,
    ) -> Result<(), RemoteError>;

    /// Delete a line outright.
    async fn remove_line(&self, session: &Session, product_id: ProductId)
    -> Result<(), RemoteError>;

    /// Delete the whole cart.
    async fn clear(&self, session: &Session) -> Result<(), RemoteError>;
}

/// Validates coupon codes against a live order total.
///
/// Business rules (minimum-order thresholds, caps, per-user limits) live
/// server-side; the returned amount is authoritative and is never
/// recomputed locally.
#[async_trait]
pub trait DiscountAuthority: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        user_id: UserId,
        order_total: Decimal,
    ) -> Result<Validation, RemoteError>;
}

/// Persists finalized orders and returns their identifiers.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    async fn create(&self, submission: &OrderSubmission) -> Result<OrderId, RemoteError>;
}

/// Records coupon redemptions for statistics and limits.
///
/// Callers treat failures as best-effort: an unrecorded redemption must
/// never undo an already-created order.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record(
        &self,
        coupon_id: CouponId,
        user_id: UserId,
        order_id: OrderId,
        discount: Decimal,
    ) -> Result<(), RemoteError>;
}

/// Product names and prices used to value cart lines.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn snapshot(&self) -> Result<CatalogSnapshot, RemoteError>;
}

/// Read a non-success response into [`RemoteError::Api`], preferring the
/// gateway's `{"error": ...}` or `{"message": ...}` body field.
pub(crate) async fn error_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    RemoteError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::Api {
            status: 400,
            message: "insufficient stock".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - insufficient stock");
    }

    #[test]
    fn test_remote_message_extraction() {
        let err = RemoteError::Api {
            status: 402,
            message: "payment declined".to_string(),
        };
        assert_eq!(err.remote_message(), Some("payment declined"));

        let blank = RemoteError::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(blank.remote_message(), None);

        let parse = RemoteError::Parse("bad json".to_string());
        assert_eq!(parse.remote_message(), None);
    }
}
