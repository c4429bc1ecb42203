//! Order Ledger client.
//!
//! `POST /orders` is the single commit point of checkout: it validates
//! stock, simulates payment, and persists the order with snapshotted line
//! items. The response carries the new order's id; a rejection carries the
//! ledger's message in the `error` body field.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use pazar_core::{OrderId, ProductId, UserId};

use super::{OrderLedger, RemoteError, error_from_response};
use crate::config::StorefrontConfig;

/// A cart line frozen at checkout time.
///
/// Name and unit price are copied into the order so later catalog edits
/// never retroactively alter what the customer is recorded to have bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Card fields passed through to the payment simulation.
#[derive(Clone)]
pub struct PaymentFields {
    pub card_number: SecretString,
    pub expiry: String,
    pub cvv: SecretString,
}

impl std::fmt::Debug for PaymentFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentFields")
            .field("card_number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// Everything the ledger needs to persist one order.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub user_id: UserId,
    pub items: Vec<OrderItemSnapshot>,
    pub sub_total: Decimal,
    pub total_price: Decimal,
    /// Empty string when no coupon was applied (ledger wire convention).
    pub coupon_code: String,
    pub coupon_discount: Decimal,
    pub payment: PaymentFields,
    pub shipping_address: String,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    user_id: UserId,
    items: &'a [OrderItemSnapshot],
    #[serde(with = "rust_decimal::serde::float")]
    sub_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
    coupon_code: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    coupon_discount: Decimal,
    card_number: &'a str,
    cvv: &'a str,
    expiry: &'a str,
    shipping_address: &'a str,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    order: CreatedOrder,
}

#[derive(Deserialize)]
struct CreatedOrder {
    // gorm.Model casing on the ledger side
    #[serde(rename = "ID")]
    id: OrderId,
}

/// HTTP client for the Order Ledger.
#[derive(Clone)]
pub struct OrderLedgerClient {
    inner: Arc<OrderLedgerClientInner>,
}

struct OrderLedgerClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl OrderLedgerClient {
    /// Create a client for the gateway in `config`.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            inner: Arc::new(OrderLedgerClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            }),
        }
    }
}

#[async_trait]
impl OrderLedger for OrderLedgerClient {
    async fn create(&self, submission: &OrderSubmission) -> Result<OrderId, RemoteError> {
        let url = format!("{}/orders", self.inner.base_url);
        let body = CreateOrderRequest {
            user_id: submission.user_id,
            items: &submission.items,
            sub_total: submission.sub_total,
            total_price: submission.total_price,
            coupon_code: &submission.coupon_code,
            coupon_discount: submission.coupon_discount,
            card_number: submission.payment.card_number.expose_secret(),
            cvv: submission.payment.cvv.expose_secret(),
            expiry: &submission.payment.expiry,
            shipping_address: &submission.shipping_address,
        };

        let response = self.inner.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        Ok(parsed.order.id)
    }
}
