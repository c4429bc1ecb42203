//! Discount Authority and Usage Recorder client.
//!
//! Both concerns live on the coupon service: `/coupons/apply` validates a
//! code against a live order total, `/coupons/use` records a redemption for
//! statistics and limits. One client implements both traits.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use pazar_core::{CouponId, DiscountKind, OrderId, UserId};

use super::{DiscountAuthority, RemoteError, UsageRecorder, error_from_response};
use crate::config::StorefrontConfig;

/// Typed outcome of a validation call.
///
/// The wire body is `{valid, coupon_id, discount_type, discount, message}`;
/// it is parsed into one of these two shapes rather than handed around as
/// an untyped blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The code applies. `amount` is the authoritative discount for the
    /// submitted order total.
    Valid {
        coupon_id: CouponId,
        kind: DiscountKind,
        amount: Decimal,
        message: String,
    },
    /// The code does not apply; `message` is the authority's reason.
    Invalid { message: String },
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    code: &'a str,
    user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    order_total: Decimal,
}

#[derive(Deserialize)]
struct ApplyResponse {
    valid: bool,
    #[serde(default)]
    coupon_id: Option<CouponId>,
    #[serde(default)]
    discount_type: Option<DiscountKind>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    discount: Option<Decimal>,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct UseRequest {
    coupon_id: CouponId,
    user_id: UserId,
    order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    discount: Decimal,
}

/// HTTP client for the coupon service.
#[derive(Clone)]
pub struct CouponServiceClient {
    inner: Arc<CouponServiceClientInner>,
}

struct CouponServiceClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl CouponServiceClient {
    /// Create a client for the gateway in `config`.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CouponServiceClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            }),
        }
    }
}

impl TryFrom<ApplyResponse> for Validation {
    type Error = RemoteError;

    fn try_from(response: ApplyResponse) -> Result<Self, RemoteError> {
        if !response.valid {
            return Ok(Self::Invalid {
                message: response.message,
            });
        }

        let coupon_id = response
            .coupon_id
            .ok_or_else(|| RemoteError::Parse("valid response missing coupon_id".to_string()))?;
        let kind = response.discount_type.ok_or_else(|| {
            RemoteError::Parse("valid response missing discount_type".to_string())
        })?;
        let amount = response
            .discount
            .ok_or_else(|| RemoteError::Parse("valid response missing discount".to_string()))?;

        Ok(Self::Valid {
            coupon_id,
            kind,
            amount,
            message: response.message,
        })
    }
}

#[async_trait]
impl DiscountAuthority for CouponServiceClient {
    async fn validate(
        &self,
        code: &str,
        user_id: UserId,
        order_total: Decimal,
    ) -> Result<Validation, RemoteError> {
        let url = format!("{}/coupons/apply", self.inner.base_url);
        let body = ApplyRequest {
            code,
            user_id,
            order_total,
        };

        let response = self.inner.client.post(url).json(&body).send().await?;

        // The authority answers 200 for "checked, not valid"; only transport
        // and gateway failures arrive as non-success statuses.
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: ApplyResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        parsed.try_into()
    }
}

#[async_trait]
impl UsageRecorder for CouponServiceClient {
    async fn record(
        &self,
        coupon_id: CouponId,
        user_id: UserId,
        order_id: OrderId,
        discount: Decimal,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/coupons/use", self.inner.base_url);
        let body = UseRequest {
            coupon_id,
            user_id,
            order_id,
            discount,
        };

        let response = self.inner.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_response_parses() {
        let raw = serde_json::json!({
            "valid": true,
            "coupon_id": 3,
            "discount_type": "percentage",
            "discount": 100.0,
            "message": "Kupon uygulandı"
        });
        let parsed: ApplyResponse = serde_json::from_value(raw).expect("deserialize");
        let validation = Validation::try_from(parsed).expect("convert");
        assert_eq!(
            validation,
            Validation::Valid {
                coupon_id: CouponId::new(3),
                kind: DiscountKind::Percentage,
                amount: Decimal::from(100),
                message: "Kupon uygulandı".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_response_parses_without_discount_fields() {
        let raw = serde_json::json!({
            "valid": false,
            "message": "minimum not met"
        });
        let parsed: ApplyResponse = serde_json::from_value(raw).expect("deserialize");
        let validation = Validation::try_from(parsed).expect("convert");
        assert_eq!(
            validation,
            Validation::Invalid {
                message: "minimum not met".to_string(),
            }
        );
    }

    #[test]
    fn test_valid_response_missing_amount_is_a_parse_error() {
        let raw = serde_json::json!({
            "valid": true,
            "coupon_id": 3,
            "discount_type": "fixed",
            "message": "ok"
        });
        let parsed: ApplyResponse = serde_json::from_value(raw).expect("deserialize");
        let err = Validation::try_from(parsed).expect_err("must fail");
        assert!(matches!(err, RemoteError::Parse(_)));
    }
}
