//! Cart Store client.
//!
//! The cart service keys carts by user id and stores bare
//! `{product_id, quantity}` lines. Quantity posts are deltas: the service
//! adds them to the existing line and drops lines that reach zero.

use async_trait::async_trait;
use std::sync::Arc;

use pazar_core::{CartLine, ProductId};

use super::{CartStore, RemoteError, error_from_response};
use crate::config::StorefrontConfig;
use crate::session::Session;

/// HTTP client for the remote Cart Store.
#[derive(Clone)]
pub struct CartStoreClient {
    inner: Arc<CartStoreClientInner>,
}

struct CartStoreClientInner {
    client: reqwest::Client,
    base_url: String,
}

#[derive(serde::Serialize)]
struct AdjustRequest {
    product_id: ProductId,
    /// Signed delta, not an absolute quantity.
    quantity: i32,
}

impl CartStoreClient {
    /// Create a client for the gateway in `config`.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CartStoreClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            }),
        }
    }

    fn cart_url(&self, session: &Session) -> String {
        format!("{}/cart/{}", self.inner.base_url, session.user_id)
    }
}

#[async_trait]
impl CartStore for CartStoreClient {
    async fn fetch_lines(&self, session: &Session) -> Result<Vec<CartLine>, RemoteError> {
        let response = self
            .inner
            .client
            .get(self.cart_url(session))
            .bearer_auth(session.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        // An empty cart comes back as JSON null.
        let lines: Option<Vec<CartLine>> = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        Ok(lines.unwrap_or_default())
    }

    async fn adjust(
        &self,
        session: &Session,
        product_id: ProductId,
        delta: i32,
    ) -> Result<(), RemoteError> {
        let body = AdjustRequest {
            product_id,
            quantity: delta,
        };
        let response = self
            .inner
            .client
            .post(self.cart_url(session))
            .bearer_auth(session.token())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn remove_line(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/{product_id}", self.cart_url(session));
        let response = self
            .inner
            .client
            .delete(url)
            .bearer_auth(session.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn clear(&self, session: &Session) -> Result<(), RemoteError> {
        let response = self
            .inner
            .client
            .delete(self.cart_url(session))
            .bearer_auth(session.token())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}
