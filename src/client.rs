//! HTTP client for the storefront API.
//!
//! [`StorefrontApi`] is the seam the checkout flow talks through; the
//! production implementation is [`HttpStorefrontClient`]. Non-2xx responses
//! are surfaced as [`ClientError::Api`] with the server's error body kept
//! verbatim so callers can display exactly what the server said.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    entities::{
        item::Model as ItemModel, order::Model as OrderModel, payment::Model as PaymentModel,
    },
    services::{
        commerce::checkout::{CheckoutRequest, CheckoutResult},
        orders::CreateOrderRequest,
        payments::CreatePaymentRequest,
        shipping::{CityOption, CourierCostRequest, CourierOption},
        vouchers::VoucherDiscount,
    },
    ApiResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("server responded {status}: {payload}")]
    Api { status: u16, payload: Value },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// The server's own message when it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { payload, .. } => payload
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| payload.as_str()),
            _ => None,
        }
    }
}

/// Storefront operations used by the checkout flow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn item(&self, id: i32) -> Result<ItemModel, ClientError>;

    async fn cities(&self) -> Result<Vec<CityOption>, ClientError>;

    async fn voucher(&self, code: &str) -> Result<VoucherDiscount, ClientError>;

    async fn courier_costs(
        &self,
        request: &CourierCostRequest,
    ) -> Result<Vec<CourierOption>, ClientError>;

    async fn create_order(&self, request: &CreateOrderRequest)
        -> Result<Vec<OrderModel>, ClientError>;

    async fn create_payment(
        &self,
        order_id: Uuid,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentModel, ClientError>;

    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResult, ClientError>;
}

/// reqwest-backed [`StorefrontApi`]
#[derive(Clone)]
pub struct HttpStorefrontClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpStorefrontClient {
    /// `base_url` points at the versioned API root, e.g. `http://localhost:8080/api/v1`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T>(&self, builder: RequestBuilder) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let payload = serde_json::from_slice::<Value>(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
            warn!(status = status.as_u16(), "Storefront request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                payload,
            });
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        debug!(status = status.as_u16(), "Storefront request succeeded");
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response envelope carried no data".to_string()))
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontClient {
    async fn item(&self, id: i32) -> Result<ItemModel, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["items", id.as_str()])?;
        self.send(self.client.get(url)).await
    }

    async fn cities(&self) -> Result<Vec<CityOption>, ClientError> {
        let url = self.endpoint(&["raja-ongkir", "cities"])?;
        self.send(self.client.get(url)).await
    }

    async fn voucher(&self, code: &str) -> Result<VoucherDiscount, ClientError> {
        let url = self.endpoint(&["vouchers", code])?;
        self.send(self.client.get(url)).await
    }

    async fn courier_costs(
        &self,
        request: &CourierCostRequest,
    ) -> Result<Vec<CourierOption>, ClientError> {
        let url = self.endpoint(&["raja-ongkir", "costs"])?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Vec<OrderModel>, ClientError> {
        let url = self.endpoint(&["orders"])?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn create_payment(
        &self,
        order_id: Uuid,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentModel, ClientError> {
        let order_id = order_id.to_string();
        let url = self.endpoint(&["payments", order_id.as_str()])?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResult, ClientError> {
        let url = self.endpoint(&["checkout"])?;
        self.send(self.client.post(url).json(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_escapes_path_segments() {
        let client =
            HttpStorefrontClient::new("http://localhost:8080/api/v1/", None, Duration::from_secs(1))
                .unwrap();
        let url = client.endpoint(&["vouchers", "A B/C"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/vouchers/A%20B%2FC");
    }

    #[test]
    fn server_message_reads_error_body() {
        let err = ClientError::Api {
            status: 404,
            payload: serde_json::json!({"error": "Not Found", "message": "Not found: Voucher X not found"}),
        };
        assert_eq!(err.server_message(), Some("Not found: Voucher X not found"));
    }
}
