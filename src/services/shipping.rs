//! Destination and courier-cost lookups against RajaOngkir.

use crate::{
    config::ShippingConfig,
    errors::ServiceError,
    metrics::{outcome, SHIPPING_REQUESTS},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// A destination city in select-box form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CityOption {
    /// Provider city id
    #[schema(example = "501")]
    pub value: String,
    /// Human readable city name
    #[schema(example = "Yogyakarta")]
    pub label: String,
}

/// One quoted delivery service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourierOption {
    /// Courier and service, e.g. "JNE REG"
    #[schema(example = "JNE REG")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Delivery cost for the whole parcel
    pub cost: Decimal,
    /// Estimated days in transit as reported by the courier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CourierCostRequest {
    /// Destination city id
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    /// Parcel weight in grams
    #[validate(range(min = 1, message = "Weight must be at least 1 gram"))]
    pub weight: u32,
}

/// Source of shipping destinations and courier quotes
#[async_trait]
pub trait ShippingProvider: Send + Sync {
    async fn cities(&self) -> Result<Vec<CityOption>, ServiceError>;

    async fn courier_costs(
        &self,
        destination: &str,
        weight_grams: u32,
    ) -> Result<Vec<CourierOption>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    rajaongkir: Body<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Body<T> {
    status: Status,
    #[serde(default)]
    results: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Status {
    code: u16,
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    city_id: String,
    city_name: String,
}

#[derive(Debug, Deserialize)]
struct RawCourier {
    code: String,
    #[serde(default)]
    costs: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    service: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    cost: Vec<RawCost>,
}

#[derive(Debug, Deserialize)]
struct RawCost {
    value: Decimal,
    #[serde(default)]
    etd: Option<String>,
}

/// RajaOngkir HTTP client
#[derive(Clone)]
pub struct RajaOngkirClient {
    client: Client,
    base_url: String,
    api_key: String,
    origin_city: String,
    couriers: Vec<String>,
}

impl RajaOngkirClient {
    pub fn new(config: &ShippingConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            origin_city: config.origin_city.clone(),
            couriers: config.couriers.clone(),
        })
    }

    async fn decode<T>(operation: &'static str, response: Response) -> Result<T, ServiceError>
    where
        T: serde::de::DeserializeOwned,
    {
        let http_status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            error!(operation, status = %http_status, error = %e, "Unreadable shipping provider response");
            SHIPPING_REQUESTS.with_label_values(&[operation, outcome(false)]).inc();
            ServiceError::ExternalServiceError(format!(
                "Shipping provider returned an unreadable response ({})",
                http_status
            ))
        })?;

        let status = envelope.rajaongkir.status;
        match envelope.rajaongkir.results {
            Some(results) if http_status.is_success() && status.code == 200 => {
                SHIPPING_REQUESTS.with_label_values(&[operation, outcome(true)]).inc();
                Ok(results)
            }
            _ => {
                error!(operation, code = status.code, description = %status.description, "Shipping provider rejected request");
                SHIPPING_REQUESTS.with_label_values(&[operation, outcome(false)]).inc();
                Err(ServiceError::ExternalServiceError(status.description))
            }
        }
    }

    fn transport_error(operation: &'static str, e: reqwest::Error) -> ServiceError {
        error!(operation, error = %e, "Shipping provider unreachable");
        SHIPPING_REQUESTS.with_label_values(&[operation, outcome(false)]).inc();
        ServiceError::ExternalServiceError("Shipping provider unreachable".to_string())
    }
}

#[async_trait]
impl ShippingProvider for RajaOngkirClient {
    #[instrument(skip(self))]
    async fn cities(&self) -> Result<Vec<CityOption>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/city", self.base_url))
            .header("key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::transport_error("cities", e))?;

        let raw: Vec<RawCity> = Self::decode("cities", response).await?;
        Ok(raw
            .into_iter()
            .map(|city| CityOption {
                value: city.city_id,
                label: city.city_name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn courier_costs(
        &self,
        destination: &str,
        weight_grams: u32,
    ) -> Result<Vec<CourierOption>, ServiceError> {
        let mut options = Vec::new();
        for courier in &self.couriers {
            let weight = weight_grams.to_string();
            let form = [
                ("origin", self.origin_city.as_str()),
                ("destination", destination),
                ("weight", weight.as_str()),
                ("courier", courier.as_str()),
            ];
            let response = self
                .client
                .post(format!("{}/cost", self.base_url))
                .header("key", &self.api_key)
                .form(&form)
                .send()
                .await
                .map_err(|e| Self::transport_error("costs", e))?;

            let raw: Vec<RawCourier> = Self::decode("costs", response).await?;
            for carrier in raw {
                for service in carrier.costs {
                    // The first quote is the one the courier charges for this service
                    if let Some(quote) = service.cost.into_iter().next() {
                        options.push(CourierOption {
                            name: format!("{} {}", carrier.code.to_uppercase(), service.service),
                            description: service.description,
                            cost: quote.value,
                            etd: quote.etd.filter(|etd| !etd.is_empty()),
                        });
                    }
                }
            }
        }
        debug!(destination, weight_grams, quotes = options.len(), "Courier quotes fetched");
        Ok(options)
    }
}

/// Shipping lookups with the destination list memoized per process
#[derive(Clone)]
pub struct ShippingService {
    provider: Arc<dyn ShippingProvider>,
    cities: Arc<RwLock<Option<Vec<CityOption>>>>,
}

impl ShippingService {
    pub fn new(provider: Arc<dyn ShippingProvider>) -> Self {
        Self {
            provider,
            cities: Arc::new(RwLock::new(None)),
        }
    }

    #[instrument(skip(self))]
    pub async fn cities(&self) -> Result<Vec<CityOption>, ServiceError> {
        if let Some(cached) = self.cities.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let fetched = self.provider.cities().await?;
        info!(count = fetched.len(), "Destination list loaded");
        *self.cities.write().await = Some(fetched.clone());
        Ok(fetched)
    }

    #[instrument(skip(self))]
    pub async fn courier_costs(
        &self,
        request: CourierCostRequest,
    ) -> Result<Vec<CourierOption>, ServiceError> {
        request.validate()?;
        self.provider
            .courier_costs(request.destination.trim(), request.weight)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ShippingProvider for CountingProvider {
        async fn cities(&self) -> Result<Vec<CityOption>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CityOption {
                value: "501".into(),
                label: "Yogyakarta".into(),
            }])
        }

        async fn courier_costs(
            &self,
            _destination: &str,
            _weight_grams: u32,
        ) -> Result<Vec<CourierOption>, ServiceError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn city_list_is_fetched_once() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = ShippingService::new(provider.clone());

        assert_eq!(service.cities().await.unwrap().len(), 1);
        assert_eq!(service.cities().await.unwrap().len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_weight_is_rejected_before_calling_provider() {
        let service = ShippingService::new(Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        }));
        let result = service
            .courier_costs(CourierCostRequest {
                destination: "501".into(),
                weight: 0,
            })
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}
