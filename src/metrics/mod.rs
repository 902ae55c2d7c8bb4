/*!
 * # Metrics
 *
 * Business counters for the storefront, registered in a process-wide
 * Prometheus registry and rendered in text format at `/metrics`.
 */

use axum::{http::header, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{core::Collector, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ORDERS_CREATED: IntCounter = registered(
        IntCounter::new("orders_created_total", "Total number of orders created")
            .expect("metric can be created")
    );
    pub static ref ORDER_LINES_CREATED: IntCounter = registered(
        IntCounter::new(
            "order_lines_created_total",
            "Total number of order rows written"
        )
        .expect("metric can be created")
    );
    pub static ref PAYMENTS_CREATED: IntCounter = registered(
        IntCounter::new("payments_created_total", "Total number of payments recorded")
            .expect("metric can be created")
    );
    pub static ref CHECKOUTS_COMPLETED: IntCounter = registered(
        IntCounter::new(
            "checkouts_completed_total",
            "Total number of transactional checkouts committed"
        )
        .expect("metric can be created")
    );
    pub static ref VOUCHER_LOOKUPS: IntCounterVec = registered(
        IntCounterVec::new(
            Opts::new("voucher_lookups_total", "Voucher lookups by outcome"),
            &["outcome"]
        )
        .expect("metric can be created")
    );
    pub static ref SHIPPING_REQUESTS: IntCounterVec = registered(
        IntCounterVec::new(
            Opts::new(
                "shipping_provider_requests_total",
                "Calls to the shipping provider by operation and outcome"
            ),
            &["operation", "outcome"]
        )
        .expect("metric can be created")
    );
}

fn registered<C>(collector: C) -> C
where
    C: Collector + Clone + 'static,
{
    if let Err(e) = REGISTRY.register(Box::new(collector.clone())) {
        warn!(error = %e, "Failed to register metric collector");
    }
    collector
}

/// Labels for success/failure counters
pub fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

/// Renders every registered metric in Prometheus text format
pub fn render() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics are not UTF-8: {}", e)))
}

pub async fn metrics_handler() -> Result<impl IntoResponse, ServiceError> {
    let body = render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_contains_business_counters() {
        ORDERS_CREATED.inc();
        VOUCHER_LOOKUPS.with_label_values(&[outcome(true)]).inc();

        let text = render().unwrap();
        assert!(text.contains("orders_created_total"));
        assert!(text.contains("voucher_lookups_total{outcome=\"success\"}"));
    }
}
