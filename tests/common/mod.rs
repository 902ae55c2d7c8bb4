#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::AuthService,
    config::AppConfig,
    db,
    entities::{item, user, voucher},
    errors::ServiceError,
    handlers::AppServices,
    services::shipping::{CityOption, CourierOption, ShippingProvider},
    AppState,
};
use tower::ServiceExt;

pub const SHOPPER_ID: i32 = 1;
pub const OTHER_SHOPPER_ID: i32 = 2;
pub const ADMIN_ID: i32 = 3;

pub const SHIRT_ID: i32 = 1;
pub const SARONG_ID: i32 = 2;

/// Fixed destinations and quotes so tests never reach RajaOngkir
pub struct StubShipping;

#[async_trait]
impl ShippingProvider for StubShipping {
    async fn cities(&self) -> Result<Vec<CityOption>, ServiceError> {
        Ok(vec![
            CityOption {
                value: "501".into(),
                label: "Yogyakarta".into(),
            },
            CityOption {
                value: "151".into(),
                label: "Jakarta Barat".into(),
            },
        ])
    }

    async fn courier_costs(
        &self,
        destination: &str,
        weight_grams: u32,
    ) -> Result<Vec<CourierOption>, ServiceError> {
        if destination == "0" {
            return Err(ServiceError::ExternalServiceError(
                "Invalid destination".to_string(),
            ));
        }
        // 10k per started kilogram keeps the numbers easy to assert on
        let kilos = Decimal::from(weight_grams.div_ceil(1000));
        Ok(vec![CourierOption {
            name: "JNE REG".into(),
            description: Some("Layanan Reguler".into()),
            cost: kilos * dec!(10000),
            etd: Some("1-2".into()),
        }])
    }
}

/// Application state backed by an in-memory SQLite database with seeded
/// users, items and vouchers.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    shopper_token: String,
    other_token: String,
    admin_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "integration_test_secret_key_that_is_long_enough_for_hs256_signing_0123456789"
                .to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let auth = Arc::new(AuthService::new((&cfg).into()));
        let services = AppServices::new(db_arc.clone(), &cfg, Arc::new(StubShipping));
        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
            auth: auth.clone(),
        };

        seed(&state).await;

        let token = |id: i32, roles: &[&str]| {
            auth.issue_token(
                id,
                Some(format!("user-{id}")),
                None,
                roles.iter().map(|r| r.to_string()).collect(),
            )
            .expect("issue test token")
        };

        Self {
            router: storefront_api::build_router(state.clone()).expect("router builds"),
            shopper_token: token(SHOPPER_ID, &[user::ROLE_USER]),
            other_token: token(OTHER_SHOPPER_ID, &[user::ROLE_USER]),
            admin_token: token(ADMIN_ID, &[user::ROLE_USER, user::ROLE_ADMIN]),
            state,
        }
    }

    pub fn shopper_token(&self) -> &str {
        &self.shopper_token
    }

    pub fn other_token(&self) -> &str {
        &self.other_token
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests made as the default shopper.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.shopper_token()))
            .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// Decimal fields travel as strings; compare them numerically
pub fn amount(value: &Value) -> f64 {
    value
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .or_else(|| value.as_f64())
        .expect("numeric amount")
}

async fn seed(state: &AppState) {
    let db = state.db.as_ref();

    for (id, name, role) in [
        (SHOPPER_ID, "Sari", user::ROLE_USER),
        (OTHER_SHOPPER_ID, "Budi", user::ROLE_USER),
        (ADMIN_ID, "Admin", user::ROLE_ADMIN),
    ] {
        user::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            email: Set(format!("{}@example.com", name.to_lowercase())),
            role: Set(role.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed user");
    }

    for (id, name, price) in [
        (SHIRT_ID, "Batik Shirt", dec!(25000)),
        (SARONG_ID, "Sarong", dec!(50000)),
    ] {
        item::ActiveModel {
            id: Set(id),
            category_id: Set(None),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            stock: Set(10),
            weight: Set(1000),
            image_url: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed item");
    }

    let now = Utc::now();
    for (code, discount, active, expires_at) in [
        ("DISKON10", 10, true, None),
        ("OLD", 25, true, Some(now - Duration::days(1))),
        ("PAUSED", 15, false, None),
    ] {
        voucher::ActiveModel {
            code: Set(code.to_string()),
            discount: Set(discount),
            active: Set(active),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed voucher");
    }
}
