mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use storefront_api::entities::{order, payment};

use common::{amount, response_json, TestApp, SARONG_ID, SHIRT_ID};

fn two_line_order() -> Value {
    json!({ "items": [
        { "id": SHIRT_ID, "quantity": 2 },
        { "id": SARONG_ID, "quantity": 1 }
    ]})
}

fn payment_body() -> Value {
    json!({
        "discount": 10,
        "deliveryCost": 20000,
        "deliveryAddress": "Jl. Malioboro 1, Yogyakarta",
        "courier": "JNE REG",
        "finalPrice": 110000
    })
}

async fn place_order(app: &TestApp) -> String {
    let response = app
        .request_authenticated(Method::POST, "/api/v1/orders", Some(two_line_order()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    body["data"][0]["orderId"]
        .as_str()
        .expect("order id in response")
        .to_string()
}

#[tokio::test]
async fn order_lines_share_one_order_id() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::POST, "/api/v1/orders", Some(two_line_order()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    let rows = body["data"].as_array().expect("rows array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["orderId"], rows[1]["orderId"]);
    assert_eq!(rows[0]["itemId"], json!(SHIRT_ID));
    assert_eq!(rows[0]["quantity"], json!(2));
    assert_eq!(rows[1]["itemId"], json!(SARONG_ID));
    assert_eq!(rows[1]["quantity"], json!(1));
    assert_eq!(rows[0]["userId"], json!(common::SHOPPER_ID));
}

#[tokio::test]
async fn orders_require_bearer_token() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(two_line_order()), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(two_line_order()),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_item_stores_nothing() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "items": [
                { "id": SHIRT_ID, "quantity": 1 },
                { "id": 999, "quantity": 1 }
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = order::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn empty_or_zero_quantity_orders_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::POST, "/api/v1/orders", Some(json!({ "items": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "items": [{ "id": SHIRT_ID, "quantity": 0 }] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_is_recorded_unpaid_with_expiry() {
    let app = TestApp::new().await;
    let order_id = place_order(&app).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/payments/{order_id}"),
            Some(payment_body()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let payment = &body["data"];
    assert_eq!(payment["orderId"], json!(order_id));
    assert_eq!(payment["discount"], json!(10));
    assert_eq!(payment["courier"], json!("JNE REG"));
    assert_eq!(payment["statusPayment"], json!(false));
    assert_eq!(payment["active"], json!(true));
    assert_eq!(amount(&payment["finalPrice"]), 110000.0);
    assert_eq!(amount(&payment["deliveryCost"]), 20000.0);

    let expires: DateTime<Utc> = payment["expiredTime"]
        .as_str()
        .unwrap()
        .parse()
        .expect("expiry timestamp");
    let hours_left = (expires - Utc::now()).num_minutes() as f64 / 60.0;
    assert!((23.5..=24.0).contains(&hours_left), "expiry {hours_left}h away");

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/payments/{order_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_payment_leaves_order_without_payment() {
    let app = TestApp::new().await;
    let order_id = place_order(&app).await;

    let mut invalid = payment_body();
    invalid["deliveryAddress"] = json!("");
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/payments/{order_id}"),
            Some(invalid),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = response_json(response).await;
    assert!(error["message"].as_str().is_some());

    // The order created by the first call stays behind
    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/payments/{order_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let payments = payment::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(payments, 0);
}

#[tokio::test]
async fn payment_needs_an_order_owned_by_caller() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/payments/{}", uuid::Uuid::new_v4()),
            Some(payment_body()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let order_id = place_order(&app).await;
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/payments/{order_id}"),
            Some(payment_body()),
            Some(app.other_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_active_payment_conflicts() {
    let app = TestApp::new().await;
    let order_id = place_order(&app).await;
    let uri = format!("/api/v1/payments/{order_id}");

    let first = app
        .request_authenticated(Method::POST, &uri, Some(payment_body()))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .request_authenticated(Method::POST, &uri, Some(payment_body()))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn orders_are_private_except_to_admins() {
    let app = TestApp::new().await;
    let order_id = place_order(&app).await;
    let uri = format!("/api/v1/orders/{order_id}");

    let response = app.request(Method::GET, &uri, None, Some(app.other_token())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::GET, &uri, None, Some(app.admin_token())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some(app.other_token()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_stores_order_and_payment_together() {
    let app = TestApp::new().await;

    let mut body = payment_body();
    body["items"] = two_line_order()["items"].clone();
    let response = app
        .request_authenticated(Method::POST, "/api/v1/checkout", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let result = response_json(response).await;
    let order_id = result["data"]["orderId"].clone();
    assert_eq!(result["data"]["orders"].as_array().unwrap().len(), 2);
    assert_eq!(result["data"]["payment"]["orderId"], order_id);
}

#[tokio::test]
async fn checkout_rolls_back_when_payment_is_invalid() {
    let app = TestApp::new().await;

    let mut body = payment_body();
    body["items"] = two_line_order()["items"].clone();
    body["finalPrice"] = json!(-5);
    let response = app
        .request_authenticated(Method::POST, "/api/v1/checkout", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = payment_body();
    body["items"] = json!([{ "id": SHIRT_ID, "quantity": 1 }, { "id": 404, "quantity": 1 }]);
    let response = app
        .request_authenticated(Method::POST, "/api/v1/checkout", Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let db = app.state.db.as_ref();
    assert_eq!(order::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(payment::Entity::find().count(db).await.unwrap(), 0);
}
