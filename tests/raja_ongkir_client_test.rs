use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::{
    config::ShippingConfig,
    errors::ServiceError,
    services::shipping::{RajaOngkirClient, ShippingProvider},
};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const API_KEY: &str = "test-key";

fn client_for(server: &MockServer) -> RajaOngkirClient {
    let config = ShippingConfig {
        base_url: server.uri(),
        api_key: API_KEY.to_string(),
        origin_city: "501".to_string(),
        couriers: vec!["jne".to_string()],
        ..ShippingConfig::default()
    };
    RajaOngkirClient::new(&config).expect("client builds")
}

#[tokio::test]
async fn cities_are_mapped_to_value_label_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/city"))
        .and(header("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rajaongkir": {
                "status": { "code": 200, "description": "OK" },
                "results": [
                    { "city_id": "501", "province_id": "5", "type": "Kota", "city_name": "Yogyakarta" },
                    { "city_id": "151", "province_id": "6", "type": "Kota", "city_name": "Jakarta Barat" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cities = client_for(&server).cities().await.unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].value, "501");
    assert_eq!(cities[0].label, "Yogyakarta");
    assert_eq!(cities[1].label, "Jakarta Barat");
}

#[tokio::test]
async fn courier_costs_post_a_form_and_take_the_first_quote() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cost"))
        .and(header("key", API_KEY))
        .and(body_string_contains("origin=501"))
        .and(body_string_contains("destination=151"))
        .and(body_string_contains("weight=2000"))
        .and(body_string_contains("courier=jne"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rajaongkir": {
                "status": { "code": 200, "description": "OK" },
                "results": [{
                    "code": "jne",
                    "name": "Jalur Nugraha Ekakurir (JNE)",
                    "costs": [
                        {
                            "service": "OKE",
                            "description": "Ongkos Kirim Ekonomis",
                            "cost": [{ "value": 18000, "etd": "2-3", "note": "" }]
                        },
                        {
                            "service": "REG",
                            "description": "Layanan Reguler",
                            "cost": [
                                { "value": 22000, "etd": "1-2", "note": "" },
                                { "value": 99000, "etd": "", "note": "" }
                            ]
                        },
                        { "service": "YES", "description": "Yakin Esok Sampai", "cost": [] }
                    ]
                }]
            }
        })))
        .mount(&server)
        .await;

    let options = client_for(&server).courier_costs("151", 2000).await.unwrap();
    assert_eq!(options.len(), 2);

    assert_eq!(options[0].name, "JNE OKE");
    assert_eq!(options[0].cost, dec!(18000));

    let regular = &options[1];
    assert_eq!(regular.name, "JNE REG");
    assert_eq!(regular.description.as_deref(), Some("Layanan Reguler"));
    assert_eq!(regular.cost, dec!(22000));
    assert_eq!(regular.etd.as_deref(), Some("1-2"));
}

#[tokio::test]
async fn provider_rejection_surfaces_its_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cost"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "rajaongkir": {
                "status": { "code": 400, "description": "Invalid key." }
            }
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).courier_costs("151", 1000).await;
    assert_matches!(
        result,
        Err(ServiceError::ExternalServiceError(ref message)) if message == "Invalid key."
    );
}

#[tokio::test]
async fn unreadable_response_is_an_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/city"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).cities().await;
    assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));
}
