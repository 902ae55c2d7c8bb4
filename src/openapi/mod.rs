use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

Backend of a small online shop: catalog, per-user cart, vouchers, RajaOngkir
shipping quotes, orders and payments.

## Authentication

Order, payment, cart and checkout endpoints need a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Catalog reads, voucher lookups and shipping quotes are public.

## Error Handling

Failed requests return a JSON error body with the matching HTTP status:

```json
{
  "error": "Not Found",
  "message": "Not found: Voucher NOPE not found",
  "request_id": "7f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "orders", description = "Order creation and lookup"),
        (name = "payments", description = "Payments recorded against orders"),
        (name = "checkout", description = "Transactional order plus payment"),
        (name = "cart", description = "Per-user shopping cart"),
        (name = "catalog", description = "Items and categories"),
        (name = "vouchers", description = "Voucher lookups"),
        (name = "shipping", description = "RajaOngkir destinations and courier quotes")
    ),
    paths(
        // Shipping
        crate::handlers::shipping::list_cities,
        crate::handlers::shipping::courier_costs,

        // Vouchers
        crate::handlers::vouchers::get_voucher,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,

        // Payments
        crate::handlers::payments::create_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_payment,

        // Checkout
        crate::handlers::checkout::checkout,

        // Cart
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_item,
        crate::handlers::cart::update_item,
        crate::handlers::cart::remove_item,
        crate::handlers::cart::clear_cart,

        // Catalog
        crate::handlers::catalog::list_items,
        crate::handlers::catalog::get_item,
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::create_category,
        crate::handlers::catalog::update_category,
        crate::handlers::catalog::delete_category,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,

            // Request types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderLineRequest,
            crate::services::payments::CreatePaymentRequest,
            crate::services::commerce::checkout::CheckoutRequest,
            crate::services::commerce::cart_sessions::AddCartItemRequest,
            crate::services::commerce::cart_sessions::UpdateCartItemRequest,
            crate::services::shipping::CourierCostRequest,
            crate::services::catalog::CategoryRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
