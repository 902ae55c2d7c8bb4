use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::common::{created_response, no_content_response, success_response, Enveloped};
use crate::{
    auth::AdminUser,
    entities::{category::Model as Category, item::Model as Item},
    errors::ServiceError,
    services::catalog::{CategoryRequest, ItemFilter},
    ApiResponse, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/items",
    summary = "List items",
    params(ItemFilter),
    responses((status = 200, description = "Items retrieved successfully", body = ApiResponse<Vec<Item>>)),
    tag = "catalog"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<Enveloped<Vec<Item>>, ServiceError> {
    let items = state.services.catalog.list_items(filter).await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    summary = "Get item",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item retrieved successfully", body = ApiResponse<Item>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Enveloped<Item>, ServiceError> {
    let item = state.services.catalog.get_item(id).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    responses((status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<Category>>)),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Enveloped<Vec<Category>>, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    summary = "Create category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CategoryRequest>,
) -> Result<Enveloped<Category>, ServiceError> {
    let category = state.services.catalog.create_category(request).await?;
    Ok(created_response(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    summary = "Rename category",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<CategoryRequest>,
) -> Result<Enveloped<Category>, ServiceError> {
    let category = state.services.catalog.update_category(id, request).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    summary = "Delete category",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.delete_category(id).await?;
    Ok(no_content_response())
}
