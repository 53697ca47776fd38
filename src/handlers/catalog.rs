use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{parse_param, Actor, Catalog};
use crate::domain::catalog::{NewProduct, Product, ProductCategory, ProductUpdate};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Exact label as printed on receipts.
    pub label: String,
    /// BIGBAG, ROCHE or AUTRE.
    pub category: String,
    /// Decimal weight as a string to avoid floating-point issues, e.g. "1000.5"
    pub weight_per_unit_kg: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub label: Option<String>,
    pub category: Option<String>,
    pub weight_per_unit_kg: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub label: String,
    pub category: String,
    pub weight_per_unit_kg: String,
    pub is_active: bool,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            label: p.label,
            category: p.category.to_string(),
            weight_per_unit_kg: p.weight_per_unit_kg.to_string(),
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    #[serde(default)]
    pub include_inactive: bool,
}

fn parse_weight(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid weight_per_unit_kg '{}': {}", raw, e)))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("include_inactive" = Option<bool>, Query, description = "Also list deactivated products"),
    ),
    responses(
        (status = 200, description = "Catalog ordered by label", body = Vec<ProductResponse>),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    service: web::Data<Catalog>,
    _actor: Actor,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let include_inactive = query.include_inactive;

    let products = web::block(move || service.list(include_inactive))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid label, category or weight"),
        (status = 409, description = "Label already used"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    service: web::Data<Catalog>,
    _actor: Actor,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        category: body.category.trim().parse::<ProductCategory>()?,
        weight_per_unit_kg: parse_weight(&body.weight_per_unit_kg)?,
        label: body.label,
    };

    let created = web::block(move || service.create(product))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

/// PATCH /products/{id}
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid label, category or weight"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Label already used"),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    service: web::Data<Catalog>,
    _actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let update = ProductUpdate {
        label: body.label,
        category: parse_param(body.category.as_deref())?,
        weight_per_unit_kg: body
            .weight_per_unit_kg
            .as_deref()
            .map(parse_weight)
            .transpose()?,
        is_active: body.is_active,
    };

    let updated = web::block(move || service.update(product_id, update))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

/// DELETE /products/{id}
///
/// Only products no order ever referenced can be deleted; deactivate the
/// others instead.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product referenced by orders"),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    service: web::Data<Catalog>,
    _actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    web::block(move || service.delete(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
