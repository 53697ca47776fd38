use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::orders::OrderSummaryResponse;
use super::{Actor, Production};
use crate::domain::order::LineProgress;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineProgressResponse {
    pub line_id: Uuid,
    pub quantity_ready: i32,
    /// Order-level status recomputed after the write.
    pub production_status: String,
}

impl From<LineProgress> for LineProgressResponse {
    fn from(p: LineProgress) -> Self {
        LineProgressResponse {
            line_id: p.line_id,
            quantity_ready: p.quantity_ready,
            production_status: p.production_status.to_string(),
        }
    }
}

/// PUT /orders/{id}/lines/{line_id}/ready
#[utoipa::path(
    put,
    path = "/orders/{id}/lines/{line_id}/ready",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("line_id" = Uuid, Path, description = "Order line UUID"),
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Ready quantity stored", body = LineProgressResponse),
        (status = 400, description = "Negative or above the ordered quantity"),
        (status = 404, description = "Order or line not found"),
        (status = 409, description = "Below the shipped quantity, or order archived"),
    ),
    tag = "production"
)]
pub async fn set_line_ready(
    service: web::Data<Production>,
    _actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SetQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let (order_id, line_id) = path.into_inner();
    let quantity = body.quantity;

    let progress = web::block(move || service.set_line_ready(order_id, line_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LineProgressResponse::from(progress)))
}

/// POST /orders/{id}/production/validate
///
/// Marks a fully produced order as validated, which takes it off the
/// production worklist.
#[utoipa::path(
    post,
    path = "/orders/{id}/production/validate",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Production validated", body = OrderSummaryResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Production incomplete or already validated"),
    ),
    tag = "production"
)]
pub async fn validate_production(
    service: web::Data<Production>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.validate(order_id, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderSummaryResponse::from(order)))
}

/// GET /production/worklist
#[utoipa::path(
    get,
    path = "/production/worklist",
    responses(
        (status = 200, description = "Active orders awaiting production validation, most urgent first", body = Vec<OrderSummaryResponse>),
    ),
    tag = "production"
)]
pub async fn worklist(
    service: web::Data<Production>,
    _actor: Actor,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.worklist())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderSummaryResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}
