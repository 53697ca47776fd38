use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::orders::{OrderSummaryResponse, ShipmentResponse};
use super::production::SetQuantityRequest;
use super::{Actor, Shipping};
use crate::domain::shipment::{LoadedLine, PendingAcknowledgement, RemainingLine};
use crate::errors::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadedLineResponse {
    pub line_id: Uuid,
    pub quantity_loaded: i32,
    /// Ready minus already shipped at the time of the write.
    pub loadable: i32,
}

impl From<LoadedLine> for LoadedLineResponse {
    fn from(l: LoadedLine) -> Self {
        LoadedLineResponse {
            line_id: l.line_id,
            quantity_loaded: l.quantity_loaded,
            loadable: l.loadable,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartureResponse {
    pub shipment: ShipmentResponse,
    pub expedition_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcknowledgementResponse {
    pub acknowledged: usize,
    pub archived: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemainingLineResponse {
    pub product_id: Uuid,
    pub label: String,
    pub quantity_ordered: i32,
    pub quantity_shipped: i32,
    pub quantity_remaining: i32,
}

impl From<RemainingLine> for RemainingLineResponse {
    fn from(r: RemainingLine) -> Self {
        RemainingLineResponse {
            product_id: r.product_id,
            label: r.label,
            quantity_ordered: r.quantity_ordered,
            quantity_shipped: r.quantity_shipped,
            quantity_remaining: r.quantity_remaining,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingAcknowledgementResponse {
    pub order: OrderSummaryResponse,
    pub shipments: Vec<ShipmentResponse>,
    pub remaining: Vec<RemainingLineResponse>,
    pub total_ordered: i64,
    pub total_shipped: i64,
}

impl From<PendingAcknowledgement> for PendingAcknowledgementResponse {
    fn from(p: PendingAcknowledgement) -> Self {
        PendingAcknowledgementResponse {
            order: p.order.into(),
            shipments: p.shipments.into_iter().map(Into::into).collect(),
            remaining: p.remaining.into_iter().map(Into::into).collect(),
            total_ordered: p.total_ordered,
            total_shipped: p.total_shipped,
        }
    }
}

/// PUT /orders/{id}/lines/{line_id}/loaded
///
/// Stages a quantity for the next truck departure.
#[utoipa::path(
    put,
    path = "/orders/{id}/lines/{line_id}/loaded",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("line_id" = Uuid, Path, description = "Order line UUID"),
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Loaded quantity staged", body = LoadedLineResponse),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Order or line not found"),
        (status = 409, description = "More than ready minus shipped, or order archived"),
    ),
    tag = "shipments"
)]
pub async fn set_line_loaded(
    service: web::Data<Shipping>,
    _actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SetQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let (order_id, line_id) = path.into_inner();
    let quantity = body.quantity;

    let loaded = web::block(move || service.set_line_loaded(order_id, line_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LoadedLineResponse::from(loaded)))
}

/// POST /orders/{id}/depart
///
/// Records a truck departure with everything currently loaded.
#[utoipa::path(
    post,
    path = "/orders/{id}/depart",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 201, description = "Shipment created", body = DepartureResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Nothing loaded, or order archived"),
    ),
    tag = "shipments"
)]
pub async fn depart(
    service: web::Data<Shipping>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let departure = web::block(move || service.depart(order_id, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(DepartureResponse {
        shipment: departure.shipment.into(),
        expedition_status: departure.expedition_status.to_string(),
    }))
}

/// POST /orders/{id}/acknowledge
///
/// Bureau acknowledgement of every pending shipment. Archives the order
/// when it is completely shipped.
#[utoipa::path(
    post,
    path = "/orders/{id}/acknowledge",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Shipments acknowledged", body = AcknowledgementResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "No pending shipment, or order already archived"),
    ),
    tag = "shipments"
)]
pub async fn acknowledge(
    service: web::Data<Shipping>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let ack = web::block(move || service.acknowledge(order_id, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(AcknowledgementResponse {
        acknowledged: ack.acknowledged,
        archived: ack.archived,
    }))
}

/// GET /shipments/pending
#[utoipa::path(
    get,
    path = "/shipments/pending",
    responses(
        (status = 200, description = "Active orders with unacknowledged shipments", body = Vec<PendingAcknowledgementResponse>),
    ),
    tag = "shipments"
)]
pub async fn pending(
    service: web::Data<Shipping>,
    _actor: Actor,
) -> Result<HttpResponse, AppError> {
    let pending = web::block(move || service.pending())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<PendingAcknowledgementResponse> = pending.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}
