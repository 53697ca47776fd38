use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{double_option, parse_param, Actor, Orders};
use crate::application::order_service::{LineInput, ManualOrder, OrderPatch, MAX_PAGE_SIZE};
use crate::domain::order::{
    CreateOutcome, ListResult, OrderDetail, OrderFilter, OrderLineView, OrderSummary, Priority,
};
use crate::domain::shipment::{ShipmentLineView, ShipmentView};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct LineRequest {
    /// Id of an existing line; omit for a new line.
    pub id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    /// Exact catalog label, used when `product_id` is omitted.
    pub label: Option<String>,
    pub quantity: i32,
}

impl From<LineRequest> for LineInput {
    fn from(l: LineRequest) -> Self {
        LineInput {
            id: l.id,
            product_id: l.product_id,
            label: l.label,
            quantity: l.quantity,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    /// NORMAL, INTERMEDIAIRE or URGENT. Defaults to NORMAL.
    pub priority: Option<String>,
    pub lines: Vec<LineRequest>,
}

/// Every field is optional. `null` clears `client_name` and `pickup_date`;
/// `lines`, when present, is the full desired line set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub arc: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub client_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub order_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub pickup_date: Option<Option<NaiveDate>>,
    pub priority: Option<String>,
    pub lines: Option<Vec<LineRequest>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub id: Uuid,
    /// `created`, or `skipped` when the ARC already existed.
    pub outcome: String,
}

impl CreateOrderResponse {
    fn into_http(outcome: CreateOutcome) -> HttpResponse {
        match outcome {
            CreateOutcome::Created(id) => HttpResponse::Created().json(CreateOrderResponse {
                id,
                outcome: "created".to_string(),
            }),
            CreateOutcome::Skipped(id) => HttpResponse::Ok().json(CreateOrderResponse {
                id,
                outcome: "skipped".to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: String,
    pub production_status: String,
    pub expedition_status: String,
    /// A_PRODUIRE, EN_PRODUCTION, PRETE, EXP_PARTIELLE or EXP_COMPLETE.
    pub state: String,
    pub production_validated_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(o: OrderSummary) -> Self {
        OrderSummaryResponse {
            state: o.state().to_string(),
            priority: o.priority.to_string(),
            production_status: o.production_status.to_string(),
            expedition_status: o.expedition_status.to_string(),
            id: o.id,
            arc: o.arc,
            client_name: o.client_name,
            order_date: o.order_date,
            pickup_date: o.pickup_date,
            production_validated_at: o.production_validated_at,
            is_archived: o.is_archived,
            created_by: o.created_by,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Current catalog label.
    pub label: String,
    /// Label frozen from the receipt at creation time.
    pub product_label_pdf: Option<String>,
    pub category: String,
    pub quantity_ordered: i32,
    pub quantity_ready: i32,
    pub quantity_shipped: i32,
    pub quantity_loaded: i32,
}

impl From<OrderLineView> for OrderLineResponse {
    fn from(l: OrderLineView) -> Self {
        OrderLineResponse {
            id: l.id,
            product_id: l.product_id,
            label: l.label,
            product_label_pdf: l.product_label_pdf,
            category: l.category.to_string(),
            quantity_ordered: l.quantity_ordered,
            quantity_ready: l.quantity_ready,
            quantity_shipped: l.quantity_shipped,
            quantity_loaded: l.quantity_loaded,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: String,
    pub quantity_loaded: i32,
}

impl From<ShipmentLineView> for ShipmentLineResponse {
    fn from(l: ShipmentLineView) -> Self {
        ShipmentLineResponse {
            id: l.id,
            product_id: l.product_id,
            label: l.label,
            quantity_loaded: l.quantity_loaded,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentResponse {
    pub id: Uuid,
    pub departed_at: DateTime<Utc>,
    pub bureau_ack_at: Option<DateTime<Utc>>,
    pub bureau_ack_by: Option<Uuid>,
    pub lines: Vec<ShipmentLineResponse>,
}

impl From<ShipmentView> for ShipmentResponse {
    fn from(s: ShipmentView) -> Self {
        ShipmentResponse {
            id: s.id,
            departed_at: s.departed_at,
            bureau_ack_at: s.bureau_ack_at,
            bureau_ack_by: s.bureau_ack_by,
            lines: s.lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderSummaryResponse,
    pub lines: Vec<OrderLineResponse>,
    pub shipments: Vec<ShipmentResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        OrderDetailResponse {
            order: d.order.into(),
            lines: d.lines.into_iter().map(Into::into).collect(),
            shipments: d.shipments.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination & filters ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Case-insensitive match on ARC or client name.
    pub search: Option<String>,
    pub priority: Option<String>,
    pub state: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl ListOrdersParams {
    fn into_filter(self) -> Result<OrderFilter, AppError> {
        Ok(OrderFilter {
            priority: parse_param(self.priority.as_deref())?,
            state: parse_param(self.state.as_deref())?,
            search: self.search,
            archived: false,
            page: self.page,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderSummaryResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl ListOrdersResponse {
    fn new(result: ListResult, filter: &OrderFilter) -> Self {
        ListOrdersResponse {
            items: result.items.into_iter().map(Into::into).collect(),
            total: result.total,
            page: filter.page.max(1),
            limit: filter.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates an order with its lines in one transaction. Lines name their
/// product by id or by exact catalog label. An ARC that already exists is
/// answered with 200 and `outcome = skipped`.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 200, description = "ARC already known, nothing written", body = CreateOrderResponse),
        (status = 400, description = "Invalid order"),
        (status = 401, description = "Missing X-User-Id"),
        (status = 404, description = "Unknown product id"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<Orders>,
    actor: Actor,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = ManualOrder {
        priority: parse_param::<Priority>(body.priority.as_deref())?.unwrap_or_default(),
        arc: body.arc,
        client_name: body.client_name,
        order_date: body.order_date,
        pickup_date: body.pickup_date,
        lines: body.lines.into_iter().map(Into::into).collect(),
    };

    let outcome = web::block(move || service.create_manual(input, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(CreateOrderResponse::into_http(outcome))
}

/// POST /orders/import
///
/// Takes the text extracted from an acknowledgement-of-receipt PDF, parses
/// it and creates the order. Every product label must match an active
/// catalog entry exactly.
#[utoipa::path(
    post,
    path = "/orders/import",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 200, description = "ARC already known, nothing written", body = CreateOrderResponse),
        (status = 400, description = "Missing ARC, date or products, or unknown labels"),
        (status = 401, description = "Missing X-User-Id"),
    ),
    tag = "orders"
)]
pub async fn import_order(
    service: web::Data<Orders>,
    actor: Actor,
    body: String,
) -> Result<HttpResponse, AppError> {
    let outcome = web::block(move || service.import_from_text(&body, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(CreateOrderResponse::into_http(outcome))
}

/// GET /orders/{id}
///
/// Returns the order with its lines and shipments.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderDetailResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<Orders>,
    _actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let detail = web::block(move || service.get(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

/// GET /orders
///
/// Active orders, newest first, filtered and paginated.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("search" = Option<String>, Query, description = "Substring of ARC or client name"),
        ("priority" = Option<String>, Query, description = "NORMAL, INTERMEDIAIRE or URGENT"),
        ("state" = Option<String>, Query, description = "A_PRODUIRE, EN_PRODUCTION, PRETE, EXP_PARTIELLE or EXP_COMPLETE"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown priority or state"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<Orders>,
    _actor: Actor,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;
    let for_block = filter.clone();

    let result = web::block(move || service.list(for_block))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(result, &filter)))
}

/// GET /orders/archived
///
/// Order history: acknowledged, fully shipped orders. Same filters as the
/// active list.
#[utoipa::path(
    get,
    path = "/orders/archived",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("search" = Option<String>, Query, description = "Substring of ARC or client name"),
        ("priority" = Option<String>, Query, description = "NORMAL, INTERMEDIAIRE or URGENT"),
    ),
    responses(
        (status = 200, description = "Paginated list of archived orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_archived_orders(
    service: web::Data<Orders>,
    _actor: Actor,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;
    let for_block = filter.clone();

    let result = web::block(move || service.list_archived(for_block))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(result, &filter)))
}

/// PATCH /orders/{id}
///
/// Updates metadata and, when `lines` is given, reconciles the order's
/// lines against it. The whole update is rejected with 409 if it would
/// drop a shipped line or lower a quantity below what is ready or shipped.
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderDetailResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Order or line not found"),
        (status = 409, description = "ARC taken, order archived, or quantities conflict"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    service: web::Data<Orders>,
    _actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let patch = OrderPatch {
        priority: parse_param(body.priority.as_deref())?,
        arc: body.arc,
        client_name: body.client_name,
        order_date: body.order_date,
        pickup_date: body.pickup_date,
        lines: body
            .lines
            .map(|lines| lines.into_iter().map(Into::into).collect()),
    };

    let detail = web::block(move || service.update(order_id, patch))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order deleted with its lines, shipments and comments"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    service: web::Data<Orders>,
    _actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || service.delete(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
