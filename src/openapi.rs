use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{catalog, comments, health, orders, production, shipments};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fulfillment Service",
        version = "0.1.0",
        description = "Order intake from receipt PDFs, production tracking, truck dispatch and bureau acknowledgement. Every endpoint except /health expects the caller's id in the X-User-Id header."
    ),
    paths(
        health::health,
        catalog::list_products,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        orders::create_order,
        orders::import_order,
        orders::list_orders,
        orders::list_archived_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        production::set_line_ready,
        production::validate_production,
        production::worklist,
        shipments::set_line_loaded,
        shipments::depart,
        shipments::acknowledge,
        shipments::pending,
        comments::list_comments,
        comments::post_comment,
        comments::unread_count,
    ),
    components(schemas(
        catalog::CreateProductRequest,
        catalog::UpdateProductRequest,
        catalog::ProductResponse,
        orders::LineRequest,
        orders::CreateOrderRequest,
        orders::UpdateOrderRequest,
        orders::CreateOrderResponse,
        orders::OrderSummaryResponse,
        orders::OrderLineResponse,
        orders::ShipmentLineResponse,
        orders::ShipmentResponse,
        orders::OrderDetailResponse,
        orders::ListOrdersResponse,
        production::SetQuantityRequest,
        production::LineProgressResponse,
        shipments::LoadedLineResponse,
        shipments::DepartureResponse,
        shipments::AcknowledgementResponse,
        shipments::RemainingLineResponse,
        shipments::PendingAcknowledgementResponse,
        comments::PostCommentRequest,
        comments::CommentResponse,
        comments::UnreadCountResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "catalog", description = "Product catalog administration"),
        (name = "orders", description = "Order intake, edition and queries"),
        (name = "production", description = "Ready quantities and production validation"),
        (name = "shipments", description = "Loading, truck departures and bureau acknowledgement"),
        (name = "comments", description = "Per-order comment threads"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}
