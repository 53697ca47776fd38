use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    order_comment_reads, order_comments, order_events_outbox, order_products, orders,
    products_catalog, shipment_lines, shipments,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: String,
    pub production_status: String,
    pub expedition_status: String,
    pub production_validated_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderMetadataChangeset {
    pub arc: Option<String>,
    pub client_name: Option<Option<String>>,
    pub order_date: Option<NaiveDate>,
    pub pickup_date: Option<Option<NaiveDate>>,
    pub priority: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_products)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderProductRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_ordered: i32,
    pub quantity_ready: i32,
    pub quantity_shipped: i32,
    pub quantity_loaded: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_products)]
pub struct NewOrderProductRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_ordered: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products_catalog)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub pdf_label_exact: String,
    pub category: String,
    pub weight_per_unit_kg: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products_catalog)]
pub struct NewProductRow {
    pub id: Uuid,
    pub pdf_label_exact: String,
    pub category: String,
    pub weight_per_unit_kg: BigDecimal,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = products_catalog)]
pub struct ProductChangeset {
    pub pdf_label_exact: Option<String>,
    pub category: Option<String>,
    pub weight_per_unit_kg: Option<BigDecimal>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = shipments)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShipmentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub departed_at: DateTime<Utc>,
    pub bureau_ack_at: Option<DateTime<Utc>>,
    pub bureau_ack_by: Option<Uuid>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipments)]
pub struct NewShipmentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub departed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = shipment_lines)]
#[diesel(belongs_to(ShipmentRow, foreign_key = shipment_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShipmentLineRow {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_loaded: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipment_lines)]
pub struct NewShipmentLineRow {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_loaded: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_comments)]
pub struct NewCommentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_comment_reads)]
pub struct CommentReadRow {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub last_read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_events_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_events_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
