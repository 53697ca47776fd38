use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::order::{ExpeditionStatus, OrderSummary};

#[derive(Debug, Clone)]
pub struct ShipmentLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: String,
    pub quantity_loaded: i32,
}

#[derive(Debug, Clone)]
pub struct ShipmentView {
    pub id: Uuid,
    pub departed_at: DateTime<Utc>,
    pub bureau_ack_at: Option<DateTime<Utc>>,
    pub bureau_ack_by: Option<Uuid>,
    pub lines: Vec<ShipmentLineView>,
}

#[derive(Debug, Clone)]
pub struct LoadedLine {
    pub line_id: Uuid,
    pub quantity_loaded: i32,
    /// Upper bound at write time: ready minus already shipped.
    pub loadable: i32,
}

#[derive(Debug, Clone)]
pub struct Departure {
    pub shipment: ShipmentView,
    pub expedition_status: ExpeditionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub acknowledged: usize,
    pub archived: bool,
}

#[derive(Debug, Clone)]
pub struct RemainingLine {
    pub product_id: Uuid,
    pub label: String,
    pub quantity_ordered: i32,
    pub quantity_shipped: i32,
    pub quantity_remaining: i32,
}

/// An active order waiting for the bureau to acknowledge its shipments.
#[derive(Debug, Clone)]
pub struct PendingAcknowledgement {
    pub order: OrderSummary,
    pub shipments: Vec<ShipmentView>,
    pub remaining: Vec<RemainingLine>,
    pub total_ordered: i64,
    pub total_shipped: i64,
}
