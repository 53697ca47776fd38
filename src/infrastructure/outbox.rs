use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::order_events_outbox;

use super::models::NewOutboxEventRow;

pub const AGGREGATE_ORDER: &str = "Order";

/// Order lifecycle events written next to the state change they describe.
/// A CDC relay routes them by `aggregate_type`; nothing in-process waits on
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    OrderCreated,
    OrderUpdated,
    OrderDeleted,
    LineReadyChanged,
    ProductionValidated,
    LineLoadedChanged,
    ShipmentDeparted,
    ShipmentsAcknowledged,
    CommentPosted,
}

impl OrderEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated => "OrderCreated",
            OrderEvent::OrderUpdated => "OrderUpdated",
            OrderEvent::OrderDeleted => "OrderDeleted",
            OrderEvent::LineReadyChanged => "LineReadyChanged",
            OrderEvent::ProductionValidated => "ProductionValidated",
            OrderEvent::LineLoadedChanged => "LineLoadedChanged",
            OrderEvent::ShipmentDeparted => "ShipmentDeparted",
            OrderEvent::ShipmentsAcknowledged => "ShipmentsAcknowledged",
            OrderEvent::CommentPosted => "CommentPosted",
        }
    }
}

/// Must be called with the connection of the transaction that performs the
/// change, so the event commits or rolls back with it.
pub fn record_order_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event: OrderEvent,
    payload: Value,
) -> QueryResult<()> {
    diesel::insert_into(order_events_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: AGGREGATE_ORDER.to_string(),
            aggregate_id: order_id.to_string(),
            event_type: event.as_str().to_string(),
            payload,
        })
        .execute(conn)?;
    Ok(())
}
