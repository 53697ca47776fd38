use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{ExpeditionStatus, OrderLineView};
use crate::domain::ports::ShipmentRepository;
use crate::domain::shipment::{
    Acknowledgement, Departure, LoadedLine, PendingAcknowledgement, RemainingLine,
    ShipmentLineView, ShipmentView,
};
use crate::schema::{order_products, orders, shipment_lines, shipments};

use super::models::{NewShipmentLineRow, NewShipmentRow, OrderRow};
use super::outbox::{record_order_event, OrderEvent};
use super::queries::{
    ensure_not_archived, find_line, load_lines, load_lines_for, load_shipments_for, lock_order,
    refresh_statuses, to_summaries,
};

pub struct DieselShipmentRepository {
    pool: DbPool,
}

impl DieselShipmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Remaining-to-ship per product, in first-seen line order.
fn remaining_by_product(lines: &[OrderLineView]) -> Vec<RemainingLine> {
    let mut remaining: Vec<RemainingLine> = Vec::new();
    for line in lines {
        match remaining.iter_mut().find(|r| r.product_id == line.product_id) {
            Some(entry) => {
                entry.quantity_ordered += line.quantity_ordered;
                entry.quantity_shipped += line.quantity_shipped;
                entry.quantity_remaining += line.quantity_ordered - line.quantity_shipped;
            }
            None => remaining.push(RemainingLine {
                product_id: line.product_id,
                label: line.display_label().to_string(),
                quantity_ordered: line.quantity_ordered,
                quantity_shipped: line.quantity_shipped,
                quantity_remaining: line.quantity_ordered - line.quantity_shipped,
            }),
        }
    }
    remaining
}

impl ShipmentRepository for DieselShipmentRepository {
    fn set_line_loaded(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LoadedLine, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            ensure_not_archived(&order)?;
            let line = find_line(conn, order_id, line_id)?;

            if quantity < 0 {
                return Err(DomainError::InvalidInput(format!(
                    "loaded quantity must be >= 0, got {quantity}"
                )));
            }
            let loadable = (line.quantity_ready - line.quantity_shipped).max(0);
            if quantity > loadable {
                return Err(DomainError::Conflict(format!(
                    "cannot load {quantity}: only {loadable} ready and not yet shipped"
                )));
            }

            diesel::update(order_products::table.find(line_id))
                .set(order_products::quantity_loaded.eq(quantity))
                .execute(conn)?;

            record_order_event(
                conn,
                order_id,
                OrderEvent::LineLoadedChanged,
                json!({
                    "order_id": order_id,
                    "line_id": line_id,
                    "quantity_loaded": quantity
                }),
            )?;

            Ok(LoadedLine {
                line_id,
                quantity_loaded: quantity,
                loadable,
            })
        })
    }

    fn depart(&self, order_id: Uuid, actor: Uuid) -> Result<Departure, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            ensure_not_archived(&order)?;

            let loaded: Vec<OrderLineView> = load_lines(conn, order_id)?
                .into_iter()
                .filter(|l| l.quantity_loaded > 0)
                .collect();
            if loaded.is_empty() {
                return Err(DomainError::Conflict(format!(
                    "nothing is loaded for order {}",
                    order.arc
                )));
            }
            if let Some(line) = loaded
                .iter()
                .find(|l| l.quantity_shipped + l.quantity_loaded > l.quantity_ready)
            {
                return Err(DomainError::Conflict(format!(
                    "line {} is loaded beyond its ready quantity",
                    line.id
                )));
            }

            // 1. The shipment and its immutable line snapshot
            let shipment_id = Uuid::new_v4();
            let departed_at = Utc::now();
            diesel::insert_into(shipments::table)
                .values(&NewShipmentRow {
                    id: shipment_id,
                    order_id,
                    departed_at,
                })
                .execute(conn)?;

            let new_lines: Vec<NewShipmentLineRow> = loaded
                .iter()
                .map(|l| NewShipmentLineRow {
                    id: Uuid::new_v4(),
                    shipment_id,
                    product_id: l.product_id,
                    product_label_pdf: l.product_label_pdf.clone(),
                    quantity_loaded: l.quantity_loaded,
                })
                .collect();
            diesel::insert_into(shipment_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            // 2. Move staged quantities into shipped; SET sees pre-update values
            diesel::update(
                order_products::table
                    .filter(order_products::order_id.eq(order_id))
                    .filter(order_products::quantity_loaded.gt(0)),
            )
            .set((
                order_products::quantity_shipped
                    .eq(order_products::quantity_shipped + order_products::quantity_loaded),
                order_products::quantity_loaded.eq(0),
            ))
            .execute(conn)?;

            let (_, expedition_status) = refresh_statuses(conn, order_id)?;

            let shipment = ShipmentView {
                id: shipment_id,
                departed_at,
                bureau_ack_at: None,
                bureau_ack_by: None,
                lines: new_lines
                    .iter()
                    .zip(&loaded)
                    .map(|(row, line)| ShipmentLineView {
                        id: row.id,
                        product_id: row.product_id,
                        label: line.display_label().to_string(),
                        quantity_loaded: row.quantity_loaded,
                    })
                    .collect(),
            };

            // 3. Outbox event in the same transaction
            record_order_event(
                conn,
                order_id,
                OrderEvent::ShipmentDeparted,
                json!({
                    "order_id": order_id,
                    "shipment_id": shipment_id,
                    "departed_at": departed_at,
                    "departed_by": actor,
                    "expedition_status": expedition_status.as_str(),
                    "lines": shipment.lines.iter().map(|l| json!({
                        "product_id": l.product_id,
                        "quantity_loaded": l.quantity_loaded
                    })).collect::<Vec<_>>()
                }),
            )?;

            log::info!(
                "order {} departed with {} line(s), now {}",
                order.arc,
                shipment.lines.len(),
                expedition_status
            );

            Ok(Departure {
                shipment,
                expedition_status,
            })
        })
    }

    fn acknowledge(&self, order_id: Uuid, actor: Uuid) -> Result<Acknowledgement, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            if order.is_archived {
                return Err(DomainError::Conflict(format!(
                    "order {} is already archived",
                    order.arc
                )));
            }

            let now = Utc::now();
            let acknowledged = diesel::update(
                shipments::table
                    .filter(shipments::order_id.eq(order_id))
                    .filter(shipments::bureau_ack_at.is_null()),
            )
            .set((
                shipments::bureau_ack_at.eq(Some(now)),
                shipments::bureau_ack_by.eq(Some(actor)),
            ))
            .execute(conn)?;

            if acknowledged == 0 {
                return Err(DomainError::Conflict(format!(
                    "order {} has no shipment awaiting acknowledgement",
                    order.arc
                )));
            }

            // archival is a side effect of acknowledging a fully shipped order
            let archived = order.expedition_status == ExpeditionStatus::ExpComplete.as_str();
            if archived {
                diesel::update(orders::table.find(order_id))
                    .set((orders::is_archived.eq(true), orders::updated_at.eq(now)))
                    .execute(conn)?;
            }

            record_order_event(
                conn,
                order_id,
                OrderEvent::ShipmentsAcknowledged,
                json!({
                    "order_id": order_id,
                    "acknowledged": acknowledged,
                    "acknowledged_by": actor,
                    "archived": archived
                }),
            )?;

            log::info!(
                "bureau acknowledged {} shipment(s) of order {}{}",
                acknowledged,
                order.arc,
                if archived { ", order archived" } else { "" }
            );

            Ok(Acknowledgement {
                acknowledged,
                archived,
            })
        })
    }

    fn pending_acknowledgements(&self) -> Result<Vec<PendingAcknowledgement>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows = orders::table
                .filter(orders::is_archived.eq(false))
                .filter(
                    orders::id.eq_any(
                        shipments::table
                            .filter(shipments::bureau_ack_at.is_null())
                            .select(shipments::order_id),
                    ),
                )
                .select(OrderRow::as_select())
                .order((orders::created_at.asc(), orders::id.asc()))
                .load(conn)?;

            let ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();
            let mut lines = load_lines_for(conn, &ids)?;
            let mut shipments = load_shipments_for(conn, &ids, true)?;

            Ok(to_summaries(rows)?
                .into_iter()
                .map(|order| {
                    let order_lines = lines.remove(&order.id).unwrap_or_default();
                    PendingAcknowledgement {
                        shipments: shipments.remove(&order.id).unwrap_or_default(),
                        remaining: remaining_by_product(&order_lines),
                        total_ordered: order_lines
                            .iter()
                            .map(|l| i64::from(l.quantity_ordered))
                            .sum(),
                        total_shipped: order_lines
                            .iter()
                            .map(|l| i64::from(l.quantity_shipped))
                            .sum(),
                        order,
                    }
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselShipmentRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{ExpeditionStatus, NewOrder, NewOrderLine, OrderFilter, Priority};
    use crate::domain::ports::{OrderRepository, ProductionRepository, ShipmentRepository};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::production_repo::DieselProductionRepository;
    use crate::infrastructure::test_support::{seed_product, setup_db};
    use crate::schema::shipments;

    struct Fixture {
        orders: DieselOrderRepository,
        production: DieselProductionRepository,
        shipping: DieselShipmentRepository,
        order_id: Uuid,
        line_id: Uuid,
    }

    /// One order with a single line: ordered=10, ready=10, shipped=0.
    fn ready_order(pool: &crate::db::DbPool) -> Fixture {
        let product = seed_product(pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool.clone());
        let shipping = DieselShipmentRepository::new(pool.clone());

        let order_id = orders
            .create(NewOrder {
                arc: "123456".to_string(),
                client_name: None,
                order_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                pickup_date: None,
                priority: Priority::Normal,
                created_by: None,
                lines: vec![NewOrderLine {
                    product_id: product,
                    product_label_pdf: Some("(12) BIG BAG 1000KG".to_string()),
                    quantity_ordered: 10,
                }],
            })
            .unwrap()
            .order_id();
        let line_id = orders.find_by_id(order_id).unwrap().unwrap().lines[0].id;
        production.set_line_ready(order_id, line_id, 10).unwrap();

        Fixture {
            orders,
            production,
            shipping,
            order_id,
            line_id,
        }
    }

    #[tokio::test]
    async fn two_departures_ship_the_order_completely() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);
        let actor = Uuid::new_v4();

        f.shipping.set_line_loaded(f.order_id, f.line_id, 6).unwrap();
        let first = f.shipping.depart(f.order_id, actor).unwrap();
        assert_eq!(first.shipment.lines.len(), 1);
        assert_eq!(first.shipment.lines[0].quantity_loaded, 6);
        assert_eq!(first.expedition_status, ExpeditionStatus::ExpPartielle);

        let line = &f.orders.find_by_id(f.order_id).unwrap().unwrap().lines[0];
        assert_eq!(line.quantity_shipped, 6);
        assert_eq!(line.quantity_loaded, 0, "staged quantity resets after departure");

        f.shipping.set_line_loaded(f.order_id, f.line_id, 4).unwrap();
        let second = f.shipping.depart(f.order_id, actor).unwrap();
        assert_eq!(second.expedition_status, ExpeditionStatus::ExpComplete);

        let detail = f.orders.find_by_id(f.order_id).unwrap().unwrap();
        assert_eq!(detail.lines[0].quantity_shipped, 10);
        assert_eq!(detail.shipments.len(), 2);
        assert_eq!(detail.order.expedition_status, ExpeditionStatus::ExpComplete);
    }

    #[tokio::test]
    async fn loading_beyond_ready_minus_shipped_is_rejected() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);

        f.shipping.set_line_loaded(f.order_id, f.line_id, 6).unwrap();
        f.shipping.depart(f.order_id, Uuid::new_v4()).unwrap();

        let err = f.shipping.set_line_loaded(f.order_id, f.line_id, 5).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let loaded = f.shipping.set_line_loaded(f.order_id, f.line_id, 4).unwrap();
        assert_eq!(loaded.loadable, 4);
    }

    #[tokio::test]
    async fn departure_without_loaded_lines_is_rejected() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);

        let err = f.shipping.depart(f.order_id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let mut conn = pool.get().unwrap();
        let count: i64 = shipments::table.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn acknowledging_a_fully_shipped_order_archives_it() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);
        let driver = Uuid::new_v4();
        let bureau = Uuid::new_v4();

        f.shipping.set_line_loaded(f.order_id, f.line_id, 6).unwrap();
        f.shipping.depart(f.order_id, driver).unwrap();
        f.shipping.set_line_loaded(f.order_id, f.line_id, 4).unwrap();
        f.shipping.depart(f.order_id, driver).unwrap();

        let pending = f.shipping.pending_acknowledgements().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].shipments.len(), 2);
        assert_eq!(pending[0].total_ordered, 10);
        assert_eq!(pending[0].total_shipped, 10);
        assert_eq!(pending[0].remaining[0].quantity_remaining, 0);

        let ack = f.shipping.acknowledge(f.order_id, bureau).unwrap();
        assert_eq!(ack.acknowledged, 2);
        assert!(ack.archived);

        let detail = f.orders.find_by_id(f.order_id).unwrap().unwrap();
        assert!(detail.order.is_archived);
        assert!(detail
            .shipments
            .iter()
            .all(|s| s.bureau_ack_at.is_some() && s.bureau_ack_by == Some(bureau)));

        assert!(f.shipping.pending_acknowledgements().unwrap().is_empty());
        let active = f.orders.list(&OrderFilter::default()).unwrap();
        assert_eq!(active.total, 0);

        assert!(matches!(
            f.shipping.acknowledge(f.order_id, bureau).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn acknowledging_a_partial_shipment_keeps_the_order_active() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);

        f.shipping.set_line_loaded(f.order_id, f.line_id, 6).unwrap();
        f.shipping.depart(f.order_id, Uuid::new_v4()).unwrap();

        let pending = f.shipping.pending_acknowledgements().unwrap();
        assert_eq!(pending[0].remaining[0].quantity_remaining, 4);

        let ack = f.shipping.acknowledge(f.order_id, Uuid::new_v4()).unwrap();
        assert_eq!(ack.acknowledged, 1);
        assert!(!ack.archived);

        assert!(f.shipping.pending_acknowledgements().unwrap().is_empty());
        assert!(matches!(
            f.shipping.acknowledge(f.order_id, Uuid::new_v4()).unwrap_err(),
            DomainError::Conflict(_)
        ));

        let detail = f.orders.find_by_id(f.order_id).unwrap().unwrap();
        assert!(!detail.order.is_archived);
    }

    #[tokio::test]
    async fn archived_orders_reject_production_and_loading() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);

        f.shipping.set_line_loaded(f.order_id, f.line_id, 10).unwrap();
        f.shipping.depart(f.order_id, Uuid::new_v4()).unwrap();
        f.shipping.acknowledge(f.order_id, Uuid::new_v4()).unwrap();

        assert!(matches!(
            f.production.set_line_ready(f.order_id, f.line_id, 10).unwrap_err(),
            DomainError::Conflict(_)
        ));
        assert!(matches!(
            f.shipping.set_line_loaded(f.order_id, f.line_id, 0).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn pending_listing_is_empty_without_shipments() {
        let (_container, pool) = setup_db().await;
        let f = ready_order(&pool);

        assert!(f.shipping.pending_acknowledgements().unwrap().is_empty());
        let detail = f.orders.find_by_id(f.order_id).unwrap().unwrap();
        assert!(detail.shipments.is_empty());
    }
}
