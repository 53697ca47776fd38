use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{LineProgress, OrderSummary, ProductionStatus};
use crate::domain::ports::ProductionRepository;
use crate::schema::{order_products, orders};

use super::models::OrderRow;
use super::outbox::{record_order_event, OrderEvent};
use super::queries::{ensure_not_archived, find_line, lock_order, refresh_statuses, to_summaries};

pub struct DieselProductionRepository {
    pool: DbPool,
}

impl DieselProductionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductionRepository for DieselProductionRepository {
    fn set_line_ready(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LineProgress, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            ensure_not_archived(&order)?;
            let line = find_line(conn, order_id, line_id)?;

            if quantity < 0 || quantity > line.quantity_ordered {
                return Err(DomainError::InvalidInput(format!(
                    "ready quantity must be between 0 and {}, got {quantity}",
                    line.quantity_ordered
                )));
            }
            if quantity < line.quantity_shipped {
                return Err(DomainError::Conflict(format!(
                    "cannot set ready quantity below the {} already shipped",
                    line.quantity_shipped
                )));
            }

            // staged loading cannot exceed what stays ready and unshipped
            let loaded = line.quantity_loaded.min(quantity - line.quantity_shipped);
            diesel::update(order_products::table.find(line_id))
                .set((
                    order_products::quantity_ready.eq(quantity),
                    order_products::quantity_loaded.eq(loaded),
                ))
                .execute(conn)?;

            let (production_status, _) = refresh_statuses(conn, order_id)?;

            record_order_event(
                conn,
                order_id,
                OrderEvent::LineReadyChanged,
                json!({
                    "order_id": order_id,
                    "line_id": line_id,
                    "quantity_ready": quantity,
                    "production_status": production_status.as_str()
                }),
            )?;

            Ok(LineProgress {
                line_id,
                quantity_ready: quantity,
                production_status,
            })
        })
    }

    fn validate_production(
        &self,
        order_id: Uuid,
        actor: Uuid,
    ) -> Result<OrderSummary, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            ensure_not_archived(&order)?;

            if order.production_status != ProductionStatus::ProdComplete.as_str() {
                return Err(DomainError::Conflict(format!(
                    "production of order {} is not complete",
                    order.arc
                )));
            }
            if order.production_validated_at.is_some() {
                return Err(DomainError::Conflict(format!(
                    "production of order {} is already validated",
                    order.arc
                )));
            }

            let now = Utc::now();
            let row = diesel::update(orders::table.find(order_id))
                .set((
                    orders::production_validated_at.eq(Some(now)),
                    orders::updated_at.eq(now),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            record_order_event(
                conn,
                order_id,
                OrderEvent::ProductionValidated,
                json!({ "order_id": order_id, "validated_by": actor, "validated_at": now }),
            )?;

            OrderSummary::try_from(row)
        })
    }

    fn worklist(&self) -> Result<Vec<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::is_archived.eq(false))
            .filter(orders::production_validated_at.is_null())
            .select(OrderRow::as_select())
            .order((orders::order_date.asc(), orders::created_at.asc()))
            .load(&mut conn)?;

        let mut items = to_summaries(rows)?;
        // stable: urgent first, then by order date
        items.sort_by_key(|o| std::cmp::Reverse(o.priority.rank()));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::DieselProductionRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrder, NewOrderLine, Priority, ProductionStatus};
    use crate::domain::ports::{OrderRepository, ProductionRepository, ShipmentRepository};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::shipment_repo::DieselShipmentRepository;
    use crate::infrastructure::test_support::{seed_product, setup_db};

    fn order_with(arc: &str, priority: Priority, lines: &[(Uuid, i32)]) -> NewOrder {
        NewOrder {
            arc: arc.to_string(),
            client_name: None,
            order_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            pickup_date: None,
            priority,
            created_by: None,
            lines: lines
                .iter()
                .map(|&(product_id, quantity_ordered)| NewOrderLine {
                    product_id,
                    product_label_pdf: None,
                    quantity_ordered,
                })
                .collect(),
        }
    }

    /// Creates an order and returns its id with line ids in product order.
    fn create(
        orders: &DieselOrderRepository,
        arc: &str,
        priority: Priority,
        lines: &[(Uuid, i32)],
    ) -> (Uuid, Vec<Uuid>) {
        let order_id = orders
            .create(order_with(arc, priority, lines))
            .unwrap()
            .order_id();
        let detail = orders.find_by_id(order_id).unwrap().unwrap();
        let line_ids = lines
            .iter()
            .map(|(product, _)| {
                detail
                    .lines
                    .iter()
                    .find(|l| l.product_id == *product)
                    .unwrap()
                    .id
            })
            .collect();
        (order_id, line_ids)
    }

    #[tokio::test]
    async fn ready_quantities_drive_production_status() {
        let (_container, pool) = setup_db().await;
        let big_bag = seed_product(&pool, "(12) BIG BAG 1000KG");
        let gravier = seed_product(&pool, "(40) GRAVIER 6/10");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool);

        let (order_id, lines) = create(
            &orders,
            "123456",
            Priority::Normal,
            &[(big_bag, 10), (gravier, 4)],
        );

        let progress = production.set_line_ready(order_id, lines[0], 3).unwrap();
        assert_eq!(progress.production_status, ProductionStatus::AProd);

        let progress = production.set_line_ready(order_id, lines[0], 10).unwrap();
        assert_eq!(progress.production_status, ProductionStatus::ProdPartielle);

        let progress = production.set_line_ready(order_id, lines[1], 4).unwrap();
        assert_eq!(progress.production_status, ProductionStatus::ProdComplete);

        let detail = orders.find_by_id(order_id).unwrap().unwrap();
        assert_eq!(detail.order.production_status, ProductionStatus::ProdComplete);
    }

    #[tokio::test]
    async fn ready_above_ordered_is_rejected() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool);

        let (order_id, lines) = create(&orders, "123456", Priority::Normal, &[(product, 10)]);

        let err = production.set_line_ready(order_id, lines[0], 11).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let detail = orders.find_by_id(order_id).unwrap().unwrap();
        assert_eq!(detail.lines[0].quantity_ready, 0);
    }

    #[tokio::test]
    async fn unknown_line_is_not_found() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool);

        let (order_id, _) = create(&orders, "123456", Priority::Normal, &[(product, 10)]);

        assert!(matches!(
            production.set_line_ready(order_id, Uuid::new_v4(), 1).unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            production.set_line_ready(Uuid::new_v4(), Uuid::new_v4(), 1).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn ready_cannot_drop_below_shipped_and_clamps_staged_load() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool.clone());
        let shipping = DieselShipmentRepository::new(pool);

        let (order_id, lines) = create(&orders, "123456", Priority::Normal, &[(product, 10)]);
        production.set_line_ready(order_id, lines[0], 8).unwrap();
        shipping.set_line_loaded(order_id, lines[0], 2).unwrap();
        shipping.depart(order_id, Uuid::new_v4()).unwrap();
        shipping.set_line_loaded(order_id, lines[0], 6).unwrap();

        let err = production.set_line_ready(order_id, lines[0], 1).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        production.set_line_ready(order_id, lines[0], 5).unwrap();
        let line = &orders.find_by_id(order_id).unwrap().unwrap().lines[0];
        assert_eq!(line.quantity_ready, 5);
        assert_eq!(line.quantity_shipped, 2);
        assert_eq!(line.quantity_loaded, 3);
    }

    #[tokio::test]
    async fn validation_requires_complete_production_once() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool);
        let actor = Uuid::new_v4();

        let (order_id, lines) = create(&orders, "123456", Priority::Normal, &[(product, 2)]);

        assert!(matches!(
            production.validate_production(order_id, actor).unwrap_err(),
            DomainError::Conflict(_)
        ));

        production.set_line_ready(order_id, lines[0], 2).unwrap();
        let validated = production.validate_production(order_id, actor).unwrap();
        assert!(validated.production_validated_at.is_some());

        assert!(matches!(
            production.validate_production(order_id, actor).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn worklist_drops_validated_orders_and_puts_urgent_first() {
        let (_container, pool) = setup_db().await;
        let product = seed_product(&pool, "(12) BIG BAG 1000KG");
        let orders = DieselOrderRepository::new(pool.clone());
        let production = DieselProductionRepository::new(pool);
        let actor = Uuid::new_v4();

        let (done, done_lines) = create(&orders, "111111", Priority::Normal, &[(product, 1)]);
        create(&orders, "222222", Priority::Normal, &[(product, 1)]);
        create(&orders, "333333", Priority::Urgent, &[(product, 1)]);

        production.set_line_ready(done, done_lines[0], 1).unwrap();
        production.validate_production(done, actor).unwrap();

        let arcs: Vec<String> = production
            .worklist()
            .unwrap()
            .into_iter()
            .map(|o| o.arc)
            .collect();
        assert_eq!(arcs, vec!["333333", "222222"]);
    }
}
