use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::line_sync::{plan_line_sync, CurrentLine, LineSyncPlan};
use crate::domain::order::{
    CreateOutcome, ListResult, NewOrder, OrderDetail, OrderFilter, OrderUpdate,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_products, orders};

use super::models::{NewOrderProductRow, NewOrderRow, OrderMetadataChangeset, OrderRow};
use super::outbox::{record_order_event, OrderEvent};
use super::queries::{
    ensure_not_archived, load_detail, load_line_rows, lock_order, refresh_statuses, to_summaries,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn filtered_orders(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table
        .filter(orders::is_archived.eq(filter.archived))
        .into_boxed();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            orders::arc
                .ilike(pattern.clone())
                .or(orders::client_name.ilike(pattern).assume_not_null()),
        );
    }
    if let Some(priority) = filter.priority {
        query = query.filter(orders::priority.eq(priority.as_str()));
    }
    if let Some(state) = filter.state {
        let (production, expedition) = state.status_filter();
        query = query.filter(orders::expedition_status.eq(expedition.as_str()));
        if let Some(production) = production {
            query = query.filter(orders::production_status.eq(production.as_str()));
        }
    }
    query
}

fn find_other_with_arc(
    conn: &mut PgConnection,
    arc: &str,
    exclude: Uuid,
) -> QueryResult<Option<Uuid>> {
    orders::table
        .filter(orders::arc.eq(arc))
        .filter(orders::id.ne(exclude))
        .select(orders::id)
        .first(conn)
        .optional()
}

fn apply_line_plan(conn: &mut PgConnection, order_id: Uuid, plan: &LineSyncPlan) -> QueryResult<()> {
    if !plan.deletes.is_empty() {
        diesel::delete(order_products::table.filter(order_products::id.eq_any(&plan.deletes)))
            .execute(conn)?;
    }
    for (line_id, quantity) in &plan.updates {
        diesel::update(order_products::table.find(*line_id))
            .set(order_products::quantity_ordered.eq(*quantity))
            .execute(conn)?;
    }
    if !plan.inserts.is_empty() {
        let rows: Vec<NewOrderProductRow> = plan
            .inserts
            .iter()
            .map(|l| NewOrderProductRow {
                id: Uuid::new_v4(),
                order_id,
                product_id: l.product_id,
                product_label_pdf: l.product_label_pdf.clone(),
                quantity_ordered: l.quantity_ordered,
            })
            .collect();
        diesel::insert_into(order_products::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<CreateOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order; an existing ARC makes this a no-op
            let order_id = Uuid::new_v4();
            let inserted = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    arc: order.arc.clone(),
                    client_name: order.client_name.clone(),
                    order_date: order.order_date,
                    pickup_date: order.pickup_date,
                    priority: order.priority.as_str().to_string(),
                    created_by: order.created_by,
                })
                .on_conflict(orders::arc)
                .do_nothing()
                .execute(conn)?;

            if inserted == 0 {
                let existing = orders::table
                    .filter(orders::arc.eq(&order.arc))
                    .select(orders::id)
                    .first::<Uuid>(conn)?;
                return Ok(CreateOutcome::Skipped(existing));
            }

            // 2. Insert order lines
            let new_lines: Vec<NewOrderProductRow> = order
                .lines
                .iter()
                .map(|l| NewOrderProductRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    product_label_pdf: l.product_label_pdf.clone(),
                    quantity_ordered: l.quantity_ordered,
                })
                .collect();
            diesel::insert_into(order_products::table)
                .values(&new_lines)
                .execute(conn)?;

            // 3. Outbox event in the same transaction
            let line_payloads: Vec<serde_json::Value> = order
                .lines
                .iter()
                .map(|l| {
                    json!({
                        "product_id": l.product_id,
                        "product_label_pdf": l.product_label_pdf,
                        "quantity_ordered": l.quantity_ordered
                    })
                })
                .collect();
            record_order_event(
                conn,
                order_id,
                OrderEvent::OrderCreated,
                json!({
                    "order_id": order_id,
                    "arc": order.arc,
                    "client_name": order.client_name,
                    "order_date": order.order_date,
                    "lines": line_payloads
                }),
            )?;

            Ok(CreateOutcome::Created(order_id))
        })
    }

    fn find_id_by_arc(&self, arc: &str) -> Result<Option<Uuid>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(orders::table
            .filter(orders::arc.eq(arc))
            .select(orders::id)
            .first(&mut conn)
            .optional()?)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetail>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        load_detail(&mut conn, order).map(Some)
    }

    fn list(&self, filter: &OrderFilter) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = filter
            .page
            .checked_sub(1)
            .and_then(|skipped| skipped.checked_mul(filter.limit))
            .filter(|offset| *offset >= 0)
            .ok_or_else(|| {
                DomainError::InvalidInput(format!("page {} is out of range", filter.page))
            })?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered_orders(filter).count().get_result(conn)?;

            let rows = filtered_orders(filter)
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.asc()))
                .limit(filter.limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: to_summaries(rows)?,
                total,
            })
        })
    }

    fn update(&self, id: Uuid, update: OrderUpdate) -> Result<OrderDetail, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current = lock_order(conn, id)?;
            ensure_not_archived(&current)?;

            if let Some(arc) = &update.arc {
                if find_other_with_arc(conn, arc, id)?.is_some() {
                    return Err(DomainError::Conflict(format!(
                        "ARC {arc} is already used by another order"
                    )));
                }
            }

            diesel::update(orders::table.find(id))
                .set(&OrderMetadataChangeset {
                    arc: update.arc.clone(),
                    client_name: update.client_name.clone(),
                    order_date: update.order_date,
                    pickup_date: update.pickup_date,
                    priority: update.priority.map(|p| p.as_str().to_string()),
                    updated_at: Some(Utc::now()),
                })
                .execute(conn)?;

            let mut line_changes = serde_json::Value::Null;
            if let Some(desired) = update.lines {
                // Re-read under the order lock so the checks see the
                // quantities production and dispatch have committed.
                let current_lines: Vec<CurrentLine> = load_line_rows(conn, id)?
                    .into_iter()
                    .map(|l| CurrentLine {
                        id: l.id,
                        quantity_ordered: l.quantity_ordered,
                        quantity_ready: l.quantity_ready,
                        quantity_shipped: l.quantity_shipped,
                    })
                    .collect();

                let plan = plan_line_sync(&current_lines, desired).map_err(|e| {
                    log::warn!("line sync rejected for order {}: {}", current.arc, e);
                    e
                })?;
                if !plan.is_empty() {
                    apply_line_plan(conn, id, &plan)?;
                    refresh_statuses(conn, id)?;
                }

                line_changes = json!({
                    "inserted": plan.inserts.len(),
                    "updated": plan.updates.len(),
                    "deleted": plan.deletes,
                });
            }

            record_order_event(
                conn,
                id,
                OrderEvent::OrderUpdated,
                json!({
                    "order_id": id,
                    "arc": update.arc,
                    "priority": update.priority.map(|p| p.as_str()),
                    "lines": line_changes
                }),
            )?;

            let row = lock_order(conn, id)?;
            load_detail(conn, row)
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?;

            // lines, shipments and comments go with the order (ON DELETE CASCADE)
            diesel::delete(orders::table.find(id)).execute(conn)?;

            record_order_event(
                conn,
                id,
                OrderEvent::OrderDeleted,
                json!({ "order_id": id, "arc": order.arc }),
            )?;
            Ok(())
        })
    }
}
