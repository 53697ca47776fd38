//! Query helpers shared by the repositories. All of them take the caller's
//! connection so they run inside the caller's transaction.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ExpeditionStatus, LineQuantities, OrderDetail, OrderLineView, OrderSummary, ProductionStatus,
};
use crate::domain::shipment::{ShipmentLineView, ShipmentView};
use crate::schema::{order_products, orders, products_catalog, shipment_lines, shipments};

use super::models::{OrderProductRow, OrderRow, ProductRow, ShipmentLineRow, ShipmentRow};

/// Loads the order row with `SELECT ... FOR UPDATE`. Every operation that
/// reads quantities and writes derived state takes this lock first, which
/// serialises concurrent writers on the same order.
pub fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> Result<OrderRow, DomainError> {
    orders::table
        .find(order_id)
        .select(OrderRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or_else(|| DomainError::order_not_found(order_id))
}

/// `SELECT ... FOR SHARE` on the order row. Readers holding it wait for,
/// and block, writers holding [`lock_order`].
pub fn share_lock_order(conn: &mut PgConnection, order_id: Uuid) -> Result<(), DomainError> {
    orders::table
        .find(order_id)
        .select(orders::id)
        .for_share()
        .get_result::<Uuid>(conn)
        .optional()?
        .map(|_| ())
        .ok_or_else(|| DomainError::order_not_found(order_id))
}

pub fn ensure_not_archived(order: &OrderRow) -> Result<(), DomainError> {
    if order.is_archived {
        return Err(DomainError::Conflict(format!(
            "order {} is archived",
            order.arc
        )));
    }
    Ok(())
}

pub fn order_exists(conn: &mut PgConnection, order_id: Uuid) -> Result<(), DomainError> {
    orders::table
        .find(order_id)
        .select(orders::id)
        .first::<Uuid>(conn)
        .optional()?
        .map(|_| ())
        .ok_or_else(|| DomainError::order_not_found(order_id))
}

pub fn find_line(
    conn: &mut PgConnection,
    order_id: Uuid,
    line_id: Uuid,
) -> Result<OrderProductRow, DomainError> {
    order_products::table
        .filter(order_products::id.eq(line_id))
        .filter(order_products::order_id.eq(order_id))
        .select(OrderProductRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::NotFound(format!("Order line {line_id}")))
}

pub fn load_line_rows(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> QueryResult<Vec<OrderProductRow>> {
    order_products::table
        .filter(order_products::order_id.eq(order_id))
        .order((order_products::created_at.asc(), order_products::id.asc()))
        .select(OrderProductRow::as_select())
        .load(conn)
}

/// Recomputes the cached production/expedition statuses from the line
/// quantities and writes them back on the order row.
pub fn refresh_statuses(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<(ProductionStatus, ExpeditionStatus), DomainError> {
    let quantities: Vec<LineQuantities> = order_products::table
        .filter(order_products::order_id.eq(order_id))
        .select((
            order_products::quantity_ordered,
            order_products::quantity_ready,
            order_products::quantity_shipped,
        ))
        .load::<(i32, i32, i32)>(conn)?
        .into_iter()
        .map(|(ordered, ready, shipped)| LineQuantities {
            ordered,
            ready,
            shipped,
        })
        .collect();

    let production = ProductionStatus::derive(&quantities);
    let expedition = ExpeditionStatus::derive(&quantities);

    diesel::update(orders::table.find(order_id))
        .set((
            orders::production_status.eq(production.as_str()),
            orders::expedition_status.eq(expedition.as_str()),
            orders::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    Ok((production, expedition))
}

fn parse_code<T>(raw: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|e: DomainError| DomainError::Internal(format!("corrupt stored value: {e}")))
}

impl TryFrom<OrderRow> for OrderSummary {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(OrderSummary {
            priority: parse_code(&row.priority)?,
            production_status: parse_code(&row.production_status)?,
            expedition_status: parse_code(&row.expedition_status)?,
            id: row.id,
            arc: row.arc,
            client_name: row.client_name,
            order_date: row.order_date,
            pickup_date: row.pickup_date,
            production_validated_at: row.production_validated_at,
            is_archived: row.is_archived,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            category: parse_code(&row.category)?,
            id: row.id,
            label: row.pdf_label_exact,
            weight_per_unit_kg: row.weight_per_unit_kg,
            is_active: row.is_active,
        })
    }
}

pub fn to_summaries(rows: Vec<OrderRow>) -> Result<Vec<OrderSummary>, DomainError> {
    rows.into_iter().map(OrderSummary::try_from).collect()
}

/// Lines of several orders joined with their catalog product, keyed by
/// order id, each list in creation order.
pub fn load_lines_for(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderLineView>>, DomainError> {
    let rows: Vec<(OrderProductRow, ProductRow)> = order_products::table
        .inner_join(products_catalog::table)
        .filter(order_products::order_id.eq_any(order_ids))
        .order((
            order_products::created_at.asc(),
            products_catalog::pdf_label_exact.asc(),
            order_products::id.asc(),
        ))
        .select((OrderProductRow::as_select(), ProductRow::as_select()))
        .load(conn)?;

    let mut by_order: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for (line, product) in rows {
        by_order
            .entry(line.order_id)
            .or_default()
            .push(OrderLineView {
                id: line.id,
                product_id: line.product_id,
                category: parse_code(&product.category)?,
                label: product.pdf_label_exact,
                product_label_pdf: line.product_label_pdf,
                quantity_ordered: line.quantity_ordered,
                quantity_ready: line.quantity_ready,
                quantity_shipped: line.quantity_shipped,
                quantity_loaded: line.quantity_loaded,
            });
    }
    Ok(by_order)
}

pub fn load_lines(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Vec<OrderLineView>, DomainError> {
    Ok(load_lines_for(conn, &[order_id])?
        .remove(&order_id)
        .unwrap_or_default())
}

/// Shipments of several orders with their lines, keyed by order id, oldest
/// departure first.
pub fn load_shipments_for(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
    pending_only: bool,
) -> Result<HashMap<Uuid, Vec<ShipmentView>>, DomainError> {
    let mut query = shipments::table
        .filter(shipments::order_id.eq_any(order_ids.to_vec()))
        .select(ShipmentRow::as_select())
        .order((shipments::departed_at.asc(), shipments::id.asc()))
        .into_boxed();
    if pending_only {
        query = query.filter(shipments::bureau_ack_at.is_null());
    }
    let shipment_rows: Vec<ShipmentRow> = query.load(conn)?;

    let line_rows: Vec<(ShipmentLineRow, String)> = ShipmentLineRow::belonging_to(&shipment_rows)
        .inner_join(products_catalog::table)
        .order(shipment_lines::id.asc())
        .select((ShipmentLineRow::as_select(), products_catalog::pdf_label_exact))
        .load(conn)?;

    let mut lines_by_shipment: HashMap<Uuid, Vec<ShipmentLineView>> = HashMap::new();
    for (line, catalog_label) in line_rows {
        lines_by_shipment
            .entry(line.shipment_id)
            .or_default()
            .push(ShipmentLineView {
                id: line.id,
                product_id: line.product_id,
                label: line.product_label_pdf.unwrap_or(catalog_label),
                quantity_loaded: line.quantity_loaded,
            });
    }

    let mut by_order: HashMap<Uuid, Vec<ShipmentView>> = HashMap::new();
    for shipment in shipment_rows {
        by_order
            .entry(shipment.order_id)
            .or_default()
            .push(ShipmentView {
                id: shipment.id,
                departed_at: shipment.departed_at,
                bureau_ack_at: shipment.bureau_ack_at,
                bureau_ack_by: shipment.bureau_ack_by,
                lines: lines_by_shipment.remove(&shipment.id).unwrap_or_default(),
            });
    }
    Ok(by_order)
}

pub fn load_detail(conn: &mut PgConnection, row: OrderRow) -> Result<OrderDetail, DomainError> {
    let lines = load_lines(conn, row.id)?;
    let shipments = load_shipments_for(conn, &[row.id], false)?
        .remove(&row.id)
        .unwrap_or_default();
    Ok(OrderDetail {
        order: OrderSummary::try_from(row)?,
        lines,
        shipments,
    })
}
