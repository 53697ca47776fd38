use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    CreateOutcome, DesiredLine, ListResult, NewOrder, NewOrderLine, OrderDetail, OrderFilter,
    OrderUpdate, Priority,
};
use crate::domain::ports::{CatalogRepository, OrderRepository};
use crate::domain::receipt_parser::parse_receipt_text;

pub const MAX_PAGE_SIZE: i64 = 100;

/// One requested line. Existing lines are addressed by `id`; new ones name
/// their product by `product_id` or by exact catalog label.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    pub id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub label: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct ManualOrder {
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: Priority,
    pub lines: Vec<LineInput>,
}

/// Partial order update as received from a client. `Some(None)` on a
/// nullable field means "clear it".
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub arc: Option<String>,
    pub client_name: Option<Option<String>>,
    pub order_date: Option<Option<NaiveDate>>,
    pub pickup_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub lines: Option<Vec<LineInput>>,
}

pub struct OrderService<O, C> {
    orders: O,
    catalog: C,
}

fn normalize_arc(raw: &str) -> Result<String, DomainError> {
    let arc = raw.trim();
    if arc.is_empty() {
        return Err(DomainError::InvalidInput("arc must not be empty".to_string()));
    }
    Ok(arc.to_string())
}

fn normalize_client_name(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clamp_paging(mut filter: OrderFilter) -> Result<OrderFilter, DomainError> {
    filter.page = filter.page.max(1);
    filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
    // the offset must fit a Postgres BIGINT
    if (filter.page - 1).checked_mul(filter.limit).is_none() {
        return Err(DomainError::InvalidInput(format!(
            "page {} is out of range",
            filter.page
        )));
    }
    Ok(filter)
}

impl<O: OrderRepository, C: CatalogRepository> OrderService<O, C> {
    pub fn new(orders: O, catalog: C) -> Self {
        Self { orders, catalog }
    }

    /// Maps labels to active catalog products. Fails listing every label
    /// that has no exact match.
    fn resolve_labels(&self, labels: &[String]) -> Result<HashMap<String, Uuid>, DomainError> {
        let found: HashMap<String, Uuid> = self
            .catalog
            .resolve_labels(labels)?
            .into_iter()
            .map(|p| (p.label, p.id))
            .collect();

        let mut missing: Vec<&str> = labels
            .iter()
            .filter(|l| !found.contains_key(*l))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(DomainError::InvalidInput(format!(
                "unknown product label(s): {}",
                missing.join(", ")
            )));
        }
        Ok(found)
    }

    fn ensure_products_exist(&self, ids: HashSet<Uuid>) -> Result<(), DomainError> {
        for id in ids {
            if self.catalog.find_by_id(id)?.is_none() {
                return Err(DomainError::NotFound(format!("Product {id}")));
            }
        }
        Ok(())
    }

    /// Resolves the product of every new line. Lines carrying an `id` are
    /// passed through untouched.
    fn to_desired_lines(&self, lines: Vec<LineInput>) -> Result<Vec<DesiredLine>, DomainError> {
        let labels: Vec<String> = lines
            .iter()
            .filter(|l| l.id.is_none() && l.product_id.is_none())
            .map(|l| {
                l.label
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        DomainError::InvalidInput(
                            "a new line needs a product_id or a label".to_string(),
                        )
                    })
            })
            .collect::<Result<_, _>>()?;
        let by_label = if labels.is_empty() {
            HashMap::new()
        } else {
            self.resolve_labels(&labels)?
        };

        self.ensure_products_exist(
            lines
                .iter()
                .filter(|l| l.id.is_none())
                .filter_map(|l| l.product_id)
                .collect(),
        )?;

        Ok(lines
            .into_iter()
            .map(|l| {
                let label = l
                    .label
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                let product_id = match (l.id, l.product_id, &label) {
                    (Some(_), _, _) => None,
                    (None, Some(id), _) => Some(id),
                    (None, None, Some(label)) => by_label.get(label).copied(),
                    (None, None, None) => None,
                };
                DesiredLine {
                    id: l.id,
                    product_id,
                    product_label_pdf: if l.id.is_some() { None } else { label },
                    quantity_ordered: l.quantity,
                }
            })
            .collect())
    }

    pub fn create_manual(
        &self,
        input: ManualOrder,
        actor: Uuid,
    ) -> Result<CreateOutcome, DomainError> {
        let arc = normalize_arc(&input.arc)?;
        if input.lines.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one line".to_string(),
            ));
        }
        if input.lines.iter().any(|l| l.id.is_some()) {
            return Err(DomainError::InvalidInput(
                "lines of a new order cannot carry an id".to_string(),
            ));
        }
        if let Some(line) = input.lines.iter().find(|l| l.quantity < 0) {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be >= 0, got {}",
                line.quantity
            )));
        }
        if input.lines.iter().all(|l| l.quantity == 0) {
            return Err(DomainError::InvalidInput(
                "at least one line needs a quantity above zero".to_string(),
            ));
        }

        let lines = self
            .to_desired_lines(input.lines)?
            .into_iter()
            .map(|l| NewOrderLine {
                // every line without id was given a product above
                product_id: l.product_id.unwrap_or_default(),
                product_label_pdf: l.product_label_pdf,
                quantity_ordered: l.quantity_ordered,
            })
            .collect();

        let outcome = self.orders.create(NewOrder {
            arc: arc.clone(),
            client_name: normalize_client_name(input.client_name),
            order_date: input.order_date,
            pickup_date: input.pickup_date,
            priority: input.priority,
            created_by: Some(actor),
            lines,
        })?;
        log_outcome(&arc, outcome);
        Ok(outcome)
    }

    /// Parses the extracted text of a receipt and creates the order it
    /// describes. A receipt whose ARC is already known is skipped.
    pub fn import_from_text(&self, raw: &str, actor: Uuid) -> Result<CreateOutcome, DomainError> {
        let parsed = parse_receipt_text(raw);

        let arc = parsed.arc.ok_or_else(|| {
            DomainError::InvalidInput("no ARC number found in the document".to_string())
        })?;
        let order_date = parsed.order_date.ok_or_else(|| {
            DomainError::InvalidInput("no order date found in the document".to_string())
        })?;
        let products: Vec<_> = parsed
            .products
            .into_iter()
            .filter(|p| p.quantity > 0)
            .collect();
        if products.is_empty() {
            return Err(DomainError::InvalidInput(
                "no product line found in the document".to_string(),
            ));
        }

        if let Some(existing) = self.orders.find_id_by_arc(&arc)? {
            log::info!("import of ARC {} skipped: order already exists", arc);
            return Ok(CreateOutcome::Skipped(existing));
        }

        let labels: Vec<String> = products.iter().map(|p| p.pdf_label.clone()).collect();
        let by_label = self.resolve_labels(&labels).map_err(|e| {
            log::warn!("import of ARC {} rejected: {}", arc, e);
            e
        })?;

        let lines = products
            .into_iter()
            .filter_map(|p| {
                by_label.get(&p.pdf_label).map(|&product_id| NewOrderLine {
                    product_id,
                    product_label_pdf: Some(p.pdf_label),
                    quantity_ordered: p.quantity,
                })
            })
            .collect();

        let outcome = self.orders.create(NewOrder {
            arc: arc.clone(),
            client_name: normalize_client_name(parsed.client_name),
            order_date,
            pickup_date: None,
            priority: Priority::Normal,
            created_by: Some(actor),
            lines,
        })?;
        log_outcome(&arc, outcome);
        Ok(outcome)
    }

    pub fn update(&self, id: Uuid, patch: OrderPatch) -> Result<OrderDetail, DomainError> {
        let order_date = match patch.order_date {
            Some(None) => {
                return Err(DomainError::InvalidInput(
                    "order_date cannot be cleared".to_string(),
                ))
            }
            Some(Some(date)) => Some(date),
            None => None,
        };

        let update = OrderUpdate {
            arc: patch.arc.as_deref().map(normalize_arc).transpose()?,
            client_name: patch.client_name.map(normalize_client_name),
            order_date,
            pickup_date: patch.pickup_date,
            priority: patch.priority,
            lines: patch
                .lines
                .map(|lines| self.to_desired_lines(lines))
                .transpose()?,
        };
        if !update.touches_metadata() && update.lines.is_none() {
            return Err(DomainError::InvalidInput("nothing to update".to_string()));
        }

        self.orders.update(id, update)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.orders.delete(id)?;
        log::info!("order {} deleted", id);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<OrderDetail, DomainError> {
        self.orders
            .find_by_id(id)?
            .ok_or_else(|| DomainError::order_not_found(id))
    }

    pub fn list(&self, filter: OrderFilter) -> Result<ListResult, DomainError> {
        self.orders.list(&OrderFilter {
            archived: false,
            ..clamp_paging(filter)?
        })
    }

    pub fn list_archived(&self, filter: OrderFilter) -> Result<ListResult, DomainError> {
        self.orders.list(&OrderFilter {
            archived: true,
            ..clamp_paging(filter)?
        })
    }
}

fn log_outcome(arc: &str, outcome: CreateOutcome) {
    match outcome {
        CreateOutcome::Created(id) => log::info!("order {} created with ARC {}", id, arc),
        CreateOutcome::Skipped(id) => {
            log::info!("ARC {} already belongs to order {}, creation skipped", arc, id)
        }
    }
}
