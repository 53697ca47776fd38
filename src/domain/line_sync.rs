//! Reconciliation of an order's lines against a full desired line set.
//!
//! The caller loads the current lines (under the order row lock), hands them
//! here together with what the client sent, and applies the resulting plan in
//! the same transaction. Planning is all-or-nothing: any rejected line
//! rejects the whole update.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::errors::DomainError;
use super::order::DesiredLine;

#[derive(Debug, Clone, Copy)]
pub struct CurrentLine {
    pub id: Uuid,
    pub quantity_ordered: i32,
    pub quantity_ready: i32,
    pub quantity_shipped: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInsert {
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_ordered: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSyncPlan {
    pub inserts: Vec<LineInsert>,
    /// `(line id, new quantity_ordered)`; unchanged lines are left out.
    pub updates: Vec<(Uuid, i32)>,
    pub deletes: Vec<Uuid>,
}

impl LineSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

pub fn plan_line_sync(
    current: &[CurrentLine],
    desired: Vec<DesiredLine>,
) -> Result<LineSyncPlan, DomainError> {
    if desired.is_empty() {
        return Err(DomainError::InvalidInput(
            "an order needs at least one line".to_string(),
        ));
    }

    let by_id: HashMap<Uuid, &CurrentLine> = current.iter().map(|l| (l.id, l)).collect();
    let mut kept: HashSet<Uuid> = HashSet::new();
    let mut plan = LineSyncPlan::default();

    for line in desired {
        if line.quantity_ordered < 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity_ordered must be >= 0, got {}",
                line.quantity_ordered
            )));
        }

        match line.id {
            Some(id) => {
                let existing = by_id
                    .get(&id)
                    .ok_or_else(|| DomainError::NotFound(format!("Order line {id}")))?;
                if !kept.insert(id) {
                    return Err(DomainError::InvalidInput(format!(
                        "order line {id} appears more than once"
                    )));
                }
                if line.quantity_ordered == existing.quantity_ordered {
                    continue;
                }
                let reserved = existing.quantity_ready.max(existing.quantity_shipped);
                if line.quantity_ordered < reserved {
                    return Err(DomainError::Conflict(format!(
                        "cannot set ordered quantity of line {id} to {} below already reserved/shipped quantity {reserved}",
                        line.quantity_ordered
                    )));
                }
                plan.updates.push((id, line.quantity_ordered));
            }
            None => {
                let product_id = line.product_id.ok_or_else(|| {
                    DomainError::InvalidInput("new line needs a product".to_string())
                })?;
                plan.inserts.push(LineInsert {
                    product_id,
                    product_label_pdf: line.product_label_pdf,
                    quantity_ordered: line.quantity_ordered,
                });
            }
        }
    }

    for line in current.iter().filter(|l| !kept.contains(&l.id)) {
        if line.quantity_shipped > 0 {
            return Err(DomainError::Conflict(format!(
                "cannot delete line {} already shipped",
                line.id
            )));
        }
        plan.deletes.push(line.id);
    }

    Ok(plan)
}
