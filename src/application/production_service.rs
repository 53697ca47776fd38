use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{LineProgress, OrderSummary};
use crate::domain::ports::ProductionRepository;

pub struct ProductionService<R> {
    repo: R,
}

impl<R: ProductionRepository> ProductionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn set_line_ready(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LineProgress, DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvalidInput(format!(
                "ready quantity must be >= 0, got {quantity}"
            )));
        }
        let progress = self.repo.set_line_ready(order_id, line_id, quantity)?;
        log::debug!(
            "order {} line {} ready={} ({})",
            order_id,
            line_id,
            progress.quantity_ready,
            progress.production_status
        );
        Ok(progress)
    }

    pub fn validate(&self, order_id: Uuid, actor: Uuid) -> Result<OrderSummary, DomainError> {
        let order = self
            .repo
            .validate_production(order_id, actor)
            .map_err(|e| {
                if let DomainError::Conflict(msg) = &e {
                    log::warn!("production validation of {} refused: {}", order_id, msg);
                }
                e
            })?;
        log::info!("production of order {} validated by {}", order.arc, actor);
        Ok(order)
    }

    pub fn worklist(&self) -> Result<Vec<OrderSummary>, DomainError> {
        self.repo.worklist()
    }
}
