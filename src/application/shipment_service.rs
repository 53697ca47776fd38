use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ShipmentRepository;
use crate::domain::shipment::{Acknowledgement, Departure, LoadedLine, PendingAcknowledgement};

pub struct ShipmentService<R> {
    repo: R,
}

impl<R: ShipmentRepository> ShipmentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stages `quantity` of a line for the next departure.
    pub fn set_line_loaded(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LoadedLine, DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvalidInput(format!(
                "loaded quantity must be >= 0, got {quantity}"
            )));
        }
        self.repo.set_line_loaded(order_id, line_id, quantity)
    }

    pub fn depart(&self, order_id: Uuid, actor: Uuid) -> Result<Departure, DomainError> {
        self.repo.depart(order_id, actor).map_err(|e| {
            if let DomainError::Conflict(msg) = &e {
                log::warn!("departure of order {} refused: {}", order_id, msg);
            }
            e
        })
    }

    /// Acknowledges every pending shipment of the order. A fully shipped
    /// order is archived in the same transaction.
    pub fn acknowledge(&self, order_id: Uuid, actor: Uuid) -> Result<Acknowledgement, DomainError> {
        self.repo.acknowledge(order_id, actor).map_err(|e| {
            if let DomainError::Conflict(msg) = &e {
                log::warn!("acknowledgement of order {} refused: {}", order_id, msg);
            }
            e
        })
    }

    pub fn pending(&self) -> Result<Vec<PendingAcknowledgement>, DomainError> {
        self.repo.pending_acknowledgements()
    }
}
