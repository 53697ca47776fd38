use uuid::Uuid;

use super::catalog::{NewProduct, Product, ProductUpdate};
use super::comment::Comment;
use super::errors::DomainError;
use super::order::{
    CreateOutcome, ListResult, LineProgress, NewOrder, OrderDetail, OrderFilter, OrderSummary,
    OrderUpdate,
};
use super::shipment::{Acknowledgement, Departure, LoadedLine, PendingAcknowledgement};

pub trait CatalogRepository: Send + Sync + 'static {
    fn list(&self, include_inactive: bool) -> Result<Vec<Product>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Active products whose exact label is one of `labels`.
    fn resolve_labels(&self, labels: &[String]) -> Result<Vec<Product>, DomainError>;
    fn create(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn update(&self, id: Uuid, update: ProductUpdate) -> Result<Product, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Returns `Skipped` without writing when the ARC is already taken.
    fn create(&self, order: NewOrder) -> Result<CreateOutcome, DomainError>;
    fn find_id_by_arc(&self, arc: &str) -> Result<Option<Uuid>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetail>, DomainError>;
    fn list(&self, filter: &OrderFilter) -> Result<ListResult, DomainError>;
    fn update(&self, id: Uuid, update: OrderUpdate) -> Result<OrderDetail, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait ProductionRepository: Send + Sync + 'static {
    fn set_line_ready(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LineProgress, DomainError>;
    fn validate_production(&self, order_id: Uuid, actor: Uuid)
        -> Result<OrderSummary, DomainError>;
    fn worklist(&self) -> Result<Vec<OrderSummary>, DomainError>;
}

pub trait ShipmentRepository: Send + Sync + 'static {
    fn set_line_loaded(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<LoadedLine, DomainError>;
    fn depart(&self, order_id: Uuid, actor: Uuid) -> Result<Departure, DomainError>;
    fn acknowledge(&self, order_id: Uuid, actor: Uuid) -> Result<Acknowledgement, DomainError>;
    fn pending_acknowledgements(&self) -> Result<Vec<PendingAcknowledgement>, DomainError>;
}

pub trait CommentRepository: Send + Sync + 'static {
    fn post(&self, order_id: Uuid, author_id: Uuid, content: String)
        -> Result<Comment, DomainError>;
    /// Lists the thread oldest first and moves the viewer's read cursor to now.
    fn list_and_mark_read(&self, order_id: Uuid, viewer: Uuid)
        -> Result<Vec<Comment>, DomainError>;
    fn unread_count(&self, order_id: Uuid, viewer: Uuid) -> Result<i64, DomainError>;
}
