use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::catalog::ProductCategory;
use super::shipment::ShipmentView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    Intermediaire,
    Urgent,
}

db_code_enum!(Priority, "priority", {
    Normal => "NORMAL",
    Intermediaire => "INTERMEDIAIRE",
    Urgent => "URGENT",
});

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Normal => 0,
            Priority::Intermediaire => 1,
            Priority::Urgent => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionStatus {
    AProd,
    ProdPartielle,
    ProdComplete,
}

db_code_enum!(ProductionStatus, "production status", {
    AProd => "A_PROD",
    ProdPartielle => "PROD_PARTIELLE",
    ProdComplete => "PROD_COMPLETE",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpeditionStatus {
    NonExpediee,
    ExpPartielle,
    ExpComplete,
}

db_code_enum!(ExpeditionStatus, "expedition status", {
    NonExpediee => "NON_EXPEDIEE",
    ExpPartielle => "EXP_PARTIELLE",
    ExpComplete => "EXP_COMPLETE",
});

/// Worklist state shown to users, derived from the two stored statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    AProduire,
    EnProduction,
    Prete,
    ExpPartielle,
    ExpComplete,
}

db_code_enum!(OrderState, "order state", {
    AProduire => "A_PRODUIRE",
    EnProduction => "EN_PRODUCTION",
    Prete => "PRETE",
    ExpPartielle => "EXP_PARTIELLE",
    ExpComplete => "EXP_COMPLETE",
});

impl OrderState {
    pub fn derive(production: ProductionStatus, expedition: ExpeditionStatus) -> Self {
        match (expedition, production) {
            (ExpeditionStatus::ExpComplete, _) => OrderState::ExpComplete,
            (ExpeditionStatus::ExpPartielle, _) => OrderState::ExpPartielle,
            (ExpeditionStatus::NonExpediee, ProductionStatus::AProd) => OrderState::AProduire,
            (ExpeditionStatus::NonExpediee, ProductionStatus::ProdPartielle) => {
                OrderState::EnProduction
            }
            (ExpeditionStatus::NonExpediee, ProductionStatus::ProdComplete) => OrderState::Prete,
        }
    }

    /// The stored status pair a list query must match for this state.
    /// `None` on the production side means any production status.
    pub fn status_filter(&self) -> (Option<ProductionStatus>, ExpeditionStatus) {
        match self {
            OrderState::AProduire => (Some(ProductionStatus::AProd), ExpeditionStatus::NonExpediee),
            OrderState::EnProduction => (
                Some(ProductionStatus::ProdPartielle),
                ExpeditionStatus::NonExpediee,
            ),
            OrderState::Prete => (
                Some(ProductionStatus::ProdComplete),
                ExpeditionStatus::NonExpediee,
            ),
            OrderState::ExpPartielle => (None, ExpeditionStatus::ExpPartielle),
            OrderState::ExpComplete => (None, ExpeditionStatus::ExpComplete),
        }
    }
}

/// The three quantities of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineQuantities {
    pub ordered: i32,
    pub ready: i32,
    pub shipped: i32,
}

impl ProductionStatus {
    /// Lines with nothing ordered do not count towards production progress.
    pub fn derive(lines: &[LineQuantities]) -> Self {
        let relevant: Vec<_> = lines.iter().filter(|l| l.ordered > 0).collect();
        let complete = relevant.iter().filter(|l| l.ready >= l.ordered).count();

        if relevant.is_empty() || complete == 0 {
            ProductionStatus::AProd
        } else if complete == relevant.len() {
            ProductionStatus::ProdComplete
        } else {
            ProductionStatus::ProdPartielle
        }
    }
}

impl ExpeditionStatus {
    pub fn derive(lines: &[LineQuantities]) -> Self {
        let shipped: i64 = lines.iter().map(|l| i64::from(l.shipped)).sum();
        if shipped == 0 {
            return ExpeditionStatus::NonExpediee;
        }
        if lines.iter().all(|l| l.shipped >= l.ordered) {
            ExpeditionStatus::ExpComplete
        } else {
            ExpeditionStatus::ExpPartielle
        }
    }
}

/// Result of a ready-quantity write.
#[derive(Debug, Clone, Copy)]
pub struct LineProgress {
    pub line_id: Uuid,
    pub quantity_ready: i32,
    pub production_status: ProductionStatus,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: Uuid,
    pub product_label_pdf: Option<String>,
    pub quantity_ordered: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: Priority,
    pub created_by: Option<Uuid>,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Uuid),
    /// An order with the same ARC already exists; nothing was written.
    Skipped(Uuid),
}

impl CreateOutcome {
    pub fn order_id(&self) -> Uuid {
        match self {
            CreateOutcome::Created(id) | CreateOutcome::Skipped(id) => *id,
        }
    }
}

/// One entry of the full desired line set sent with an order update.
#[derive(Debug, Clone)]
pub struct DesiredLine {
    pub id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub product_label_pdf: Option<String>,
    pub quantity_ordered: i32,
}

/// Metadata changes of an order. `None` leaves a field untouched; the inner
/// `Option` of nullable fields clears them.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub arc: Option<String>,
    pub client_name: Option<Option<String>>,
    pub order_date: Option<NaiveDate>,
    pub pickup_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub lines: Option<Vec<DesiredLine>>,
}

impl OrderUpdate {
    pub fn touches_metadata(&self) -> bool {
        self.arc.is_some()
            || self.client_name.is_some()
            || self.order_date.is_some()
            || self.pickup_date.is_some()
            || self.priority.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: Uuid,
    pub arc: String,
    pub client_name: Option<String>,
    pub order_date: NaiveDate,
    pub pickup_date: Option<NaiveDate>,
    pub priority: Priority,
    pub production_status: ProductionStatus,
    pub expedition_status: ExpeditionStatus,
    pub production_validated_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderSummary {
    pub fn state(&self) -> OrderState {
        OrderState::derive(self.production_status, self.expedition_status)
    }
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: String,
    pub product_label_pdf: Option<String>,
    pub category: ProductCategory,
    pub quantity_ordered: i32,
    pub quantity_ready: i32,
    pub quantity_shipped: i32,
    pub quantity_loaded: i32,
}

impl OrderLineView {
    /// Label to display: the frozen PDF label wins over the catalog label.
    pub fn display_label(&self) -> &str {
        self.product_label_pdf.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: OrderSummary,
    pub lines: Vec<OrderLineView>,
    pub shipments: Vec<ShipmentView>,
}

#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub priority: Option<Priority>,
    pub state: Option<OrderState>,
    pub archived: bool,
    pub page: i64,
    pub limit: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            search: None,
            priority: None,
            state: None,
            archived: false,
            page: 1,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderSummary>,
    pub total: i64,
}
