use bigdecimal::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    BigBag,
    Roche,
    Autre,
}

db_code_enum!(ProductCategory, "category", {
    BigBag => "BIGBAG",
    Roche => "ROCHE",
    Autre => "AUTRE",
});

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    /// Exact label as printed on the receipt PDFs.
    pub label: String,
    pub category: ProductCategory,
    pub weight_per_unit_kg: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub label: String,
    pub category: ProductCategory,
    pub weight_per_unit_kg: BigDecimal,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub label: Option<String>,
    pub category: Option<ProductCategory>,
    pub weight_per_unit_kg: Option<BigDecimal>,
    pub is_active: Option<bool>,
}
