use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use crate::domain::catalog::{NewProduct, Product, ProductUpdate};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

pub struct CatalogService<R> {
    repo: R,
}

fn normalize_label(raw: &str) -> Result<String, DomainError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(DomainError::InvalidInput(
            "product label must not be empty".to_string(),
        ));
    }
    Ok(label.to_string())
}

/// Kilograms stored as `NUMERIC(10, 3)`.
const WEIGHT_SCALE: i64 = 3;
const WEIGHT_LIMIT_KG: u32 = 10_000_000;

fn check_weight(weight: &BigDecimal) -> Result<(), DomainError> {
    if *weight <= BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "weight per unit must be > 0, got {weight}"
        )));
    }
    let (_, scale) = weight.normalized().as_bigint_and_exponent();
    if scale > WEIGHT_SCALE {
        return Err(DomainError::InvalidInput(format!(
            "weight per unit allows at most {WEIGHT_SCALE} decimals, got {weight}"
        )));
    }
    if *weight >= BigDecimal::from(WEIGHT_LIMIT_KG) {
        return Err(DomainError::InvalidInput(format!(
            "weight per unit must be below {WEIGHT_LIMIT_KG} kg, got {weight}"
        )));
    }
    Ok(())
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, include_inactive: bool) -> Result<Vec<Product>, DomainError> {
        self.repo.list(include_inactive)
    }

    pub fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        check_weight(&product.weight_per_unit_kg)?;
        let product = self.repo.create(NewProduct {
            label: normalize_label(&product.label)?,
            ..product
        })?;
        log::info!("catalog product '{}' created", product.label);
        Ok(product)
    }

    pub fn update(&self, id: Uuid, update: ProductUpdate) -> Result<Product, DomainError> {
        if let Some(weight) = &update.weight_per_unit_kg {
            check_weight(weight)?;
        }
        let label = update.label.as_deref().map(normalize_label).transpose()?;
        self.repo.update(id, ProductUpdate { label, ..update })
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id)?;
        log::info!("catalog product {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::catalog::ProductCategory;

    #[derive(Default)]
    struct RecordingCatalog {
        created: Mutex<Vec<NewProduct>>,
    }

    impl CatalogRepository for RecordingCatalog {
        fn list(&self, _include_inactive: bool) -> Result<Vec<Product>, DomainError> {
            Ok(vec![])
        }

        fn find_by_id(&self, _id: Uuid) -> Result<Option<Product>, DomainError> {
            Ok(None)
        }

        fn resolve_labels(&self, _labels: &[String]) -> Result<Vec<Product>, DomainError> {
            Ok(vec![])
        }

        fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
            self.created.lock().unwrap().push(product.clone());
            Ok(Product {
                id: Uuid::new_v4(),
                label: product.label,
                category: product.category,
                weight_per_unit_kg: product.weight_per_unit_kg,
                is_active: true,
            })
        }

        fn update(&self, id: Uuid, _update: ProductUpdate) -> Result<Product, DomainError> {
            Err(DomainError::NotFound(format!("Product {id}")))
        }

        fn delete(&self, _id: Uuid) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn product(label: &str, weight: &str) -> NewProduct {
        NewProduct {
            label: label.to_string(),
            category: ProductCategory::BigBag,
            weight_per_unit_kg: BigDecimal::from_str(weight).unwrap(),
        }
    }

    #[test]
    fn create_trims_the_label() {
        let svc = CatalogService::new(RecordingCatalog::default());
        let created = svc.create(product("  (12) BIG BAG 1000KG ", "1000")).unwrap();
        assert_eq!(created.label, "(12) BIG BAG 1000KG");
    }

    #[test]
    fn invalid_products_are_rejected_before_the_store() {
        let svc = CatalogService::new(RecordingCatalog::default());

        for bad in [product("   ", "10"), product("SABLE", "0"), product("SABLE", "-1.5")] {
            assert!(matches!(
                svc.create(bad).unwrap_err(),
                DomainError::InvalidInput(_)
            ));
        }
        assert!(svc.repo.created.lock().unwrap().is_empty());

        let err = svc
            .update(
                Uuid::new_v4(),
                ProductUpdate {
                    label: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn weights_must_fit_the_stored_precision() {
        let svc = CatalogService::new(RecordingCatalog::default());

        for bad in ["0.0001", "1.2345", "10000000", "123456789.5"] {
            let err = svc.create(product("SABLE 0/4", bad)).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidInput(_)),
                "{bad} should be rejected, got {err:?}"
            );
        }
        assert!(svc.repo.created.lock().unwrap().is_empty());

        for good in ["0.001", "1.5000", "9999999.999", "1e3"] {
            svc.create(product("SABLE 0/4", good)).unwrap();
        }
        assert_eq!(svc.repo.created.lock().unwrap().len(), 4);

        let err = svc
            .update(
                Uuid::new_v4(),
                ProductUpdate {
                    weight_per_unit_kg: Some(BigDecimal::from_str("0.0005").unwrap()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
