use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{NewProduct, Product, ProductUpdate};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{order_products, products_catalog, shipment_lines};

use super::models::{NewProductRow, ProductChangeset, ProductRow};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn product_not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Product {id}"))
}

fn label_taken(conn: &mut PgConnection, label: &str, exclude: Option<Uuid>) -> QueryResult<bool> {
    let mut query = products_catalog::table
        .filter(products_catalog::pdf_label_exact.eq(label))
        .select(products_catalog::id)
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(products_catalog::id.ne(id));
    }
    Ok(query.first::<Uuid>(conn).optional()?.is_some())
}

impl CatalogRepository for DieselCatalogRepository {
    fn list(&self, include_inactive: bool) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = products_catalog::table
            .select(ProductRow::as_select())
            .order(products_catalog::pdf_label_exact.asc())
            .into_boxed();
        if !include_inactive {
            query = query.filter(products_catalog::is_active.eq(true));
        }

        query
            .load(&mut conn)?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        products_catalog::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Product::try_from)
            .transpose()
    }

    fn resolve_labels(&self, labels: &[String]) -> Result<Vec<Product>, DomainError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;

        let mut wanted: Vec<&str> = labels.iter().map(String::as_str).collect();
        wanted.sort_unstable();
        wanted.dedup();

        products_catalog::table
            .filter(products_catalog::pdf_label_exact.eq_any(wanted))
            .filter(products_catalog::is_active.eq(true))
            .select(ProductRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if label_taken(conn, &product.label, None)? {
                return Err(DomainError::Conflict(format!(
                    "a product labelled '{}' already exists",
                    product.label
                )));
            }

            let row = diesel::insert_into(products_catalog::table)
                .values(&NewProductRow {
                    id: Uuid::new_v4(),
                    pdf_label_exact: product.label,
                    category: product.category.as_str().to_string(),
                    weight_per_unit_kg: product.weight_per_unit_kg,
                })
                .returning(ProductRow::as_returning())
                .get_result(conn)?;

            Product::try_from(row)
        })
    }

    fn update(&self, id: Uuid, update: ProductUpdate) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if let Some(label) = &update.label {
                if label_taken(conn, label, Some(id))? {
                    return Err(DomainError::Conflict(format!(
                        "a product labelled '{label}' already exists"
                    )));
                }
            }

            let row = diesel::update(products_catalog::table.find(id))
                .set(&ProductChangeset {
                    pdf_label_exact: update.label,
                    category: update.category.map(|c| c.as_str().to_string()),
                    weight_per_unit_kg: update.weight_per_unit_kg,
                    is_active: update.is_active,
                    updated_at: Some(Utc::now()),
                })
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| product_not_found(id))?;

            Product::try_from(row)
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let in_orders: i64 = order_products::table
                .filter(order_products::product_id.eq(id))
                .count()
                .get_result(conn)?;
            let in_shipments: i64 = shipment_lines::table
                .filter(shipment_lines::product_id.eq(id))
                .count()
                .get_result(conn)?;
            if in_orders + in_shipments > 0 {
                return Err(DomainError::Conflict(format!(
                    "product {id} is referenced by orders; deactivate it instead"
                )));
            }

            let deleted = diesel::delete(products_catalog::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(product_not_found(id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    use super::DieselCatalogRepository;
    use crate::domain::catalog::{NewProduct, ProductCategory, ProductUpdate};
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrder, NewOrderLine, Priority};
    use crate::domain::ports::{CatalogRepository, OrderRepository};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::test_support::setup_db;

    fn roche(label: &str) -> NewProduct {
        NewProduct {
            label: label.to_string(),
            category: ProductCategory::Roche,
            weight_per_unit_kg: BigDecimal::from_str("25.5").unwrap(),
        }
    }

    #[tokio::test]
    async fn create_list_and_deactivate() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let gravel = repo.create(roche("GRAVIER 6/10")).unwrap();
        repo.create(roche("CAILLOU 20/40")).unwrap();
        assert_eq!(gravel.category, ProductCategory::Roche);
        assert!(gravel.is_active);

        let labels: Vec<String> = repo.list(false).unwrap().into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["CAILLOU 20/40", "GRAVIER 6/10"]);

        let updated = repo
            .update(
                gravel.id,
                ProductUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.weight_per_unit_kg, BigDecimal::from_str("25.5").unwrap());

        assert_eq!(repo.list(false).unwrap().len(), 1);
        assert_eq!(repo.list(true).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_labels_conflict() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let first = repo.create(roche("SABLE 0/4")).unwrap();
        let other = repo.create(roche("SABLE 0/2")).unwrap();

        assert!(matches!(
            repo.create(roche("SABLE 0/4")).unwrap_err(),
            DomainError::Conflict(_)
        ));
        let err = repo
            .update(
                other.id,
                ProductUpdate {
                    label: Some("SABLE 0/4".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // renaming a product to its own label is not a conflict
        repo.update(
            first.id,
            ProductUpdate {
                label: Some("SABLE 0/4".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[tokio::test]
    async fn resolve_labels_matches_exactly_and_skips_inactive() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let bag = repo.create(roche("(12) BIG BAG 1000KG")).unwrap();
        let old = repo.create(roche("ANCIEN PRODUIT")).unwrap();
        repo.update(
            old.id,
            ProductUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let found = repo
            .resolve_labels(&[
                "(12) BIG BAG 1000KG".to_string(),
                "(12) BIG BAG 1000KG".to_string(),
                "(12) big bag 1000kg".to_string(),
                "ANCIEN PRODUIT".to_string(),
            ])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, bag.id);

        assert!(repo.resolve_labels(&[]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn referenced_products_cannot_be_deleted() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);

        let used = repo.create(roche("BLOC 50X50")).unwrap();
        let unused = repo.create(roche("BLOC 40X40")).unwrap();
        orders
            .create(NewOrder {
                arc: "555555".to_string(),
                client_name: None,
                order_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                pickup_date: None,
                priority: Priority::Normal,
                created_by: None,
                lines: vec![NewOrderLine {
                    product_id: used.id,
                    product_label_pdf: None,
                    quantity_ordered: 2,
                }],
            })
            .unwrap();

        assert!(matches!(
            repo.delete(used.id).unwrap_err(),
            DomainError::Conflict(_)
        ));
        repo.delete(unused.id).unwrap();
        assert!(repo.find_by_id(unused.id).unwrap().is_none());
        assert!(matches!(
            repo.delete(unused.id).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }
}
