pub mod catalog_repo;
pub mod comment_repo;
pub mod models;
pub mod order_repo;
pub mod outbox;
pub mod production_repo;
pub mod queries;
pub mod shipment_repo;

#[cfg(test)]
pub mod test_support;
