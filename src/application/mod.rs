pub mod catalog_service;
pub mod comment_service;
pub mod order_service;
pub mod production_service;
pub mod shipment_service;
