pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use application::catalog_service::CatalogService;
use application::comment_service::CommentService;
use application::order_service::OrderService;
use application::production_service::ProductionService;
use application::shipment_service::ShipmentService;
use handlers::{catalog, comments, health, orders, production, shipments};
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::comment_repo::DieselCommentRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::production_repo::DieselProductionRepository;
use infrastructure::shipment_repo::DieselShipmentRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    // One instance of each service shared by all workers
    let order_service = web::Data::new(OrderService::new(
        DieselOrderRepository::new(pool.clone()),
        DieselCatalogRepository::new(pool.clone()),
    ));
    let production_service = web::Data::new(ProductionService::new(
        DieselProductionRepository::new(pool.clone()),
    ));
    let shipment_service =
        web::Data::new(ShipmentService::new(DieselShipmentRepository::new(pool.clone())));
    let comment_service =
        web::Data::new(CommentService::new(DieselCommentRepository::new(pool.clone())));
    let catalog_service = web::Data::new(CatalogService::new(DieselCatalogRepository::new(pool)));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(order_service.clone())
            .app_data(production_service.clone())
            .app_data(shipment_service.clone())
            .app_data(comment_service.clone())
            .app_data(catalog_service.clone())
            .wrap(Logger::default())
            .route("/health", web::get().to(health::health))
            .service(
                web::scope("/products")
                    .route("", web::get().to(catalog::list_products))
                    .route("", web::post().to(catalog::create_product))
                    .route("/{id}", web::patch().to(catalog::update_product))
                    .route("/{id}", web::delete().to(catalog::delete_product)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::create_order))
                    .route("", web::get().to(orders::list_orders))
                    .route("/import", web::post().to(orders::import_order))
                    .route("/archived", web::get().to(orders::list_archived_orders))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}", web::patch().to(orders::update_order))
                    .route("/{id}", web::delete().to(orders::delete_order))
                    .route(
                        "/{id}/lines/{line_id}/ready",
                        web::put().to(production::set_line_ready),
                    )
                    .route(
                        "/{id}/production/validate",
                        web::post().to(production::validate_production),
                    )
                    .route(
                        "/{id}/lines/{line_id}/loaded",
                        web::put().to(shipments::set_line_loaded),
                    )
                    .route("/{id}/depart", web::post().to(shipments::depart))
                    .route("/{id}/acknowledge", web::post().to(shipments::acknowledge))
                    .route("/{id}/comments", web::get().to(comments::list_comments))
                    .route("/{id}/comments", web::post().to(comments::post_comment))
                    .route(
                        "/{id}/comments/unread",
                        web::get().to(comments::unread_count),
                    ),
            )
            .route("/production/worklist", web::get().to(production::worklist))
            .route("/shipments/pending", web::get().to(shipments::pending))
            .service(openapi::swagger_ui())
    })
    .bind((host.to_string(), port))?
    .run())
}
