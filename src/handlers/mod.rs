pub mod catalog;
pub mod comments;
pub mod health;
pub mod orders;
pub mod production;
pub mod shipments;

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::application::catalog_service::CatalogService;
use crate::application::comment_service::CommentService;
use crate::application::order_service::OrderService;
use crate::application::production_service::ProductionService;
use crate::application::shipment_service::ShipmentService;
use crate::errors::AppError;
use crate::infrastructure::catalog_repo::DieselCatalogRepository;
use crate::infrastructure::comment_repo::DieselCommentRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::production_repo::DieselProductionRepository;
use crate::infrastructure::shipment_repo::DieselShipmentRepository;

pub type Orders = OrderService<DieselOrderRepository, DieselCatalogRepository>;
pub type Production = ProductionService<DieselProductionRepository>;
pub type Shipping = ShipmentService<DieselShipmentRepository>;
pub type Comments = CommentService<DieselCommentRepository>;
pub type Catalog = CatalogService<DieselCatalogRepository>;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated caller, taken from the `X-User-Id` header set by the
/// upstream auth proxy.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(Actor)
            .ok_or(AppError::Unauthorized);
        ready(actor)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Parses an optional code-valued query parameter such as `priority=URGENT`.
pub(crate) fn parse_param<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = crate::domain::errors::DomainError>,
{
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(AppError::from))
        .transpose()
}
