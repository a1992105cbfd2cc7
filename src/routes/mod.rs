// Route exports
pub mod boost;

use actix_web::web;

use crate::services::catalog::ProfileCatalog;
use crate::services::store::GameStore;

pub use boost::AppState;

pub fn configure_routes<S, C>(cfg: &mut web::ServiceConfig)
where
    S: GameStore + 'static,
    C: ProfileCatalog + 'static,
{
    cfg.service(web::scope("/api/v1").configure(boost::configure::<S, C>));
}
