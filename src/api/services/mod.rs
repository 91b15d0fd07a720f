pub mod admin;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod health;
pub mod redirect;

pub use admin::admin_v1_routes;
pub use auth::{ClientIpKeyExtractor, auth_routes};
pub use catalog::{catalog_routes, home_route};
pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
