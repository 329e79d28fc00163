//! HTTP API handlers for gallery-server

pub mod admin;
pub mod health;
pub mod paintings;

pub use admin::admin_routes;
pub use health::health_routes;
pub use paintings::catalog_routes;
