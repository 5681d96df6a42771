//! HTTP endpoint modules.

pub mod flash;
pub mod health;
pub mod upload;

pub use health::configure_health_routes;
pub use upload::configure_routes as configure_upload_routes;
