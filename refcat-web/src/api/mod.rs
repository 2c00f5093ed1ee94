//! HTTP API handlers for refcat-web

pub mod auth;
pub mod health;
pub mod poll;
pub mod resources;
pub mod revalidate;

pub use auth::CronAuth;
pub use health::health_routes;
pub use poll::poll_routes;
pub use resources::resource_routes;
pub use revalidate::revalidate_routes;
