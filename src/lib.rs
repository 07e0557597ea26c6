pub mod actuator;
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod comm;
pub mod controller;
pub mod error;
pub mod middleware;

// Re-export bootstrap entry points
pub use bootstrap::{launch, AppBootstrap, AppContext};
