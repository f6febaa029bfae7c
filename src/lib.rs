// Library exports for testing and reusability

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use services::route_generator::RouteGenerator;

// App state for sharing across the application
pub struct AppState {
    pub route_generator: RouteGenerator,
    /// Masked provider credential for diagnostics.
    pub ors_key_hint: String,
}
