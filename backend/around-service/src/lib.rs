/// around-service: location-tagged posts with geo-radius search
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod state;

pub use app::build_app;
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
