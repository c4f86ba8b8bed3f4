mod auth_routes;
pub mod config;
mod error;
mod http_layers;
mod library_routes;
pub mod metrics;
pub mod server;
mod session;
pub mod state;
mod user_routes;
mod validation;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::Session;
