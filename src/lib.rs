//! Accounts, bearer-token sessions and per-user favorite countries for the
//! geowise country explorer.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;
pub mod users;
pub mod validation;

pub use app::build_app;
pub use error::{AppError, AppResult};
pub use state::AppState;
