//! Staffchart - HR org chart backend
//!
//! Stores departments, positions, their staffing and reporting links, and
//! employees, and builds the organization hierarchy the org-chart screens
//! render.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod middleware;
pub mod routes;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
