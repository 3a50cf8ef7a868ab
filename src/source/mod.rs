//! Loaders for the organization tables
//!
//! The server reads straight from the database; the CLI can read the same
//! tables from a running instance over its REST API.

pub mod database;
pub mod remote;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::hierarchy::OrgTables;

pub use database::{load_tables, DatabaseSource};
pub use remote::RemoteSource;

/// Something that can produce a complete set of organization tables
#[async_trait]
pub trait OrgSource: Send + Sync {
    async fn load(&self) -> AppResult<OrgTables>;
}
