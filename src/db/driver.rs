//! Database drivers.
#[cfg(feature = "pg")]
pub mod pg;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::error::Result;

/// Owner of a backend connection pool.
#[async_trait]
pub trait DatabaseDriver: Debug + Sync + Send + 'static {
    /// Return driver name.
    fn name(&self) -> &'static str;
    /// Returns a handle to the driver's connection pool. Handles are cheap to clone and share the same pool.
    fn connection(&self) -> DatabaseConnection;
    /// Apply backend session settings. See corresponding driver implementation for details.
    async fn configure(&self) -> Result<()>;
}
