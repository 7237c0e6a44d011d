use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity, protocol, or query execution failure reported by the backend.
    #[error("backend error: {0}")]
    Backend(#[from] DbErr),

    /// A fetch by key returned no row for a key that must exist in the dense range.
    #[error("no row for id {id} in table '{table}'")]
    NotFound { table: String, id: i32 },

    /// The warm cache has no entry for an in-range key. Signals a cache maintenance bug.
    #[error("cache has no entry for id {id}")]
    CacheMiss { id: i32 },

    #[error("'{0}' is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Builder(#[from] fieldx::error::FieldXError),
}
