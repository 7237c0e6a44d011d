//! # world-cache
//!
//! A warm, write-through record cache in front of a relational `world` table.
//!
//! The crate targets a fixed, closed-world dataset: `N` records with dense keys `[1, N]`, read at random and updated in
//! random batches by many concurrent requests, plus a small read-only `fortune` table.
//!
//! # The Basics
//!
//! There are two implementations of one contract, [`WorldRepository`]:
//!
//! - [`Repository`] talks to the backend directly. It owns the connection pool (through a
//!   [`DatabaseDriver`](db::driver::DatabaseDriver)) and the fixed set of [`Statements`](statements::Statements).
//! - [`CachedRepository`] decorates any other repository. It loads the complete record set once, on construction,
//!   then serves batch reads from memory and mirrors every batch update it forwards to its delegate.
//!
//! Batch updates are always written in ascending key order, within one transaction. Concurrent batches touching the
//! same rows therefore acquire row locks in the same order and cannot deadlock each other.
//!
//! ```ignore
//! let driver = Arc::new(Sqlite::connect(dir, "world.db", 8).await?);
//! let repository = Arc::new(Repository::new(driver, Tables::default(), 10_000)?);
//! let cached = CachedRepository::new(repository).await?;
//!
//! let worlds = cached.fetch_many(20).await?;
//! let updated = cached.update_many(20).await?;
//! ```
//!
//! # Feature flags
//!
//! - `pg`, `sqlite`, `mysql` select the sea-orm backends to build with. `pg` and `sqlite` are on by default.

pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod random;
pub mod repository;
pub mod statements;
pub mod traits;
pub mod types;
pub mod workload;

#[doc(inline)]
pub use cache::CachedRepository;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use repository::Repository;
#[doc(inline)]
pub use traits::WorldRepository;

pub mod prelude {
    pub use crate::cache::CachedRepository;
    pub use crate::db::driver::DatabaseDriver;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::random::ScriptedRandom;
    pub use crate::random::ThreadRandom;
    pub use crate::repository::Repository;
    pub use crate::statements::Tables;
    pub use crate::traits::RandomSource;
    pub use crate::traits::WorldRepository;
    pub use crate::types::*;
}
