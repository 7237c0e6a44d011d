use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::types::Fortune;
use crate::types::World;

/// Source of uniformly distributed integers over `[1, upper]`.
///
/// Implementations are shared by all concurrent operations and must not serialize them behind a single lock.
pub trait RandomSource: Debug + Send + Sync + 'static {
    /// Draw a `world` key.
    fn next_key(&self, upper: i32) -> i32;

    /// Draw a new payload value. Unless overridden, values come from the same range as keys.
    fn next_value(&self, upper: i32) -> i32 {
        self.next_key(upper)
    }
}

/// The record access contract shared by the direct [`Repository`](crate::Repository) and the
/// [`CachedRepository`](crate::CachedRepository) decorating it.
///
/// Counts are expected to be validated by the caller; no clamping is done here.
#[async_trait]
pub trait WorldRepository: Debug + Send + Sync + 'static {
    /// Size `N` of the dense key range `[1, N]`.
    fn world_count(&self) -> i32;

    fn random_source(&self) -> Arc<dyn RandomSource>;

    /// One record for a uniformly drawn key.
    async fn fetch_random(&self) -> Result<World>;

    /// `count` records for independently drawn keys, in draw order.
    async fn fetch_many(&self, count: usize) -> Result<Vec<World>>;

    /// The complete record set keyed by id.
    async fn fetch_all(&self) -> Result<HashMap<i32, World>>;

    /// Assign fresh random values to `count` randomly drawn records. The returned records are sorted by id in
    /// ascending order, which is also the order they are written in.
    async fn update_many(&self, count: usize) -> Result<Vec<World>>;

    /// All fortunes in backend order.
    async fn fetch_fortunes(&self) -> Result<Vec<Fortune>>;
}
