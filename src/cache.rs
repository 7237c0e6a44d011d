use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::instrument;

use crate::error::Error;
use crate::error::Result;
use crate::traits::RandomSource;
use crate::traits::WorldRepository;
use crate::types::Fortune;
use crate::types::World;

/// Warm, write-through cache of the complete `world` record set.
///
/// ```ignore
/// let repository = Arc::new(Repository::new(driver, Tables::default(), 10_000)?);
/// // Returns only after every record has been loaded.
/// let cached = CachedRepository::new(repository).await?;
///
/// let worlds = cached.fetch_many(20).await?;  // served from memory
/// let updated = cached.update_many(20).await?; // written to the backend, then mirrored here
/// ```
///
/// The cache is populated once, from the delegate's [`fetch_all`](WorldRepository::fetch_all), and from then on only
/// changes through [`update_many`](WorldRepository::update_many) of this same instance. There is no invalidation and
/// no expiry; writes made to the backend by anyone else are not observed.
///
/// Only batch reads are served from memory. [`fetch_random`](WorldRepository::fetch_random) goes to the delegate.
pub struct CachedRepository<R>
where
    R: WorldRepository,
{
    delegate: Arc<R>,
    worlds:   Cache<i32, World>,
}

impl<R> CachedRepository<R>
where
    R: WorldRepository,
{
    /// Load the full record set from `delegate`. The cache is complete by the time this returns.
    #[instrument(level = "trace", skip(delegate))]
    pub async fn new(delegate: Arc<R>) -> Result<Self> {
        let started = Instant::now();
        let all = delegate.fetch_all().await?;

        // Unbounded: the key space is fixed and nothing may ever be evicted.
        let worlds = Cache::builder()
            .name("worlds")
            .initial_capacity(all.len())
            .build();

        for (id, world) in all {
            worlds.insert(id, world).await;
        }

        info!(
            "World cache warmed with {} records in {:.3}s",
            worlds.entry_count(),
            started.elapsed().as_secs_f64()
        );

        Ok(Self { delegate, worlds })
    }

    pub fn delegate(&self) -> Arc<R> {
        self.delegate.clone()
    }

    /// Look up a record in memory.
    pub async fn get(&self, id: i32) -> Result<World> {
        self.worlds.get(&id).await.ok_or(Error::CacheMiss { id })
    }

    /// Number of cached records. Pending internal bookkeeping may make it lag briefly behind recent inserts.
    pub fn len(&self) -> u64 {
        self.worlds.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R> WorldRepository for CachedRepository<R>
where
    R: WorldRepository,
{
    fn world_count(&self) -> i32 {
        self.delegate.world_count()
    }

    fn random_source(&self) -> Arc<dyn RandomSource> {
        self.delegate.random_source()
    }

    async fn fetch_random(&self) -> Result<World> {
        self.delegate.fetch_random().await
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_many(&self, count: usize) -> Result<Vec<World>> {
        let random = self.delegate.random_source();
        let upper = self.delegate.world_count();
        let mut worlds = Vec::with_capacity(count);
        for _ in 0..count {
            worlds.push(self.get(random.next_key(upper)).await?);
        }
        Ok(worlds)
    }

    async fn fetch_all(&self) -> Result<HashMap<i32, World>> {
        self.delegate.fetch_all().await
    }

    #[instrument(level = "trace", skip(self))]
    async fn update_many(&self, count: usize) -> Result<Vec<World>> {
        let worlds = self.delegate.update_many(count).await?;
        for world in &worlds {
            self.worlds.insert(world.id, *world).await;
        }
        debug!("Mirrored {} updated worlds", worlds.len());
        Ok(worlds)
    }

    async fn fetch_fortunes(&self) -> Result<Vec<Fortune>> {
        self.delegate.fetch_fortunes().await
    }
}

impl<R> Debug for CachedRepository<R>
where
    R: WorldRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRepository")
            .field("delegate", &self.delegate)
            .field("entries", &self.worlds.entry_count())
            .finish()
    }
}
