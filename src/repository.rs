//! Direct, uncached access to the `world` and `fortune` tables.
use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use sea_orm::FromQueryResult;
use sea_orm::TransactionTrait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;
use tracing::instrument;

use crate::db::driver::DatabaseDriver;
use crate::error::Error;
use crate::error::Result;
use crate::random::ThreadRandom;
use crate::statements::Statements;
use crate::statements::Tables;
use crate::traits::RandomSource;
use crate::traits::WorldRepository;
use crate::types::Fortune;
use crate::types::World;

/// Default size of the dense key range.
pub const DEFAULT_WORLD_COUNT: i32 = 10_000;

/// The data access layer. Sole reader and writer of the backend tables; every operation suspends at statement
/// execution and none of them retries.
pub struct Repository<D>
where
    D: DatabaseDriver,
{
    driver:      Arc<D>,
    statements:  Statements,
    random:      Arc<dyn RandomSource>,
    world_count: i32,
}

impl<D> Repository<D>
where
    D: DatabaseDriver,
{
    /// Bind the statement set for the driver's backend. Draws use [`ThreadRandom`] until replaced with
    /// [`with_random`](Self::with_random).
    pub fn new(driver: Arc<D>, tables: Tables, world_count: i32) -> Result<Self> {
        let backend = driver.connection().get_database_backend();
        let statements = Statements::prepare(backend, tables)?;
        Ok(Self {
            driver,
            statements,
            random: Arc::new(ThreadRandom),
            world_count,
        })
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn driver(&self) -> Arc<D> {
        self.driver.clone()
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    #[inline]
    fn next_key(&self) -> i32 {
        self.random.next_key(self.world_count)
    }

    /// Fetch a single record by id.
    #[instrument(level = "trace", skip(self))]
    pub async fn fetch_by_id(&self, id: i32) -> Result<World> {
        World::find_by_statement(self.statements.select_world(id))
            .one(&self.driver.connection())
            .await?
            .ok_or_else(|| Error::NotFound {
                table: self.statements.tables().world.clone(),
                id,
            })
    }

    /// Write all records as one batch, in the order given.
    #[instrument(level = "trace", skip(self, worlds), fields(count = worlds.len()))]
    pub async fn write_batch(&self, worlds: &[World]) -> Result<()> {
        let db = self.driver.connection();
        let transaction = db.begin().await?;

        for world in worlds {
            transaction.execute(self.statements.update_world(world)).await?;
        }

        transaction.commit().await?;
        debug!("Wrote batch of {} worlds", worlds.len());
        Ok(())
    }
}

#[async_trait]
impl<D> WorldRepository for Repository<D>
where
    D: DatabaseDriver,
{
    fn world_count(&self) -> i32 {
        self.world_count
    }

    fn random_source(&self) -> Arc<dyn RandomSource> {
        self.random.clone()
    }

    async fn fetch_random(&self) -> Result<World> {
        self.fetch_by_id(self.next_key()).await
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_many(&self, count: usize) -> Result<Vec<World>> {
        let mut worlds = Vec::with_capacity(count);
        for _ in 0..count {
            worlds.push(self.fetch_random().await?);
        }
        Ok(worlds)
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_all(&self) -> Result<HashMap<i32, World>> {
        let rows = World::find_by_statement(self.statements.select_all_worlds())
            .all(&self.driver.connection())
            .await?;
        debug!("Fetched {} worlds from '{}'", rows.len(), self.statements.tables().warm);
        Ok(rows.into_iter().map(|w| (w.id, w)).collect())
    }

    #[instrument(level = "trace", skip(self))]
    async fn update_many(&self, count: usize) -> Result<Vec<World>> {
        let mut worlds = Vec::with_capacity(count);
        for _ in 0..count {
            let base = self.fetch_random().await?;
            worlds.push(World::new(base.id, self.random.next_value(self.world_count)));
        }

        // Concurrent batches must lock rows in the same order or the backend may deadlock. The sort is stable, so
        // duplicate ids keep their draw order and the last drawn value wins.
        worlds.sort_by_key(|w| w.id);

        self.write_batch(&worlds).await?;
        Ok(worlds)
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_fortunes(&self) -> Result<Vec<Fortune>> {
        Ok(Fortune::find_by_statement(self.statements.select_fortunes())
            .all(&self.driver.connection())
            .await?)
    }
}

impl<D> Debug for Repository<D>
where
    D: DatabaseDriver,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("driver", &self.driver.name())
            .field("tables", self.statements.tables())
            .field("world_count", &self.world_count)
            .finish()
    }
}
