#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use sea_orm::DbBackend;
use sea_orm::FromQueryResult;
use sea_orm::Statement;
use tempfile::TempDir;
use world_cache::db::driver::sqlite::Sqlite;
use world_cache::db::schema;
use world_cache::prelude::*;

pub type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// A SQLite database living in its own temporary directory. The directory goes away with the value.
pub struct TestDb {
    pub driver: Arc<Sqlite>,
    _dir:       TempDir,
}

impl TestDb {
    pub async fn new(tables: &Tables) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::Builder::new().prefix("world-cache-test").tempdir()?;
        let driver = Sqlite::connect(dir.path(), "world.db", 4).await?;
        driver.configure().await?;
        schema::create_schema(&driver.connection(), tables).await?;
        Ok(Self {
            driver: Arc::new(driver),
            _dir:   dir,
        })
    }

    /// Default tables with the given worlds and the standard fortunes.
    pub async fn with_worlds(worlds: &[World]) -> Result<Self, Box<dyn std::error::Error>> {
        let tables = Tables::default();
        let db = Self::new(&tables).await?;
        schema::seed_worlds(&db.driver.connection(), &tables.world, worlds).await?;
        schema::seed_fortunes(&db.driver.connection(), &tables.fortune, &schema::default_fortunes()).await?;
        Ok(db)
    }

    /// Default tables with `count` random worlds.
    pub async fn with_random_worlds(count: i32) -> Result<Self, Box<dyn std::error::Error>> {
        let tables = Tables::default();
        let db = Self::new(&tables).await?;
        schema::seed_random_worlds(&db.driver.connection(), &tables.world, count, &ThreadRandom).await?;
        Ok(db)
    }

    pub fn repository(&self, world_count: i32) -> Result<Repository<Sqlite>, Error> {
        Repository::new(self.driver.clone(), Tables::default(), world_count)
    }

    /// Record every update applied to `world`, in application order.
    pub async fn audit_updates(&self) -> Result<(), Error> {
        let db = self.driver.connection();
        db.execute_unprepared(
            "CREATE TABLE world_audit (seq INTEGER PRIMARY KEY AUTOINCREMENT, id INTEGER NOT NULL, randomnumber \
             INTEGER NOT NULL)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE TRIGGER world_audit_update AFTER UPDATE ON world BEGIN INSERT INTO world_audit (id, randomnumber) \
             VALUES (NEW.id, NEW.randomnumber); END",
        )
        .await?;
        Ok(())
    }

    pub async fn audited(&self) -> Result<Vec<World>, Error> {
        Ok(World::find_by_statement(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT id, randomnumber AS random_number FROM world_audit ORDER BY seq",
        ))
        .all(&self.driver.connection())
        .await?)
    }
}

pub fn worlds(pairs: &[(i32, i32)]) -> Vec<World> {
    pairs.iter().map(|&(id, value)| World::new(id, value)).collect()
}

pub fn is_sorted_by_id(worlds: &[World]) -> bool {
    worlds.windows(2).all(|w| w[0].id <= w[1].id)
}
