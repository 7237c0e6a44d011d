//! Schema bootstrap and seeding for the `world` and `fortune` tables.
use std::time::Instant;

use sea_orm::sea_query::Alias;
use sea_orm::sea_query::ColumnDef;
use sea_orm::sea_query::Query;
use sea_orm::sea_query::Table;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use sea_orm::TransactionTrait;
use sea_orm_migration::SchemaManager;
use tracing::info;
use tracing::instrument;

use crate::error::Result;
use crate::statements::check_identifier;
use crate::statements::Tables;
use crate::traits::RandomSource;
use crate::types::Fortune;
use crate::types::World;

// Keeps bound parameters of a single insert under SQLite's historic limit of 999.
const INSERT_CHUNK: usize = 400;

// Unquoted identifiers fold to lower case in PostgreSQL; the statements refer to the column unquoted.
const RANDOM_NUMBER: &str = "randomnumber";

/// Create missing tables. The warm table is only created when it differs from the world table.
#[instrument(level = "trace", skip(db))]
pub async fn create_schema(db: &DatabaseConnection, tables: &Tables) -> Result<()> {
    tables.validate()?;
    let manager = SchemaManager::new(db);

    manager.create_table(world_table(&tables.world)).await?;
    if tables.warm != tables.world {
        manager.create_table(world_table(&tables.warm)).await?;
    }

    manager
        .create_table(
            Table::create()
                .table(Alias::new(&tables.fortune))
                .if_not_exists()
                .col(ColumnDef::new(Alias::new("id")).integer().not_null().primary_key())
                .col(ColumnDef::new(Alias::new("message")).string_len(2048).not_null())
                .to_owned(),
        )
        .await?;

    Ok(())
}

/// Drop the configured tables if they exist and create them anew.
#[instrument(level = "trace", skip(db))]
pub async fn recreate_schema(db: &DatabaseConnection, tables: &Tables) -> Result<()> {
    tables.validate()?;
    let manager = SchemaManager::new(db);

    for name in [&tables.world, &tables.warm, &tables.fortune] {
        manager
            .drop_table(Table::drop().table(Alias::new(name)).if_exists().to_owned())
            .await?;
    }

    create_schema(db, tables).await
}

fn world_table(name: &str) -> sea_orm::sea_query::TableCreateStatement {
    Table::create()
        .table(Alias::new(name))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new("id")).integer().not_null().primary_key())
        .col(ColumnDef::new(Alias::new(RANDOM_NUMBER)).integer().not_null().default(0))
        .to_owned()
}

/// Insert the given rows into a world-shaped table within a single transaction.
#[instrument(level = "trace", skip(db, worlds), fields(count = worlds.len()))]
pub async fn seed_worlds(db: &DatabaseConnection, table: &str, worlds: &[World]) -> Result<()> {
    check_identifier(table)?;
    let backend = db.get_database_backend();
    let txn = db.begin().await?;

    for chunk in worlds.chunks(INSERT_CHUNK) {
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(table))
            .columns([Alias::new("id"), Alias::new(RANDOM_NUMBER)]);
        for world in chunk {
            insert.values_panic([world.id.into(), world.random_number.into()]);
        }
        txn.execute(backend.build(&insert)).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Fill a world-shaped table with the dense key range `[1, count]` and random values.
pub async fn seed_random_worlds(
    db: &DatabaseConnection,
    table: &str,
    count: i32,
    random: &dyn RandomSource,
) -> Result<()> {
    let started = Instant::now();
    let worlds = (1..=count)
        .map(|id| World::new(id, random.next_value(count)))
        .collect::<Vec<_>>();
    seed_worlds(db, table, &worlds).await?;
    info!(
        "Seeded {count} rows into '{table}' in {:.2}s",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[instrument(level = "trace", skip(db, fortunes), fields(count = fortunes.len()))]
pub async fn seed_fortunes(db: &DatabaseConnection, table: &str, fortunes: &[Fortune]) -> Result<()> {
    check_identifier(table)?;
    let backend = db.get_database_backend();
    let txn = db.begin().await?;

    for chunk in fortunes.chunks(INSERT_CHUNK) {
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(table))
            .columns([Alias::new("id"), Alias::new("message")]);
        for fortune in chunk {
            insert.values_panic([fortune.id.into(), fortune.message.clone().into()]);
        }
        txn.execute(backend.build(&insert)).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// The standard fortune set.
pub fn default_fortunes() -> Vec<Fortune> {
    [
        "fortune: No such file or directory",
        "A computer scientist is someone who fixes things that aren't broken.",
        "After enough decimal places, nobody gives a damn.",
        "A bad random number generator: 1, 1, 1, 1, 1, 4.33e+67, 1, 1, 1",
        "A computer program does what you tell it to do, not what you want it to do.",
        "Emacs is a nice operating system, but I prefer UNIX. \u{2014} Tom Christaensen",
        "Any program that runs right is obsolete.",
        "A list is only as strong as its weakest link. \u{2014} Donald Knuth",
        "Feature: A bug with seniority.",
        "Computers make very fast, very accurate mistakes.",
        "<script>alert(\"This should not be displayed in a browser alert box.\");</script>",
        "\u{30d5}\u{30ec}\u{30fc}\u{30e0}\u{30ef}\u{30fc}\u{30af}\u{306e}\u{30d9}\u{30f3}\u{30c1}\u{30de}\u{30fc}\u{30af}",
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, message)| Fortune::new(idx as i32 + 1, message))
    .collect()
}

/// Create the schema and populate it with `world_count` random worlds plus the standard fortunes. A distinct warm
/// table receives a copy of the world rows.
#[instrument(level = "trace", skip(db, random))]
pub async fn bootstrap(
    db: &DatabaseConnection,
    tables: &Tables,
    world_count: i32,
    random: &dyn RandomSource,
) -> Result<()> {
    recreate_schema(db, tables).await?;
    seed_random_worlds(db, &tables.world, world_count, random).await?;
    if tables.warm != tables.world {
        let copy = Query::insert()
            .into_table(Alias::new(&tables.warm))
            .columns([Alias::new("id"), Alias::new(RANDOM_NUMBER)])
            .select_from(
                Query::select()
                    .columns([Alias::new("id"), Alias::new(RANDOM_NUMBER)])
                    .from(Alias::new(&tables.world))
                    .to_owned(),
            )
            .map_err(|e| sea_orm::DbErr::Custom(e.to_string()))?
            .to_owned();
        db.execute(db.get_database_backend().build(&copy)).await?;
    }
    seed_fortunes(db, &tables.fortune, &default_fortunes()).await?;
    Ok(())
}
