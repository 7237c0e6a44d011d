use std::path::PathBuf;

use fieldx::fxstruct;
use garde::Validate;

use crate::repository::DEFAULT_WORLD_COUNT;
use crate::statements::Tables;

/// Operations the workload driver can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// One random record per request.
    Db,
    /// `--queries` random records per request.
    Queries,
    /// `--queries` random records updated per request.
    Updates,
    /// The sorted fortunes page per request.
    Fortunes,
    /// Every mode above, one after another.
    All,
}

impl Mode {
    pub fn expand(self) -> Vec<Mode> {
        match self {
            Mode::All => vec![Mode::Db, Mode::Queries, Mode::Updates, Mode::Fortunes],
            mode => vec![mode],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Db => "db",
            Mode::Queries => "queries",
            Mode::Updates => "updates",
            Mode::Fortunes => "fortunes",
            Mode::All => "all",
        }
    }
}

#[derive(Debug, Clone, clap::Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, author, name = "world-bench")]
pub struct Cli {
    /// Use PostgreSQL as the database backend.
    #[clap(long, env = "WORLDCACHE_PG", default_value_t = false)]
    #[garde(custom(Self::feature_enabled(cfg!(feature = "pg"), "pg")))]
    pg: bool,

    #[clap(long, env = "WORLDCACHE_PG_HOST", default_value = "tfb-database")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_host: String,

    #[clap(long, env = "WORLDCACHE_PG_PORT", default_value_t = 5432)]
    #[garde(skip)]
    pg_port: u16,

    #[clap(long, env = "WORLDCACHE_PG_DATABASE", default_value = "hello_world")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_database: String,

    #[clap(long, env = "WORLDCACHE_PG_USER", default_value = "benchmarkdbuser")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_user: String,

    #[clap(
        long,
        env = "WORLDCACHE_PG_PASSWORD",
        hide_env_values = true,
        default_value = "benchmarkdbpass"
    )]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_password: String,

    /// Use SQLite as the database backend.
    #[clap(long, env = "WORLDCACHE_SQLITE", default_value_t = false)]
    #[garde(custom(Self::feature_enabled(cfg!(feature = "sqlite"), "sqlite")))]
    sqlite: bool,

    /// Directory of the SQLite database. The current directory is used if not provided.
    #[clap(long, env = "WORLDCACHE_SQLITE_PATH")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    sqlite_path: Option<PathBuf>,

    #[clap(long, env = "WORLDCACHE_SQLITE_DB", default_value = "world-cache.db")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    sqlite_db: String,

    /// Maximum size of the connection pool.
    #[clap(long, env = "WORLDCACHE_MAX_CONNECTIONS", default_value_t = 64)]
    #[garde(range(min = 1))]
    max_connections: u32,

    /// Number of records in the world table; keys are drawn from 1 to this value.
    #[clap(long, env = "WORLDCACHE_WORLD_COUNT", default_value_t = DEFAULT_WORLD_COUNT)]
    #[garde(range(min = 1))]
    world_count: i32,

    #[clap(long, env = "WORLDCACHE_WORLD_TABLE", default_value = "world")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    world_table: String,

    /// Table to warm the cache from. Defaults to the world table.
    #[clap(long, env = "WORLDCACHE_WARM_TABLE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    warm_table: Option<String>,

    #[clap(long, env = "WORLDCACHE_FORTUNE_TABLE", default_value = "fortune")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    fortune_table: String,

    /// Serve batch reads from a warm in-memory cache.
    #[clap(long, short, env = "WORLDCACHE_CACHED", default_value_t = false)]
    #[garde(skip)]
    cached: bool,

    /// Recreate and seed the tables before running.
    #[clap(long, env = "WORLDCACHE_SETUP", default_value_t = false)]
    #[garde(skip)]
    setup: bool,

    #[clap(long, short, value_enum, env = "WORLDCACHE_MODE", default_value_t = Mode::All)]
    #[garde(skip)]
    mode: Mode,

    /// Records per request for the queries and updates modes. Clamped to 1..=500; invalid values mean 1.
    #[clap(long, short, env = "WORLDCACHE_QUERIES")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    queries: Option<String>,

    /// Number of requests per mode.
    #[clap(long, short, env = "WORLDCACHE_REQUESTS", default_value_t = 1_000)]
    #[garde(range(min = 1))]
    requests: u32,

    /// Number of requests in flight at once.
    #[clap(long, short = 'C', env = "WORLDCACHE_CONCURRENCY", default_value_t = 16)]
    #[garde(range(min = 1))]
    concurrency: u32,

    /// File to send log into
    #[clap(long, env = "WORLDCACHE_LOG_FILE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    log_file: Option<PathBuf>,

    /// Silence the summary output
    #[clap(long, env = "WORLDCACHE_QUIET", default_value_t = false)]
    #[garde(skip)]
    quiet: bool,
}

impl Cli {
    fn feature_enabled<'a>(enabled: bool, feature: &'static str) -> impl FnOnce(&'a bool, &()) -> garde::Result {
        move |value, _| {
            if !*value || enabled {
                Ok(())
            }
            else {
                Err(garde::Error::new(format!("Build feature '{feature}' must be enabled.")))
            }
        }
    }

    pub fn tables(&self) -> Tables {
        Tables::new(self.world_table(), self.warm_table(), self.fortune_table())
    }
}
