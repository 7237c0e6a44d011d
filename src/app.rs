//! Workload driver behind the `world-bench` binary.
use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use anyhow::anyhow;
use anyhow::Context;
use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use comfy_table::CellAlignment;
use garde::Validate;
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::cache::CachedRepository;
use crate::config::Cli;
use crate::config::Mode;
#[cfg(feature = "pg")]
use crate::db::driver::pg::Pg;
#[cfg(feature = "sqlite")]
use crate::db::driver::sqlite::Sqlite;
use crate::db::driver::DatabaseDriver;
use crate::db::schema;
use crate::repository::Repository;
use crate::traits::WorldRepository;
use crate::workload::clamp_queries;
use crate::workload::fortunes_page;

/// Outcome of running one [`Mode`].
#[derive(Debug, Clone, Copy)]
pub struct ModeReport {
    pub mode:     Mode,
    pub requests: u32,
    /// Records returned over all requests.
    pub records:  usize,
    pub elapsed:  Duration,
}

impl ModeReport {
    pub fn per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.requests as f64 / secs
        }
        else {
            0.0
        }
    }
}

/// Run `requests` requests of a single (non-`All`) mode against `repo`, with at most `concurrency` in flight.
#[instrument(level = "trace", skip(repo))]
pub async fn drive(
    repo: Arc<dyn WorldRepository>,
    mode: Mode,
    requests: u32,
    concurrency: u32,
    queries: usize,
) -> anyhow::Result<ModeReport> {
    if mode == Mode::All {
        return Err(anyhow!("mode 'all' must be expanded before driving"));
    }

    let workers = concurrency.clamp(1, requests.max(1));
    let barrier = Arc::new(Barrier::new(workers as usize + 1));
    let mut tasks = JoinSet::<anyhow::Result<usize>>::new();

    for worker in 0..workers {
        // Spread the remainder over the first workers.
        let share = requests / workers + u32::from(worker < requests % workers);
        let repo = repo.clone();
        let barrier = barrier.clone();
        tasks.spawn(async move {
            barrier.wait().await;
            let mut records = 0;
            for _ in 0..share {
                records += match mode {
                    Mode::Db => {
                        repo.fetch_random().await?;
                        1
                    }
                    Mode::Queries => repo.fetch_many(queries).await?.len(),
                    Mode::Updates => repo.update_many(queries).await?.len(),
                    Mode::Fortunes => fortunes_page(&*repo).await?.len(),
                    Mode::All => unreachable!("expanded above"),
                };
            }
            Ok(records)
        });
    }

    barrier.wait().await;
    let started = Instant::now();

    let mut records = 0;
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(count)) => records += count,
            Ok(Err(err)) => {
                tasks.abort_all();
                return Err(err.context(format!("{} worker failed", mode.label())));
            }
            Err(err) => {
                tasks.abort_all();
                return Err(anyhow::Error::from(err).context(format!("{} worker errored out", mode.label())));
            }
        }
    }

    let report = ModeReport {
        mode,
        requests,
        records,
        elapsed: started.elapsed(),
    };
    debug!("{report:?}");
    Ok(report)
}

pub struct BenchApp {
    cli: Cli,
}

impl BenchApp {
    pub fn from_args<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self {
            cli: Cli::try_parse_from(args)?,
        })
    }

    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Err(err) = self.cli.validate() {
            let mut cmd = Cli::command();
            return Err(cmd.error(ErrorKind::InvalidValue, err).into());
        }
        if self.cli.pg() == self.cli.sqlite() {
            return Err(anyhow!("Select exactly one backend with --pg or --sqlite."));
        }
        self.cli.tables().validate()?;
        Ok(())
    }

    fn setup_tracing(&self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt::format::FmtSpan;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let dest_writer = Mutex::new(if let Some(log_file) = self.cli.log_file() {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
            Box::new(file) as Box<dyn io::Write + Send>
        }
        else {
            Box::new(io::stderr()) as Box<dyn io::Write + Send>
        });

        let registry = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(dest_writer)
                    .with_span_events(FmtSpan::CLOSE),
            );

        // Another subscriber may already be installed when embedded or under test.
        if let Err(err) = registry.try_init() {
            warn!("Tracing not initialized: {err}");
        }
        else {
            info!("Tracing initialized");
        }

        Ok(())
    }

    pub async fn execute(&self) -> anyhow::Result<Vec<ModeReport>> {
        self.validate()?;
        self.setup_tracing()?;

        #[cfg(feature = "sqlite")]
        if self.cli.sqlite() {
            let dir = self.cli.sqlite_path().unwrap_or_else(|| ".".into());
            let driver = Sqlite::connect(&dir, &self.cli.sqlite_db(), self.cli.max_connections()).await?;
            return self.execute_with(Arc::new(driver)).await;
        }

        #[cfg(feature = "pg")]
        if self.cli.pg() {
            let driver = Pg::builder()
                .host(self.cli.pg_host())
                .port(self.cli.pg_port())
                .user(self.cli.pg_user())
                .password(self.cli.pg_password())
                .database(self.cli.pg_database())
                .max_connections(self.cli.max_connections())
                .build()?;
            driver.connect().await?;
            return self.execute_with(driver).await;
        }

        Err(anyhow!(
            "The selected backend is not enabled in this build. Use `cargo run --features pg|sqlite ...`."
        ))
    }

    #[instrument(level = "trace", skip(self, driver), fields(driver = driver.name()))]
    async fn execute_with<D: DatabaseDriver>(&self, driver: Arc<D>) -> anyhow::Result<Vec<ModeReport>> {
        let cli = &self.cli;
        let tables = cli.tables();

        driver.configure().await?;

        let plain = Repository::new(driver.clone(), tables.clone(), cli.world_count())?;

        if cli.setup() {
            schema::bootstrap(
                &driver.connection(),
                &tables,
                cli.world_count(),
                &*plain.random_source(),
            )
            .await
            .context("Failed to bootstrap the schema")?;
        }

        let repo: Arc<dyn WorldRepository> = if cli.cached() {
            Arc::new(CachedRepository::new(Arc::new(plain)).await?)
        }
        else {
            Arc::new(plain)
        };

        let queries = clamp_queries(cli.queries().as_deref());
        let mut reports = Vec::new();
        for mode in cli.mode().expand() {
            let report = drive(repo.clone(), mode, cli.requests(), cli.concurrency(), queries).await?;
            info!(
                "{} done: {} requests in {:.2}s",
                mode.label(),
                report.requests,
                report.elapsed.as_secs_f64()
            );
            reports.push(report);
        }

        if !cli.quiet() {
            println!("{}", self.summary(driver.name(), queries, &reports));
        }

        Ok(reports)
    }

    fn summary(&self, driver_name: &str, queries: usize, reports: &[ModeReport]) -> String {
        let mut table = comfy_table::Table::new();
        table
            .load_preset(comfy_table::presets::ASCII_FULL_CONDENSED)
            .set_header(["Mode", "Requests", "Records", "Duration (s)", "Requests/s"]);

        for report in reports {
            table.add_row([
                report.mode.label().to_string(),
                report.requests.to_string(),
                report.records.to_string(),
                format!("{:.2}", report.elapsed.as_secs_f64()),
                format!("{:.2}", report.per_sec()),
            ]);
        }

        for col in 1..=4 {
            if let Some(column) = table.column_mut(col) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }

        format!(
            "*** {} ***\nWith driver: {}, {}, {} records per request, concurrency {}\n{}",
            chrono::Local::now().naive_local(),
            driver_name,
            if self.cli.cached() { "cached" } else { "plain" },
            queries,
            self.cli.concurrency(),
            table
        )
    }

    /// Parse the process arguments and run. Help and version requests print and return successfully.
    pub async fn run() -> anyhow::Result<()> {
        let app = match Cli::try_parse() {
            Ok(cli) => Self { cli },
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    err.print()?;
                    return Ok(());
                }
                _ => return Err(err.into()),
            },
        };
        app.execute().await?;
        Ok(())
    }
}

impl Debug for BenchApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BenchApp {{ mode: {:?}, cached: {} }}", self.cli.mode(), self.cli.cached())
    }
}
