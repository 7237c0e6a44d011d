use std::time::Duration;

use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectOptions;
use sea_orm::DatabaseConnection;
use tracing::debug;
use tracing::error;

use crate::error::Result;

use super::DatabaseDriver;

/// PostgreSQL driver. Build it, then [`connect`](Pg::connect) before use.
#[derive(Debug)]
#[fxstruct(sync, rc, no_new, builder)]
pub struct Pg {
    host:            String,
    #[fieldx(default(5432))]
    port:            u16,
    user:            String,
    password:        String,
    database:        String,
    #[fieldx(default(64))]
    max_connections: u32,
    #[fieldx(inner_mut, get(off), set, builder(off))]
    connection:      DatabaseConnection,
}

impl Pg {
    pub async fn connect(&self) -> Result<()> {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        );
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        self.set_connection(sea_orm::Database::connect(opts).await.inspect_err(|e| {
            error!(
                "Error connecting to database {} at {}:{}: {e}",
                self.database, self.host, self.port
            )
        })?);

        debug!(
            "Connected to {}:{}/{} with up to {} connections",
            self.host, self.port, self.database, self.max_connections
        );

        Ok(())
    }
}

#[async_trait]
impl DatabaseDriver for Pg {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn connection(&self) -> DatabaseConnection {
        self.connection.read().clone()
    }

    // Pool-wide settings are fixed by the server; nothing to adjust per session.
    async fn configure(&self) -> Result<()> {
        Ok(())
    }
}
