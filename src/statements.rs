//! The fixed set of parameterized statements used by the repository.
//!
//! SQL text is rendered once per backend and table configuration; executions only bind values. The underlying sqlx
//! pool caches the prepared form of each statement per connection.
use sea_orm::DbBackend;
use sea_orm::Statement;

use crate::error::Error;
use crate::error::Result;
use crate::types::World;

/// Table names the statements operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// Point reads and batched updates go here.
    pub world:   String,
    /// The cache is populated from this table. Usually the same as `world`.
    pub warm:    String,
    pub fortune: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            world:   "world".to_string(),
            warm:    "world".to_string(),
            fortune: "fortune".to_string(),
        }
    }
}

impl Tables {
    pub fn new<S: Into<String>>(world: S, warm: Option<S>, fortune: S) -> Self {
        let world = world.into();
        Self {
            warm: warm.map_or_else(|| world.clone(), Into::into),
            world,
            fortune: fortune.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for name in [&self.world, &self.warm, &self.fortune] {
            check_identifier(name)?;
        }
        Ok(())
    }
}

pub(crate) fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    }
    else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Statements {
    backend:           DbBackend,
    tables:            Tables,
    select_world:      String,
    select_all_worlds: String,
    update_world:      String,
    select_fortunes:   String,
}

impl Statements {
    pub fn prepare(backend: DbBackend, tables: Tables) -> Result<Self> {
        tables.validate()?;

        let (p1, p2) = match backend {
            DbBackend::Postgres => ("$1", "$2"),
            _ => ("?", "?"),
        };

        Ok(Self {
            select_world: format!(
                "SELECT id, randomNumber AS random_number FROM {} WHERE id = {p1}",
                tables.world
            ),
            select_all_worlds: format!("SELECT id, randomNumber AS random_number FROM {}", tables.warm),
            update_world: format!("UPDATE {} SET randomNumber = {p1} WHERE id = {p2}", tables.world),
            select_fortunes: format!("SELECT id, message FROM {}", tables.fortune),
            backend,
            tables,
        })
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn select_world(&self, id: i32) -> Statement {
        Statement::from_sql_and_values(self.backend, &self.select_world, [id.into()])
    }

    pub fn select_all_worlds(&self) -> Statement {
        Statement::from_string(self.backend, &self.select_all_worlds)
    }

    // Parameter order follows the SQL text: the new value first, then the key.
    pub fn update_world(&self, world: &World) -> Statement {
        Statement::from_sql_and_values(
            self.backend,
            &self.update_world,
            [world.random_number.into(), world.id.into()],
        )
    }

    pub fn select_fortunes(&self) -> Statement {
        Statement::from_string(self.backend, &self.select_fortunes)
    }
}
