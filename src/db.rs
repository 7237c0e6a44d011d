//! Database backend support: connection drivers and schema bootstrap.
pub mod driver;
pub mod schema;
