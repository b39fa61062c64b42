//! Repositories for database operations
//!
//! Each aggregate gets a trait so the services can run against PostgreSQL
//! in production and against an in-memory store in tests.

pub mod account;
pub mod cart;
pub mod order;
pub mod product;

#[cfg(test)]
pub(crate) mod memory;

pub use account::{AccountRepository, PgAccountRepository};
pub use cart::{CartRepository, PgCartRepository};
pub use order::{OrderRepository, PgOrderRepository};
pub use product::{PgProductRepository, ProductRepository};

use thiserror::Error;

/// A write rejected by a unique constraint, usually because a concurrent
/// request got there first
#[derive(Error, Debug)]
#[error("unique constraint {constraint} violated")]
pub struct UniqueViolation {
    pub constraint: String,
}

/// Lift unique violations out of a database error so services can tell
/// them apart from storage failures
pub(crate) fn unique_violation(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => UniqueViolation {
            constraint: db.constraint().unwrap_or_default().to_string(),
        }
        .into(),
        _ => err.into(),
    }
}
