//! SQLite backend for the AT/MP case store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The cross-entity invariants (one
//! audit per dossier, one dispute per dossier, unique references) live in the
//! schema as UNIQUE constraints; the finalize transition runs as a single
//! SQLite transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
