//! # Sealbox Store
//!
//! Persistence for Sealbox: artifact records with their append-only
//! download logs, and the role/module reference tables consulted on
//! every authorization check.
//!
//! The [`Store`] trait is async and backend-agnostic. Two backends:
//!
//! - [`MemoryStore`] - for tests, same semantics, no persistence.
//! - [`SqliteStore`] - primary backend, rusqlite with bundled SQLite
//!   and versioned migrations.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
