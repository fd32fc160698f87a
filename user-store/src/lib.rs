//! # user-store
//!
//! Persistence for [`bot_core::UserRecord`]: the [`UserStore`] trait, a SQLite
//! implementation, and an in-memory implementation for tests and ephemeral
//! runs. Every save is a full-record overwrite (last-writer-wins); callers
//! that need per-user serialization do it above this crate.

pub mod error;
pub mod memory;
pub mod sqlite;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryUserStore;
pub use sqlite::SqliteUserStore;
pub use store::UserStore;
