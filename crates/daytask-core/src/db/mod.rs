//! Database layer for daytask
//!
//! Provides the `SQLite` connection, migrations, the per-kind record tables
//! and the pending-operation logs.

mod connection;
mod local_store;
mod migrations;
mod pending_log;
mod settings_repository;

pub use connection::{Database, SharedDatabase};
pub use local_store::LocalStore;
pub use pending_log::{PendingEntry, PendingLog, SyncAction};
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};
