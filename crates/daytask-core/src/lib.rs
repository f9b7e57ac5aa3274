//! daytask-core - Core library for DayTask
//!
//! This crate contains the models, local database, pending-operation logs and
//! the offline/online reconciliation engine used by every DayTask client.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mode;
pub mod models;
pub mod remote;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod util;
pub mod workspace;


pub use error::{Error, MergeStage, Result};
pub use mode::{ActorMode, ModeResolver, ModeTransition};
pub use models::{EntityId, Note, OwnerId, Task};
pub use store::EntityStore;
pub use workspace::Workspace;
