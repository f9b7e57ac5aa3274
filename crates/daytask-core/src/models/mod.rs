//! Data models for DayTask

mod entity;
mod id;
mod note;
mod notification;
mod settings;
mod task;

pub use entity::{Entity, EntityKind, Record};
pub use id::{EntityId, OwnerId};
pub use note::{Note, NoteDraft, NotePatch};
pub use notification::Notification;
pub use settings::{Settings, ThemeMode, SETTINGS_ID};
pub use task::{Priority, Recurrence, Task, TaskDraft, TaskPatch};
