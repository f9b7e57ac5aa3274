pub mod auth_cmd;
pub mod common;
pub mod note;
pub mod notifications;
pub mod settings;
pub mod status;
pub mod sync;
pub mod task;
pub mod watch;
