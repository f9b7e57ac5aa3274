use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use daytask_core::models::{Priority, Recurrence, ThemeMode};

#[derive(Parser)]
#[command(name = "daytask")]
#[command(about = "Tasks and notes that keep working offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// API base URL (overrides config file and DAYTASK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Skip the connectivity probe and work offline
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),
    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommands),
    /// Sign in; guest data is merged into the account
    Login {
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and remove local records
    Logout,
    /// Merge (when due) and replay queued changes
    Sync,
    /// Show connectivity, mode and queued changes
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// Local notification inbox
    #[command(subcommand)]
    Notifications(NotificationCommands),
    /// Keep running: reconcile on reconnect and deliver reminders
    Watch {
        /// Seconds between connectivity probes
        #[arg(long, default_value = "30")]
        interval: u64,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: Vec<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD, "YYYY-MM-DD HH:MM" or RFC 3339)
        #[arg(long, value_name = "WHEN")]
        due: Option<String>,
        #[arg(short, long, value_enum)]
        priority: Option<PriorityArg>,
        /// Label (repeatable)
        #[arg(short, long = "label", value_name = "LABEL")]
        labels: Vec<String>,
        #[arg(long, value_enum)]
        recurrence: Option<RecurrenceArg>,
        /// Reminder instant
        #[arg(long, value_name = "WHEN")]
        reminder: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed and snoozed tasks
        #[arg(short, long)]
        all: bool,
        /// Only tasks carrying this label
        #[arg(long)]
        label: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing task
    Edit {
        /// Task ID or unique ID prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, value_name = "WHEN", conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(short, long, value_enum)]
        priority: Option<PriorityArg>,
        /// Replace labels (repeatable)
        #[arg(short, long = "label", value_name = "LABEL", conflicts_with = "clear_labels")]
        labels: Vec<String>,
        #[arg(long)]
        clear_labels: bool,
        #[arg(long, value_name = "WHEN", conflicts_with = "clear_reminder")]
        reminder: Option<String>,
        #[arg(long)]
        clear_reminder: bool,
    },
    /// Mark a task as completed
    Done {
        /// Task ID or unique ID prefix
        id: String,
        /// Mark as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Hide a task until the given instant
    Snooze {
        /// Task ID or unique ID prefix
        id: String,
        #[arg(value_name = "WHEN")]
        until: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content (stdin or $EDITOR when omitted)
        content: Vec<String>,
    },
    /// List notes, most recently updated first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New content ($EDITOR when omitted)
        content: Vec<String>,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification (or all of them) as read
    Read {
        /// Notification ID or unique ID prefix
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Delete a notification
    Delete {
        /// Notification ID or unique ID prefix
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RecurrenceArg {
    Daily,
    Weekly,
    Monthly,
}

impl From<RecurrenceArg> for Recurrence {
    fn from(value: RecurrenceArg) -> Self {
        match value {
            RecurrenceArg::Daily => Self::Daily,
            RecurrenceArg::Weekly => Self::Weekly,
            RecurrenceArg::Monthly => Self::Monthly,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for ThemeMode {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
            ThemeArg::System => Self::System,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SettingKey {
    Theme,
    OfflineMode,
    BrowserNotifications,
    TelegramNotifications,
    TelegramToken,
    TelegramChatId,
    AutoSuggestDueDates,
    ShowConfetti,
}
