//! Settings repository implementation

use rusqlite::params;

use super::SharedDatabase;
use crate::error::Result;
use crate::models::{Settings, SETTINGS_ID};

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings, falling back to defaults when nothing is stored
    async fn load(&self) -> Result<Settings>;

    /// Save settings
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
///
/// The whole record lives in one row keyed by [`SETTINGS_ID`].
#[derive(Clone)]
pub struct SqliteSettingsRepository {
    db: SharedDatabase,
}

impl SqliteSettingsRepository {
    /// Create a new repository over the shared connection
    pub const fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn load(&self) -> Result<Settings> {
        let db = self.db.lock().await;
        let result = db.connection().query_row(
            "SELECT data FROM settings WHERE id = ?1",
            params![SETTINGS_ID],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let data = serde_json::to_string(settings)?;
        let db = self.db.lock().await;
        db.connection().execute(
            "INSERT INTO settings (id, data) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![SETTINGS_ID, data],
        )?;
        Ok(())
    }
}
