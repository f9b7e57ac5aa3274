//! Client configuration.
//!
//! `ClientConfig` is read from `<config dir>/daytask/config.json` and then
//! overridden by environment variables. Every field is optional in the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{normalize_base_url, normalize_text_option};

pub const API_URL_ENV: &str = "DAYTASK_API_URL";
pub const DATA_DIR_ENV: &str = "DAYTASK_DATA_DIR";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DATABASE_FILE_NAME: &str = "daytask.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Where the database and session live; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load from the default location, then apply environment overrides.
    ///
    /// A missing file yields defaults.
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        let mut config = match config_dir {
            Some(dir) => Self::load_from_path(&dir.join("daytask").join("config.json"))?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(DATA_DIR_ENV).ok(),
        )?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default())
            }
            Err(error) => return Err(error.into()),
        };
        let config: Self = serde_json::from_str(&raw)?;
        config.validated()
    }

    /// Override fields from raw environment values; blank values are ignored
    pub fn apply_overrides(
        &mut self,
        api_base_url: Option<String>,
        data_dir: Option<String>,
    ) -> Result<()> {
        let mut candidate = self.clone();
        if let Some(url) = normalize_text_option(api_base_url) {
            candidate.api_base_url = url;
        }
        if let Some(dir) = normalize_text_option(data_dir) {
            candidate.data_dir = Some(PathBuf::from(dir));
        }
        *self = candidate.validated()?;
        Ok(())
    }

    fn validated(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url).map_err(Error::InvalidInput)?;
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Data directory, falling back to `fallback` (usually the platform one)
    #[must_use]
    pub fn resolve_data_dir(&self, fallback: Option<PathBuf>) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| fallback.map(|dir| dir.join("daytask")))
            .unwrap_or_else(|| PathBuf::from(".daytask"))
    }

    #[must_use]
    pub fn database_path(&self, fallback: Option<PathBuf>) -> PathBuf {
        self.resolve_data_dir(fallback).join(DATABASE_FILE_NAME)
    }
}
