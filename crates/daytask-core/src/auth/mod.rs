//! Login client, persisted session and the identity it provides.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::models::OwnerId;
use crate::remote::{parse_api_error, ApiResponse};
use crate::util::normalize_base_url;

const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: OwnerId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Session kept as JSON in the data directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional file name inside `data_dir`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(SESSION_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| AuthError::Storage(error.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, raw).map_err(|error| AuthError::Storage(error.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|error| AuthError::Storage(error.to_string()))?;
        }
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }
}

/// Session kept in memory only
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: std::sync::Mutex<Option<AuthSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> AuthResult<std::sync::MutexGuard<'_, Option<AuthSession>>> {
        self.session
            .lock()
            .map_err(|error| AuthError::Storage(error.to_string()))
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        Ok(self.slot()?.clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        *self.slot()? = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Client for the login endpoints
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    client: Client,
}

impl AuthClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> AuthResult<Self> {
        let base_url =
            normalize_base_url(base_url.as_ref()).map_err(AuthError::InvalidConfiguration)?;
        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&payload);

        let response: LoginResponse = self.send(request).await?.ok_or_else(|| {
            AuthError::Api("Login response did not include a session".to_string())
        })?;
        response.try_into()
    }

    /// Create an account; the caller logs in afterwards
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> AuthResult<String> {
        validate_credentials(email, password)?;
        if username.trim().is_empty() {
            return Err(AuthError::Api("Username is required".to_string()));
        }
        if password != confirm_password {
            return Err(AuthError::Api("Passwords do not match".to_string()));
        }

        let payload = serde_json::json!({
            "username": username.trim(),
            "email": email.trim(),
            "password": password,
            "confirmPassword": confirm_password,
        });
        let request = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&payload);

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        let envelope = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)?;
        Ok(envelope.message.unwrap_or_default())
    }

    async fn send<D: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> AuthResult<Option<D>> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        let envelope = response.json::<ApiResponse<D>>().await?;
        envelope
            .into_result(status)
            .map_err(|error| AuthError::Api(error.to_string()))
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user: Option<AuthUser>,
    token: Option<LoginToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginToken {
    access_token: String,
    refresh_token: String,
}

impl TryFrom<LoginResponse> for AuthSession {
    type Error = AuthError;

    fn try_from(value: LoginResponse) -> AuthResult<Self> {
        match (value.user, value.token) {
            (Some(user), Some(token)) if !token.access_token.trim().is_empty() => Ok(Self {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                user,
            }),
            _ => Err(AuthError::Api(
                "Login response did not include enough session fields".to_string(),
            )),
        }
    }
}

/// Current authenticated identity, restored from persistence at start-up.
pub struct IdentityProvider<S> {
    store: S,
    session: watch::Sender<Option<AuthSession>>,
}

impl<S: SessionPersistence> IdentityProvider<S> {
    pub fn new(store: S) -> Self {
        let (session, _) = watch::channel(None);
        Self { store, session }
    }

    /// Load the persisted session. An unreadable one is discarded.
    pub fn restore(&self) -> AuthResult<Option<AuthSession>> {
        let session = match self.store.load_session() {
            Ok(session) => session,
            Err(AuthError::Json(error)) => {
                tracing::warn!("Failed to read persisted session: {}", error);
                self.store.clear_session()?;
                None
            }
            Err(error) => return Err(error),
        };
        self.session.send_replace(session.clone());
        Ok(session)
    }

    pub fn sign_in(&self, session: AuthSession) -> AuthResult<()> {
        self.store.save_session(&session)?;
        tracing::info!("Signed in as {}", session.user.id);
        self.session.send_replace(Some(session));
        Ok(())
    }

    pub fn sign_out(&self) -> AuthResult<()> {
        self.store.clear_session()?;
        self.session.send_replace(None);
        Ok(())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    #[must_use]
    pub fn owner_id(&self) -> Option<OwnerId> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.user.id.clone())
    }

    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }
}
