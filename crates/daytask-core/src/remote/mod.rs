//! Remote service contract and clients

mod http;
#[cfg(test)]
pub(crate) mod memory;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Entity, EntityId, OwnerId};

pub use http::HttpRemoteService;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Server-side CRUD for one entity kind.
///
/// `create` must be idempotent by client-assigned id so a replayed add
/// that already reached the server does not fail. `bulk_upsert` is the
/// idempotent bulk write used by merge.
#[allow(async_fn_in_trait)]
pub trait RemoteService<T: Entity>: Send + Sync {
    async fn create(&self, entity: &T) -> RemoteResult<()>;

    async fn update(&self, entity: &T) -> RemoteResult<()>;

    async fn delete(&self, id: &EntityId) -> RemoteResult<()>;

    /// Every record the server holds for `owner`
    async fn list_by_owner(&self, owner: &OwnerId) -> RemoteResult<Vec<T>>;

    async fn bulk_upsert(&self, entities: &[T]) -> RemoteResult<()>;
}

/// Credentials attached to remote calls
pub trait RemoteSession: Send + Sync {
    fn set_access_token(&self, token: Option<String>);
}

/// Envelope wrapping every API response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResponse<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    /// The payload, or an error when the envelope reports failure
    pub(crate) fn into_result(self, status: StatusCode) -> RemoteResult<Option<T>> {
        if self.success == Some(false) {
            return Err(RemoteError::Api {
                status: self.status_code.unwrap_or_else(|| status.as_u16()),
                message: envelope_message(self.message, self.errors)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
    errors: Option<Vec<String>>,
}

fn envelope_message(message: Option<String>, errors: Option<Vec<String>>) -> Option<String> {
    let message = message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());
    let errors = errors
        .filter(|errors| !errors.is_empty())
        .map(|errors| errors.join("; "));
    match (message, errors) {
        (Some(message), Some(errors)) => Some(format!("{message}: {errors}")),
        (message, errors) => message.or(errors),
    }
}

pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = envelope_message(payload.message.or(payload.error), payload.errors) {
            return format!("{} ({})", message, status.as_u16());
        }
    }

    let trimmed = crate::util::compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
