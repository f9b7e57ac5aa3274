//! reqwest-backed remote service

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use super::{parse_api_error, ApiResponse, RemoteError, RemoteResult, RemoteService, RemoteSession};
use crate::models::{Entity, EntityId, OwnerId};
use crate::util::normalize_base_url;

const PROBE_TIMEOUT_SECS: u64 = 3;

/// Client for the task/note REST API.
#[derive(Clone)]
pub struct HttpRemoteService {
    base_url: String,
    client: Client,
    access_token: Arc<watch::Sender<Option<String>>>,
}

impl HttpRemoteService {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> RemoteResult<Self> {
        let base_url =
            normalize_base_url(base_url.as_ref()).map_err(RemoteError::InvalidPayload)?;
        let (access_token, _) = watch::channel(None);
        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
            access_token: Arc::new(access_token),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the API answers at all. Any HTTP response counts as reachable.
    pub async fn probe(&self) -> bool {
        let result = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await;
        match result {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!("API at {} is unreachable: {}", self.base_url, error);
                false
            }
        }
    }

    fn url<T: Entity>(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, T::KIND.remote_path(), suffix)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match self.access_token.borrow().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }
        Ok(response)
    }

    /// Send and unwrap the envelope. `204 No Content` yields `None`.
    async fn send_for<D: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<Option<D>> {
        let response = self.send(request).await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope = serde_json::from_str::<ApiResponse<D>>(&body)
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        envelope.into_result(status)
    }
}

impl RemoteSession for HttpRemoteService {
    fn set_access_token(&self, token: Option<String>) {
        self.access_token.send_replace(token);
    }
}

impl<T: Entity> RemoteService<T> for HttpRemoteService {
    async fn create(&self, entity: &T) -> RemoteResult<()> {
        let request = self.client.post(self.url::<T>("")).json(entity);
        self.send_for::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn update(&self, entity: &T) -> RemoteResult<()> {
        let id = urlencoding::encode(entity.id().as_str()).into_owned();
        let request = self
            .client
            .put(self.url::<T>(&format!("/{id}")))
            .json(entity);
        self.send_for::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> RemoteResult<()> {
        let id = urlencoding::encode(id.as_str()).into_owned();
        let request = self.client.delete(self.url::<T>(&format!("/{id}")));
        self.send_for::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> RemoteResult<Vec<T>> {
        let owner = urlencoding::encode(owner.as_str()).into_owned();
        let request = self.client.get(self.url::<T>(&format!("/user/{owner}")));
        Ok(self.send_for::<Vec<T>>(request).await?.unwrap_or_default())
    }

    async fn bulk_upsert(&self, entities: &[T]) -> RemoteResult<()> {
        let request = self.client.post(self.url::<T>("/merge")).json(entities);
        self.send_for::<serde_json::Value>(request).await?;
        Ok(())
    }
}
