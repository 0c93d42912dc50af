//! REST persistence against a realtime-database style backend.
//!
//! Layout:
//!
//! | Operation | Request |
//! |---|---|
//! | list | `GET {base}/todos/{user}.json?auth={credential}` |
//! | create | `POST {base}/todos/{user}.json?auth={credential}`, answers `{"name": "<id>"}` |
//! | update | `PATCH {base}/todos/{user}/{id}.json?auth={credential}` |
//! | delete | `DELETE {base}/todos/{user}/{id}.json?auth={credential}` |
//!
//! A `null` list body means the user has no items. Generated ids sort in
//! creation order, so the listing is ordered by id.

use super::{PersistenceError, TodoPatch, TodoPersistence};
use crate::types::{Credential, EndpointId, TodoEntry, TodoItem, UserId};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use todo_store_runtime::retry::{RetryPolicy, retry_with_predicate};

/// Body returned by a create request
#[derive(Debug, Deserialize)]
struct CreatedName {
    name: EndpointId,
}

/// HTTP client for the to-do backend
#[derive(Clone, Debug)]
pub struct HttpPersistence {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpPersistence {
    /// Create a client for `base_url` with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Request`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, PersistenceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PersistenceError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Base URL requests are made against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, user_id: &UserId) -> String {
        format!("{}/todos/{}.json", self.base_url, user_id)
    }

    fn item_url(&self, user_id: &UserId, endpoint: &EndpointId) -> String {
        format!("{}/todos/{}/{}.json", self.base_url, user_id, endpoint)
    }
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err adapter
fn request_error(error: reqwest::Error) -> PersistenceError {
    if error.is_connect() {
        PersistenceError::Connect(error.to_string())
    } else {
        PersistenceError::Request(error.to_string())
    }
}

/// Map non-success responses onto [`PersistenceError`]
async fn check_status(response: Response) -> Result<Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PersistenceError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(PersistenceError::Status {
                status: status.as_u16(),
                message: body,
            })
        },
    }
}

impl TodoPersistence for HttpPersistence {
    async fn list_items(
        &self,
        credential: &Credential,
        user_id: &UserId,
    ) -> Result<Vec<TodoEntry>, PersistenceError> {
        let client = &self.client;
        let url = self.collection_url(user_id);
        let url = url.as_str();

        let items = retry_with_predicate(
            &self.retry,
            move || async move {
                let response = client
                    .get(url)
                    .query(&[("auth", credential.expose())])
                    .send()
                    .await
                    .map_err(request_error)?;

                check_status(response)
                    .await?
                    .json::<Option<BTreeMap<EndpointId, TodoItem>>>()
                    .await
                    .map_err(|e| PersistenceError::Decode(e.to_string()))
            },
            PersistenceError::is_transient,
        )
        .await?;

        let entries: Vec<TodoEntry> = items
            .unwrap_or_default()
            .into_iter()
            .map(|(endpoint, item)| TodoEntry::new(endpoint, item))
            .collect();

        tracing::debug!(user_id = %user_id, count = entries.len(), "Listed todos");
        Ok(entries)
    }

    async fn create_item(
        &self,
        user_id: &UserId,
        item: &TodoItem,
        credential: &Credential,
    ) -> Result<EndpointId, PersistenceError> {
        let client = &self.client;
        let url = self.collection_url(user_id);
        let url = url.as_str();

        let created = retry_with_predicate(
            &self.retry,
            move || async move {
                let response = client
                    .post(url)
                    .query(&[("auth", credential.expose())])
                    .json(item)
                    .send()
                    .await
                    .map_err(request_error)?;

                check_status(response)
                    .await?
                    .json::<CreatedName>()
                    .await
                    .map_err(|e| PersistenceError::Decode(e.to_string()))
            },
            // POST is not idempotent: resending after the backend stored the
            // item would create a second one under a new id
            PersistenceError::is_unsent,
        )
        .await?;

        tracing::debug!(user_id = %user_id, endpoint = %created.name, "Created todo");
        Ok(created.name)
    }

    async fn update_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        patch: TodoPatch,
        credential: &Credential,
    ) -> Result<(), PersistenceError> {
        let client = &self.client;
        let url = self.item_url(user_id, endpoint);
        let url = url.as_str();
        let patch = &patch;

        retry_with_predicate(
            &self.retry,
            move || async move {
                let response = client
                    .patch(url)
                    .query(&[("auth", credential.expose())])
                    .json(patch)
                    .send()
                    .await
                    .map_err(request_error)?;

                check_status(response).await.map(|_| ())
            },
            PersistenceError::is_transient,
        )
        .await?;

        tracing::debug!(user_id = %user_id, endpoint = %endpoint, "Updated todo");
        Ok(())
    }

    async fn delete_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        credential: &Credential,
    ) -> Result<(), PersistenceError> {
        let client = &self.client;
        let url = self.item_url(user_id, endpoint);
        let url = url.as_str();

        retry_with_predicate(
            &self.retry,
            move || async move {
                let response = client
                    .delete(url)
                    .query(&[("auth", credential.expose())])
                    .send()
                    .await
                    .map_err(request_error)?;

                check_status(response).await.map(|_| ())
            },
            PersistenceError::is_transient,
        )
        .await?;

        tracing::debug!(user_id = %user_id, endpoint = %endpoint, "Deleted todo");
        Ok(())
    }
}
