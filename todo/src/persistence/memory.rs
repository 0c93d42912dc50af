//! In-process persistence for tests and offline runs.

use super::{PersistenceError, TodoPatch, TodoPersistence};
use crate::types::{Credential, EndpointId, Operation, TodoEntry, TodoItem, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    lists: HashMap<UserId, Vec<TodoEntry>>,
    grants: HashMap<UserId, Credential>,
    failures: HashMap<Operation, PersistenceError>,
    next_id: u64,
}

impl Inner {
    fn authorize(&self, user_id: &UserId, credential: &Credential) -> Result<(), PersistenceError> {
        match self.grants.get(user_id) {
            Some(granted) if granted == credential => Ok(()),
            _ => Err(PersistenceError::Unauthorized),
        }
    }

    fn injected_failure(&mut self, operation: Operation) -> Result<(), PersistenceError> {
        self.failures.remove(&operation).map_or(Ok(()), Err)
    }

    fn allocate_id(&mut self) -> EndpointId {
        self.next_id += 1;
        EndpointId::new(format!("-todo{:016}", self.next_id))
    }
}

/// Ordered in-memory store keyed by user.
///
/// Every request must carry the credential granted to its user. Failures can
/// be injected per operation; each injected failure is returned once.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistence {
    inner: Arc<Mutex<Inner>>,
    latency: Duration,
}

impl InMemoryPersistence {
    /// Create an empty store with no granted users
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, PersistenceError> {
        self.inner
            .lock()
            .map_err(|_| PersistenceError::Unavailable("Mutex lock failed".to_string()))
    }

    /// Allow `credential` to access the list of `user_id`
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn grant(&self, user_id: &UserId, credential: &Credential) -> Result<(), PersistenceError> {
        self.lock()?
            .grants
            .insert(user_id.clone(), credential.clone());
        Ok(())
    }

    /// Store `items` for `user_id`, returning the ids assigned to them
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn seed(
        &self,
        user_id: &UserId,
        items: impl IntoIterator<Item = TodoItem>,
    ) -> Result<Vec<EndpointId>, PersistenceError> {
        let mut inner = self.lock()?;
        let mut ids = Vec::new();
        for item in items {
            let endpoint = inner.allocate_id();
            inner
                .lists
                .entry(user_id.clone())
                .or_default()
                .push(TodoEntry::new(endpoint.clone(), item));
            ids.push(endpoint);
        }
        Ok(ids)
    }

    /// Make the next request of `operation` fail with `error`
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn fail_next(
        &self,
        operation: Operation,
        error: PersistenceError,
    ) -> Result<(), PersistenceError> {
        self.lock()?.failures.insert(operation, error);
        Ok(())
    }

    /// Snapshot of the stored entries for `user_id`
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn entries(&self, user_id: &UserId) -> Result<Vec<TodoEntry>, PersistenceError> {
        Ok(self
            .lock()?
            .lists
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl TodoPersistence for InMemoryPersistence {
    fn list_items(
        &self,
        credential: &Credential,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<TodoEntry>, PersistenceError>> + Send {
        let store = self.clone();
        let credential = credential.clone();
        let user_id = user_id.clone();

        async move {
            store.delay().await;
            let mut inner = store.lock()?;
            inner.injected_failure(Operation::Fetch)?;
            inner.authorize(&user_id, &credential)?;

            Ok(inner.lists.get(&user_id).cloned().unwrap_or_default())
        }
    }

    fn create_item(
        &self,
        user_id: &UserId,
        item: &TodoItem,
        credential: &Credential,
    ) -> impl Future<Output = Result<EndpointId, PersistenceError>> + Send {
        let store = self.clone();
        let credential = credential.clone();
        let user_id = user_id.clone();
        let item = item.clone();

        async move {
            store.delay().await;
            let mut inner = store.lock()?;
            inner.injected_failure(Operation::Submit)?;
            inner.authorize(&user_id, &credential)?;

            let endpoint = inner.allocate_id();
            inner
                .lists
                .entry(user_id)
                .or_default()
                .push(TodoEntry::new(endpoint.clone(), item));
            Ok(endpoint)
        }
    }

    fn update_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        patch: TodoPatch,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        let store = self.clone();
        let credential = credential.clone();
        let user_id = user_id.clone();
        let endpoint = endpoint.clone();

        async move {
            store.delay().await;
            let mut inner = store.lock()?;
            inner.injected_failure(Operation::MarkAsCompleted)?;
            inner.authorize(&user_id, &credential)?;

            let entry = inner
                .lists
                .get_mut(&user_id)
                .and_then(|list| list.iter_mut().find(|entry| entry.endpoint == endpoint))
                .ok_or_else(|| PersistenceError::NotFound(endpoint.clone()))?;

            if let Some(completed) = patch.completed {
                entry.item.completed = completed;
            }
            Ok(())
        }
    }

    fn delete_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        let store = self.clone();
        let credential = credential.clone();
        let user_id = user_id.clone();
        let endpoint = endpoint.clone();

        async move {
            store.delay().await;
            let mut inner = store.lock()?;
            inner.injected_failure(Operation::Delete)?;
            inner.authorize(&user_id, &credential)?;

            let list = inner
                .lists
                .get_mut(&user_id)
                .ok_or_else(|| PersistenceError::NotFound(endpoint.clone()))?;
            let position = list
                .iter()
                .position(|entry| entry.endpoint == endpoint)
                .ok_or_else(|| PersistenceError::NotFound(endpoint.clone()))?;
            list.remove(position);
            Ok(())
        }
    }
}
