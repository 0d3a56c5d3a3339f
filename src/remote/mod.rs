//! Boundary with the hosted database/auth service.
//!
//! Everything above this module talks to the store through [`RemoteStore`] and
//! [`AuthProvider`]. Two backends implement them: [`RestStore`] for the hosted
//! service and [`MemoryStore`] for tests and offline demos.

pub mod auth;
pub mod config;
pub mod memory;
pub mod query;
pub mod rest;

use crate::core::{EntityId, Result, Row, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use auth::AccountRegistry;
pub use config::StoreConfig;
pub use memory::{FaultTarget, IdKind, MemoryStore, WriteOp, WriteRecord};
pub use query::{Embed, EmbedKind, Filter, OrderBy, SelectQuery};
pub use rest::RestStore;

/// CRUD surface of the remote store.
///
/// Every call resolves to a `Result`; no backend panics across this boundary.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All rows matching `query`, joined and ordered as requested.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>>;

    /// Exactly one row. Zero matches is `NotFound`, more than one is rejected.
    async fn select_single(&self, query: &SelectQuery) -> Result<Row> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(StoreError::not_found(
                &query.collection,
                query.describe_filters(),
            )),
            n => Err(StoreError::rejected(
                406,
                format!("expected a single row from '{}', got {}", query.collection, n),
            )),
        }
    }

    /// Inserts one row and returns it as stored, with the generated `id`.
    async fn insert(&self, collection: &str, row: Row) -> Result<Row>;

    /// Partial update by id. `Ok(None)` when no row has that id.
    async fn update(&self, collection: &str, id: &EntityId, patch: Row) -> Result<Option<Row>>;

    /// Delete by id. Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &EntityId) -> Result<()>;
}

/// Authenticated session handed out by [`AuthProvider::sign_in`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Password sign-in. Wrong credentials yield `StoreError::InvalidCredentials`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self, session: &Session) -> Result<()>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        (**self).select(query).await
    }

    async fn select_single(&self, query: &SelectQuery) -> Result<Row> {
        (**self).select_single(query).await
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row> {
        (**self).insert(collection, row).await
    }

    async fn update(&self, collection: &str, id: &EntityId, patch: Row) -> Result<Option<Row>> {
        (**self).update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> Result<()> {
        (**self).delete(collection, id).await
    }
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for std::sync::Arc<T> {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        (**self).sign_in(email, password).await
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        (**self).sign_out(session).await
    }
}
