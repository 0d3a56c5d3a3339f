use super::config::StoreConfig;
use super::query::{SelectQuery, render_value};
use super::{AuthProvider, RemoteStore, Session};
use crate::core::{EntityId, Result, Row, StoreError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Client for the hosted store's REST (`/rest/v1`) and auth (`/auth/v1`) endpoints.
pub struct RestStore {
    http: Client,
    config: StoreConfig,
    session: RwLock<Option<Session>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Session currently used for data calls, if signed in.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, collection)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    /// Signed-in requests carry the user's token, anonymous ones the API key.
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.api_key.clone(),
        };
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
            .header("Accept-Profile", &self.config.schema)
            .header("Content-Profile", &self.config.schema)
    }

    fn id_filter(id: &EntityId) -> (String, String) {
        ("id".to_string(), format!("eq.{}", id))
    }

    async fn read_rows(response: Response) -> Result<Vec<Row>> {
        let response = Self::check(response).await?;
        let rows: Vec<Row> = response.json().await?;
        Ok(rows)
    }

    /// Turns non-2xx responses into `Rejected`, pulling the service's message out of the body.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        warn!(status = status.as_u16(), %message, "remote store rejected request");
        Err(StoreError::rejected(status.as_u16(), message))
    }
}

/// Query parameters for a select in the REST dialect.
pub fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.render_select())];
    for filter in &query.filters {
        params.push((
            filter.column.clone(),
            format!("eq.{}", render_value(&filter.value)),
        ));
    }
    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// The hosted service reports errors under a handful of keys.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Maps a refused password grant. Only the credentials message (or none)
/// means bad credentials; anything else keeps the response status.
fn sign_in_error(status: StatusCode, body: &str) -> StoreError {
    let message = error_message(body).unwrap_or_default();
    if message == "Invalid login credentials" || message.is_empty() {
        return StoreError::InvalidCredentials;
    }
    StoreError::rejected(status.as_u16(), message)
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        debug!(collection = %query.collection, select = %query.render_select(), "rest: select");
        let request = self
            .http
            .get(self.collection_url(&query.collection))
            .query(&select_params(query));
        let response = self.authorize(request).await.send().await?;
        Self::read_rows(response).await
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row> {
        debug!(collection, "rest: insert");
        let request = self
            .http
            .post(self.collection_url(collection))
            .header("Prefer", "return=representation")
            .json(&vec![row]);
        let response = self.authorize(request).await.send().await?;
        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("insert into '{}' returned no row", collection)))
    }

    async fn update(&self, collection: &str, id: &EntityId, patch: Row) -> Result<Option<Row>> {
        debug!(collection, %id, "rest: update");
        let request = self
            .http
            .patch(self.collection_url(collection))
            .query(&[Self::id_filter(id)])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.authorize(request).await.send().await?;
        Ok(Self::read_rows(response).await?.into_iter().next())
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> Result<()> {
        debug!(collection, %id, "rest: delete");
        let request = self
            .http
            .delete(self.collection_url(collection))
            .query(&[Self::id_filter(id)]);
        let response = self.authorize(request).await.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for RestStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        debug!(email, "rest: sign in");
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(sign_in_error(status, &body));
        }

        let token: TokenResponse = Self::check(response).await?.json().await?;
        let session = Session {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
            access_token: token.access_token,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        };

        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        // The local session is dropped even if the remote logout fails.
        *self.session.write().await = None;
        Self::check(response?).await?;
        Ok(())
    }
}
