use super::auth::AccountRegistry;
use super::query::{Embed, EmbedKind, SelectQuery};
use super::{AuthProvider, RemoteStore, Session};
use crate::core::{EntityId, Result, Row, StoreError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

// Accounts only live in process memory, a low bcrypt cost is enough.
const ACCOUNT_HASH_COST: u32 = 4;
const SESSION_TTL_HOURS: i64 = 1;

/// How a collection generates ids for inserted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Serial,
    Uuid,
}

/// Which calls an injected fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTarget {
    Reads,
    Writes,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
    Delete,
}

/// One accepted write, as the store received it.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub op: WriteOp,
    pub collection: String,
    pub id: Option<EntityId>,
    pub row: Row,
}

struct Collection {
    id_kind: IdKind,
    next_serial: i64,
    rows: Vec<Row>,
}

impl Collection {
    fn new(id_kind: IdKind) -> Self {
        Self {
            id_kind,
            next_serial: 1,
            rows: Vec::new(),
        }
    }

    fn next_id(&mut self) -> Value {
        match self.id_kind {
            IdKind::Serial => {
                let id = self.next_serial;
                self.next_serial += 1;
                Value::from(id)
            }
            IdKind::Uuid => Value::from(Uuid::new_v4().to_string()),
        }
    }

    /// Keeps the serial counter ahead of explicitly supplied integer ids.
    fn observe_id(&mut self, id: &Value) {
        if let Some(n) = id.as_i64() {
            self.next_serial = self.next_serial.max(n + 1);
        }
    }

    fn position(&self, id: &EntityId) -> Option<usize> {
        let id = id.to_value();
        self.rows.iter().position(|row| row.get("id") == Some(&id))
    }
}

#[derive(Default)]
struct Faults {
    reads: usize,
    writes: usize,
    offline: bool,
}

impl Faults {
    fn take(&mut self, write: bool) -> bool {
        if self.offline {
            return true;
        }
        let counter = if write { &mut self.writes } else { &mut self.reads };
        if *counter > 0 {
            *counter -= 1;
            return true;
        }
        false
    }
}

/// In-process stand-in for the hosted store
///
/// Collections are created on first use with serial ids unless declared
/// otherwise. Rows get `id` and `created_at` on insert when absent. Faults can
/// be injected to exercise failure paths of callers.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    accounts: AccountRegistry,
    sessions: RwLock<HashMap<String, Session>>,
    faults: Mutex<Faults>,
    writes: Mutex<Vec<WriteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            accounts: AccountRegistry::with_cost(ACCOUNT_HASH_COST),
            sessions: RwLock::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Declares a collection's id strategy. Existing rows are kept.
    pub async fn define_collection(&self, name: &str, id_kind: IdKind) {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .and_modify(|c| c.id_kind = id_kind)
            .or_insert_with(|| Collection::new(id_kind));
    }

    /// Loads rows verbatim, bypassing fault injection and the write log.
    /// Missing `id` / `created_at` are filled the same way `insert` does.
    pub async fn seed(&self, collection: &str, rows: Vec<Row>) -> Vec<Row> {
        let mut collections = self.collections.write().await;
        let target = collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection::new(IdKind::Serial));

        rows.into_iter()
            .map(|row| Self::store_row(target, row))
            .collect()
    }

    /// Snapshot of a collection in insertion order.
    pub async fn rows(&self, collection: &str) -> Vec<Row> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.rows.clone())
            .unwrap_or_default()
    }

    pub async fn register_account(&self, email: &str, password: &str) -> Result<String> {
        self.accounts.register(email, password).await
    }

    /// Makes the next `count` calls of the given kind fail as unreachable.
    pub async fn fail_next(&self, target: FaultTarget, count: usize) {
        let mut faults = self.faults.lock().await;
        match target {
            FaultTarget::Reads => faults.reads += count,
            FaultTarget::Writes => faults.writes += count,
            FaultTarget::All => {
                faults.reads += count;
                faults.writes += count;
            }
        }
    }

    /// While offline every call fails.
    pub async fn set_offline(&self, offline: bool) {
        self.faults.lock().await.offline = offline;
    }

    /// Accepted writes in the order they were applied.
    pub async fn write_log(&self) -> Vec<WriteRecord> {
        self.writes.lock().await.clone()
    }

    async fn check_fault(&self, write: bool, what: &str) -> Result<()> {
        if self.faults.lock().await.take(write) {
            debug!(operation = what, "memory store: injected fault");
            return Err(StoreError::Unreachable(format!(
                "injected fault on {}",
                what
            )));
        }
        Ok(())
    }

    async fn record(&self, op: WriteOp, collection: &str, id: Option<EntityId>, row: Row) {
        self.writes.lock().await.push(WriteRecord {
            op,
            collection: collection.to_string(),
            id,
            row,
        });
    }

    fn store_row(target: &mut Collection, mut row: Row) -> Row {
        match row.get("id").filter(|id| !id.is_null()).cloned() {
            Some(id) => target.observe_id(&id),
            None => {
                let id = target.next_id();
                row.insert("id".to_string(), id);
            }
        }
        if !row.contains_key("created_at") {
            row.insert("created_at".to_string(), Value::from(Self::timestamp(target)));
        }
        target.rows.push(row.clone());
        row
    }

    /// Creation timestamps must be strictly increasing within a collection so
    /// that newest-first ordering is deterministic.
    fn timestamp(target: &Collection) -> String {
        let mut now = Utc::now();
        if let Some(last) = target
            .rows
            .iter()
            .filter_map(|r| r.get("created_at").and_then(Value::as_str))
            .filter_map(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .max()
        {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        now.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    fn project(row: &Row, columns: &[String]) -> Row {
        if columns.is_empty() {
            return row.clone();
        }
        columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }

    fn resolve_embed(collections: &HashMap<String, Collection>, parent: &Row, embed: &Embed) -> Value {
        let related = collections.get(&embed.collection).map(|c| c.rows.as_slice()).unwrap_or(&[]);

        match embed.kind {
            EmbedKind::One => {
                let Some(key) = parent.get(&embed.local_key).filter(|v| !v.is_null()) else {
                    return Value::Null;
                };
                related
                    .iter()
                    .find(|r| r.get(&embed.foreign_key) == Some(key))
                    .map(|r| Value::Object(Self::project(r, &embed.columns)))
                    .unwrap_or(Value::Null)
            }
            EmbedKind::Many => {
                let key = parent.get(&embed.local_key).cloned().unwrap_or(Value::Null);
                Value::Array(
                    related
                        .iter()
                        .filter(|r| !key.is_null() && r.get(&embed.foreign_key) == Some(&key))
                        .map(|r| Value::Object(Self::project(r, &embed.columns)))
                        .collect(),
                )
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders JSON scalars: numbers numerically, strings lexically, nulls last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        self.check_fault(false, "select").await?;

        let collections = self.collections.read().await;
        let Some(source) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(usize, &Row)> = source
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                query
                    .filters
                    .iter()
                    .all(|f| row.get(&f.column) == Some(&f.value))
            })
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|(ia, a), (ib, b)| {
                let by_column = compare_values(a.get(&order.column), b.get(&order.column));
                let by_column = if order.descending {
                    by_column.reverse()
                } else {
                    by_column
                };
                by_column.then_with(|| if order.descending { ib.cmp(ia) } else { ia.cmp(ib) })
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        let rows = matched
            .into_iter()
            .take(limit)
            .map(|(_, row)| {
                let mut out = Self::project(row, &query.columns);
                for embed in &query.embeds {
                    out.insert(
                        embed.alias.clone(),
                        Self::resolve_embed(&collections, row, embed),
                    );
                }
                out
            })
            .collect::<Vec<_>>();

        debug!(collection = %query.collection, rows = rows.len(), "memory store: select");
        Ok(rows)
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row> {
        self.check_fault(true, "insert").await?;

        let stored = {
            let mut collections = self.collections.write().await;
            let target = collections
                .entry(collection.to_string())
                .or_insert_with(|| Collection::new(IdKind::Serial));
            Self::store_row(target, row)
        };

        let id = stored.get("id").and_then(EntityId::from_value);
        self.record(WriteOp::Insert, collection, id, stored.clone()).await;
        debug!(collection, "memory store: insert");
        Ok(stored)
    }

    async fn update(&self, collection: &str, id: &EntityId, patch: Row) -> Result<Option<Row>> {
        self.check_fault(true, "update").await?;

        let updated = {
            let mut collections = self.collections.write().await;
            let Some(target) = collections.get_mut(collection) else {
                return Ok(None);
            };
            let Some(pos) = target.position(id) else {
                return Ok(None);
            };
            let row = &mut target.rows[pos];
            for (key, value) in patch.iter() {
                if key != "id" {
                    row.insert(key.clone(), value.clone());
                }
            }
            row.clone()
        };

        self.record(WriteOp::Update, collection, Some(id.clone()), patch).await;
        debug!(collection, %id, "memory store: update");
        Ok(Some(updated))
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> Result<()> {
        self.check_fault(true, "delete").await?;

        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(collection)
                .and_then(|target| target.position(id).map(|pos| target.rows.remove(pos)))
        };

        if let Some(row) = removed {
            self.record(WriteOp::Delete, collection, Some(id.clone()), row).await;
        }
        debug!(collection, %id, "memory store: delete");
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.check_fault(false, "sign_in").await?;

        let account = self.accounts.authenticate(email, password).await?;
        let session = Session {
            user_id: account.user_id().to_string(),
            email: account.email().to_string(),
            access_token: Uuid::new_v4().to_string(),
            expires_at: Some(Utc::now() + Duration::hours(SESSION_TTL_HOURS)),
        };

        self.sessions
            .write()
            .await
            .insert(session.access_token.clone(), session.clone());
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        self.sessions.write().await.remove(&session.access_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let first = store.insert("products", row(json!({"name": "A"}))).await.unwrap();
        let second = store.insert("products", row(json!({"name": "B"}))).await.unwrap();

        assert_eq!(first["id"], json!(1));
        assert_eq!(second["id"], json!(2));
        assert!(first["created_at"].as_str().unwrap() < second["created_at"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_uuid_collections() {
        let store = MemoryStore::new();
        store.define_collection("coupons", IdKind::Uuid).await;
        let coupon = store.insert("coupons", row(json!({"code": "X"}))).await.unwrap();
        assert!(Uuid::parse_str(coupon["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_select_orders_newest_first_and_filters() {
        let store = MemoryStore::new();
        for name in ["A", "B", "C"] {
            store.insert("products", row(json!({"name": name}))).await.unwrap();
        }

        let all = store
            .select(&SelectQuery::from("products").order_desc("created_at"))
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        let one = store
            .select_single(&SelectQuery::from("products").eq("name", "B").columns(&["id"]))
            .await
            .unwrap();
        assert_eq!(one, row(json!({"id": 2})));

        let missing = store
            .select_single(&SelectQuery::from("products").eq("name", "Z"))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_embeds() {
        let store = MemoryStore::new();
        store
            .seed("profiles", vec![row(json!({"id": "u1", "full_name": "Ana", "email": "ana@x.com"}))])
            .await;
        store
            .seed("orders", vec![
                row(json!({"id": 10, "user_id": "u1"})),
                row(json!({"id": 11, "user_id": null})),
            ])
            .await;
        store
            .seed("order_items", vec![
                row(json!({"id": 1, "order_id": 10, "name": "Boot"})),
                row(json!({"id": 2, "order_id": 10, "name": "Sock"})),
            ])
            .await;

        let rows = store
            .select(
                &SelectQuery::from("orders")
                    .embed(Embed::one("profiles", "profiles", "user_id").columns(&["full_name"]))
                    .embed(Embed::many("items", "order_items", "order_id"))
                    .order_asc("id"),
            )
            .await
            .unwrap();

        assert_eq!(rows[0]["profiles"], json!({"full_name": "Ana"}));
        assert_eq!(rows[0]["items"].as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["profiles"], Value::Null);
        assert_eq!(rows[1]["items"], json!([]));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        store.insert("products", row(json!({"name": "A", "price": 10}))).await.unwrap();
        let id = EntityId::Int(1);

        let updated = store
            .update("products", &id, row(json!({"price": 12, "id": 99})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["price"], json!(12));
        assert_eq!(updated["id"], json!(1));

        assert!(store.update("products", &EntityId::Int(5), Row::new()).await.unwrap().is_none());

        store.delete("products", &id).await.unwrap();
        store.delete("products", &id).await.unwrap();
        assert!(store.rows("products").await.is_empty());

        let log = store.write_log().await;
        let ops: Vec<_> = log.iter().map(|w| w.op).collect();
        assert_eq!(ops, vec![WriteOp::Insert, WriteOp::Update, WriteOp::Delete]);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        store.fail_next(FaultTarget::Writes, 1).await;

        let err = store.insert("products", row(json!({"name": "A"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
        assert!(store.select(&SelectQuery::from("products")).await.is_ok());
        assert!(store.insert("products", row(json!({"name": "A"}))).await.is_ok());

        store.set_offline(true).await;
        assert!(store.select(&SelectQuery::from("products")).await.is_err());
        store.set_offline(false).await;
        assert_eq!(store.rows("products").await.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in() {
        let store = MemoryStore::new();
        store.register_account("admin@shop.com", "secret123").await.unwrap();

        let session = store.sign_in("admin@shop.com", "secret123").await.unwrap();
        assert_eq!(session.email, "admin@shop.com");
        assert!(!session.is_expired_at(Utc::now()));

        assert!(matches!(
            store.sign_in("admin@shop.com", "nope").await,
            Err(StoreError::InvalidCredentials)
        ));
        store.sign_out(&session).await.unwrap();
    }
}
