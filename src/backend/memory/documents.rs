use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::document::compare_values;
use crate::backend::subscription::{SnapshotResult, Unsubscribe};
use crate::backend::{
    CollectionPath, Direction, Document, DocumentPath, DocumentStore, Fields, Query, Subscription,
};
use crate::error::StoreError;

struct StoredDocument {
    doc: Document,
    seq: u64,
}

struct Listener {
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct StoreState {
    documents: BTreeMap<String, StoredDocument>,
    listeners: HashMap<u64, Listener>,
    next_listener: u64,
    next_seq: u64,
    write_failure: Option<StoreError>,
    subscribe_failure: Option<StoreError>,
    latency: Duration,
}

impl StoreState {
    fn snapshot(&self, query: &Query) -> Vec<Document> {
        let mut matched: Vec<&StoredDocument> = self
            .documents
            .values()
            .filter(|stored| query.matches(&stored.doc))
            .collect();

        // 同值时按写入顺序，新写入的排在前面（降序）或后面（升序）
        matched.sort_by(|a, b| {
            let ordering = match &query.order_by {
                Some(order) => compare_values(
                    a.doc.fields.get(&order.field),
                    b.doc.fields.get(&order.field),
                )
                .then(a.seq.cmp(&b.seq)),
                None => a.seq.cmp(&b.seq),
            };
            match query.order_by.as_ref().map(|o| o.direction) {
                Some(Direction::Descending) => ordering.reverse(),
                _ => ordering,
            }
        });

        matched.into_iter().map(|stored| stored.doc.clone()).collect()
    }

    fn notify(&mut self, collection: &CollectionPath) {
        let mut closed = Vec::new();
        for (id, listener) in &self.listeners {
            if &listener.query.collection != collection {
                continue;
            }
            let snapshot = self.snapshot(&listener.query);
            if listener.tx.send(Ok(snapshot)).is_err() {
                closed.push(*id);
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
    }
}

struct Shared {
    state: Mutex<StoreState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Unsubscribe for Shared {
    fn unsubscribe(&self, id: u64) {
        self.lock().listeners.remove(&id);
    }
}

/// 进程内文档存储，支持实时查询
#[derive(Clone)]
pub struct MemoryDocumentStore {
    shared: Arc<Shared>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
            }),
        }
    }

    /// 当前活跃的实时订阅数量
    pub fn active_subscriptions(&self) -> usize {
        self.shared.lock().listeners.len()
    }

    /// 同步读取集合内容（写入顺序）
    pub fn list(&self, collection: &CollectionPath) -> Vec<Document> {
        self.shared.lock().snapshot(&Query::new(collection.clone()))
    }

    pub fn fail_writes(&self, error: Option<StoreError>) {
        self.shared.lock().write_failure = error;
    }

    pub fn fail_subscriptions(&self, error: Option<StoreError>) {
        self.shared.lock().subscribe_failure = error;
    }

    /// 每次读写前的模拟网络延迟
    pub fn set_latency(&self, latency: Duration) {
        self.shared.lock().latency = latency;
    }

    /// 向所有订阅推送一个错误事件
    pub fn push_error(&self, error: StoreError) {
        let state = self.shared.lock();
        for listener in state.listeners.values() {
            let _ = listener.tx.send(Err(error.clone()));
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.shared.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let mut state = self.shared.lock();
        if let Some(error) = state.subscribe_failure.clone() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(state.snapshot(&query)));

        let id = state.next_listener;
        state.next_listener += 1;
        tracing::debug!("Realtime query #{} on {}", id, query.collection);
        state.listeners.insert(id, Listener { query, tx });

        let owner: Arc<dyn Unsubscribe> = self.shared.clone();
        Ok(Subscription::new(id, owner, rx))
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.simulate_latency().await;

        let mut state = self.shared.lock();
        if let Some(error) = state.write_failure.clone() {
            return Err(error);
        }

        let id = Uuid::new_v4().simple().to_string();
        let path = collection.doc(&id);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.documents.insert(
            path.to_string(),
            StoredDocument {
                doc: Document { path, fields },
                seq,
            },
        );
        state.notify(collection);
        Ok(id)
    }

    async fn get(&self, path: &DocumentPath) -> Result<Document, StoreError> {
        self.simulate_latency().await;

        self.shared
            .lock()
            .documents
            .get(&path.to_string())
            .map(|stored| stored.doc.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.simulate_latency().await;

        let mut state = self.shared.lock();
        if let Some(error) = state.write_failure.clone() {
            return Err(error);
        }

        // 与托管文档库一致：删除文档不会级联删除子集合
        if state.documents.remove(&path.to_string()).is_some() {
            state.notify(&path.parent());
        }
        Ok(())
    }
}
