//! Capability surface of the hosted backend: authentication, a document store with realtime
//! queries, and an object store for card images.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{AuthError, StorageError, StoreError};

pub mod document;
pub mod memory;
pub mod subscription;

pub use document::{
    CollectionPath, Direction, Document, DocumentPath, Fields, Query, paths, to_fields,
};
pub use subscription::{SnapshotResult, SnapshotStream, Subscription, SubscriptionGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// 每次登录状态变化都会推送当前用户（或 `None`）
    fn auth_state(&self) -> watch::Receiver<Option<User>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 建立实时查询；初始快照立即推送
    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;

    /// 新增文档，返回生成的文档 id
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;
    async fn get(&self, path: &DocumentPath) -> Result<Document, StoreError>;
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;
}

/// 对象存储中的不透明引用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub path: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<ObjectRef, StorageError>;
    async fn url(&self, object: &ObjectRef) -> Result<String, StorageError>;
    fn ref_from_url(&self, url: &str) -> Result<ObjectRef, StorageError>;

    /// 对象不存在时返回 `StorageError::NotFound`，由调用方决定是否忽略
    async fn delete(&self, object: &ObjectRef) -> Result<(), StorageError>;
}
