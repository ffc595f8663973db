use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use super::document::Document;
use crate::error::StoreError;

pub type SnapshotResult = Result<Vec<Document>, StoreError>;

/// 由文档存储实现，用于同步取消订阅
pub trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

/// 实时订阅：每个事件都是完整快照，消费者总是整体替换
pub struct Subscription {
    guard: SubscriptionGuard,
    stream: SnapshotStream,
}

impl Subscription {
    pub fn new(
        id: u64,
        owner: Arc<dyn Unsubscribe>,
        rx: mpsc::UnboundedReceiver<SnapshotResult>,
    ) -> Self {
        Self {
            guard: SubscriptionGuard {
                id,
                owner: Some(owner),
            },
            stream: SnapshotStream { rx },
        }
    }

    /// 拆成守卫和快照流：守卫留在作用域内，流交给消费任务
    pub fn into_parts(self) -> (SubscriptionGuard, SnapshotStream) {
        (self.guard, self.stream)
    }
}

pub struct SubscriptionGuard {
    id: u64,
    owner: Option<Arc<dyn Unsubscribe>>,
}

impl SubscriptionGuard {
    fn release(&mut self) {
        if let Some(owner) = self.owner.take() {
            tracing::debug!("Unsubscribing realtime query #{}", self.id);
            owner.unsubscribe(self.id);
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct SnapshotStream {
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
}

impl Stream for SnapshotStream {
    type Item = SnapshotResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
