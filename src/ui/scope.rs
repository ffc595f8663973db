use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{AbortHandle, JoinSet};

use super::{BindingId, ElementId, Event, LifecycleEvent, Screen, ViewRegistry};
use crate::backend::SubscriptionGuard;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type CloseHook = Box<dyn FnOnce(&ViewRegistry) + Send>;

/// 一次挂载所持有的全部资源：事件绑定、订阅守卫、定时器与快照任务
pub struct Scope {
    screen: Screen,
    registry: Arc<ViewRegistry>,
    live: AtomicBool,
    bindings: Mutex<Vec<BindingId>>,
    guards: Mutex<Vec<SubscriptionGuard>>,
    tasks: Mutex<JoinSet<()>>,
    on_close: Mutex<Vec<CloseHook>>,
}

impl Scope {
    pub fn new(screen: Screen, registry: Arc<ViewRegistry>) -> Arc<Self> {
        registry.record(LifecycleEvent::Mounted(screen));
        tracing::debug!("Mounting {:?}", screen);
        Arc::new(Self {
            screen,
            registry,
            live: AtomicBool::new(true),
            bindings: Mutex::new(Vec::new()),
            guards: Mutex::new(Vec::new()),
            tasks: Mutex::new(JoinSet::new()),
            on_close: Mutex::new(Vec::new()),
        })
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn bind(
        &self,
        element: ElementId,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> BindingId {
        let id = self.registry.bind(element, handler);
        lock(&self.bindings).push(id);
        id
    }

    pub fn unbind(&self, id: BindingId) {
        lock(&self.bindings).retain(|b| *b != id);
        self.registry.unbind(id);
    }

    pub fn hold(&self, guard: SubscriptionGuard) {
        if self.is_live() {
            lock(&self.guards).push(guard);
        }
    }

    /// 在作用域内启动任务，卸载时一并取消；作用域已关闭时不启动
    pub fn spawn<F>(&self, task: F) -> Option<AbortHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_live() {
            return None;
        }
        let mut tasks = lock(&self.tasks);
        while tasks.try_join_next().is_some() {}
        Some(tasks.spawn(task))
    }

    pub fn on_close(&self, hook: impl FnOnce(&ViewRegistry) + Send + 'static) {
        lock(&self.on_close).push(Box::new(hook));
    }

    /// 释放所有资源，可重复调用
    pub fn close(&self) {
        if !self.live.swap(false, Ordering::SeqCst) {
            return;
        }

        let bindings = std::mem::take(&mut *lock(&self.bindings));
        for id in &bindings {
            self.registry.unbind(*id);
        }
        let guards = std::mem::take(&mut *lock(&self.guards));
        let subscriptions = guards.len();
        drop(guards);
        lock(&self.tasks).abort_all();

        let hooks = std::mem::take(&mut *lock(&self.on_close));
        for hook in hooks {
            hook(&self.registry);
        }

        self.registry.record(LifecycleEvent::TornDown(self.screen));
        tracing::debug!(
            "Tore down {:?}: {} bindings, {} subscriptions",
            self.screen,
            bindings.len(),
            subscriptions
        );
    }
}

/// 挂载返回的唯一释放句柄；丢弃时同样会释放
pub struct Teardown {
    scope: Option<Arc<Scope>>,
}

impl Teardown {
    pub fn new(scope: Arc<Scope>) -> Self {
        Self { scope: Some(scope) }
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.close();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.release();
    }
}

/// 写操作期间禁用按钮并显示忙碌状态，离开作用域时无条件恢复
pub struct BusyGuard {
    registry: Arc<ViewRegistry>,
    element: ElementId,
}

impl BusyGuard {
    pub fn engage(registry: Arc<ViewRegistry>, element: ElementId) -> Self {
        registry.update(|r| {
            if let Some(control) = r.control_mut(element) {
                control.disabled = true;
                control.busy = true;
            }
        });
        Self { registry, element }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let element = self.element;
        self.registry.update(|r| {
            if let Some(control) = r.control_mut(element) {
                control.disabled = false;
                control.busy = false;
            }
        });
    }
}

/// 列表中正在删除的项
#[derive(Clone, Default)]
pub struct PendingItems(Arc<Mutex<HashSet<String>>>);

impl PendingItems {
    pub fn contains(&self, id: &str) -> bool {
        lock(&self.0).contains(id)
    }
}

/// 列表项上的进行中写操作：同一项同时只允许一个，释放时恢复该项的控件
pub struct ItemBusyGuard {
    registry: Arc<ViewRegistry>,
    list: ElementId,
    id: String,
    pending: PendingItems,
}

impl ItemBusyGuard {
    /// 该项已有写操作在进行时返回 `None`
    pub fn engage(
        registry: Arc<ViewRegistry>,
        list: ElementId,
        id: &str,
        pending: &PendingItems,
    ) -> Option<Self> {
        if !lock(&pending.0).insert(id.to_string()) {
            return None;
        }
        registry.update(|r| {
            if let Some(deleting) = r.item_deleting_mut(list, id) {
                *deleting = true;
            }
        });
        Some(Self {
            registry,
            list,
            id: id.to_string(),
            pending: pending.clone(),
        })
    }
}

impl Drop for ItemBusyGuard {
    fn drop(&mut self) {
        lock(&self.pending.0).remove(&self.id);
        let (list, id) = (self.list, self.id.as_str());
        self.registry.update(|r| {
            if let Some(deleting) = r.item_deleting_mut(list, id) {
                *deleting = false;
            }
        });
    }
}
