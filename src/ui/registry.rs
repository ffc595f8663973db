use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ElementId, Event, Regions, Screen};

pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Mounted(Screen),
    TornDown(Screen),
    Shown(Screen),
}

#[derive(Default)]
struct BindingTable {
    next: u64,
    // 按注册顺序触发
    handlers: BTreeMap<BindingId, (ElementId, Handler)>,
}

/// 所有可交互区域的引用表，按屏幕分组，同一时刻只显示一个屏幕
pub struct ViewRegistry {
    regions: Mutex<Regions>,
    bindings: Mutex<BindingTable>,
    journal: Mutex<Vec<LifecycleEvent>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ViewRegistry {
    pub fn new(viewport_width: f64, gallery_columns: u8) -> Self {
        Self {
            regions: Mutex::new(Regions::new(viewport_width, gallery_columns)),
            bindings: Mutex::new(BindingTable::default()),
            journal: Mutex::new(Vec::new()),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Regions) -> R) -> R {
        f(&lock(&self.regions))
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Regions) -> R) -> R {
        f(&mut lock(&self.regions))
    }

    pub fn snapshot(&self) -> Regions {
        lock(&self.regions).clone()
    }

    pub fn show_screen(&self, screen: Screen) {
        lock(&self.regions).active = screen;
        self.record(LifecycleEvent::Shown(screen));
        tracing::debug!("Showing screen {:?}", screen);
    }

    pub fn active_screen(&self) -> Screen {
        lock(&self.regions).active
    }

    pub fn viewport_width(&self) -> f64 {
        lock(&self.regions).viewport_width
    }

    pub fn set_viewport_width(&self, width: f64) {
        lock(&self.regions).viewport_width = width;
    }

    pub fn bind(
        &self,
        element: ElementId,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> BindingId {
        let mut table = lock(&self.bindings);
        let id = BindingId(table.next);
        table.next += 1;
        table.handlers.insert(id, (element, Arc::new(handler)));
        id
    }

    pub fn unbind(&self, id: BindingId) -> bool {
        lock(&self.bindings).handlers.remove(&id).is_some()
    }

    pub fn binding_count(&self) -> usize {
        lock(&self.bindings).handlers.len()
    }

    pub fn bindings_on(&self, element: ElementId) -> usize {
        lock(&self.bindings)
            .handlers
            .values()
            .filter(|(target, _)| *target == element)
            .count()
    }

    /// 派发事件：先执行输入框等元素的固有行为，再按注册顺序调用处理函数。
    /// 调用处理函数时不持有任何内部锁，处理函数可以自由绑定或解绑。
    pub fn dispatch(&self, element: ElementId, event: Event) {
        {
            let mut regions = lock(&self.regions);
            if matches!(event, Event::Click)
                && regions.control(element).is_some_and(|c| c.disabled)
            {
                tracing::debug!("Ignoring click on disabled {:?}", element);
                return;
            }
            match &event {
                Event::Input(value) => {
                    if let Some(input) = regions.input_mut(element) {
                        *input = value.clone();
                    }
                }
                Event::FileChosen(file) => {
                    if let Some(slot) = regions.file_mut(element) {
                        *slot = file.clone();
                    }
                }
                _ => {}
            }
        }

        let handlers: Vec<Handler> = lock(&self.bindings)
            .handlers
            .values()
            .filter(|(target, _)| *target == element)
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(&event);
        }
    }

    pub fn record(&self, event: LifecycleEvent) {
        lock(&self.journal).push(event);
    }

    pub fn lifecycle_journal(&self) -> Vec<LifecycleEvent> {
        lock(&self.journal).clone()
    }

    pub fn clear_journal(&self) {
        lock(&self.journal).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatch_reaches_only_bound_element() {
        let registry = ViewRegistry::new(1000.0, 3);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = registry.bind(ElementId::AddDeckFab, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(ElementId::AddDeckFab, Event::Click);
        registry.dispatch(ElementId::AddCardFab, Event::Click);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(registry.unbind(id));
        registry.dispatch(ElementId::AddDeckFab, Event::Click);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.binding_count(), 0);
    }

    #[test]
    fn input_events_store_their_value_before_handlers_run() {
        let registry = Arc::new(ViewRegistry::new(1000.0, 3));
        let seen = Arc::new(Mutex::new(String::new()));
        let (reg, out) = (registry.clone(), seen.clone());
        registry.bind(ElementId::CardSearch, move |_| {
            *out.lock().unwrap() = reg.read(|r| r.card.search.clone());
        });

        registry.dispatch(ElementId::CardSearch, Event::Input("hol".into()));
        assert_eq!(seen.lock().unwrap().as_str(), "hol");
    }

    #[test]
    fn disabled_control_swallows_clicks() {
        let registry = ViewRegistry::new(1000.0, 3);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        registry.bind(ElementId::ConfirmAddDeck, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.update(|r| r.deck.confirm.disabled = true);
        registry.dispatch(ElementId::ConfirmAddDeck, Event::Click);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handlers_may_unbind_during_dispatch() {
        let registry = Arc::new(ViewRegistry::new(1000.0, 3));
        let slot: Arc<Mutex<Option<BindingId>>> = Arc::new(Mutex::new(None));
        let (reg, own) = (registry.clone(), slot.clone());
        let id = registry.bind(ElementId::Document, move |_| {
            if let Some(id) = own.lock().unwrap().take() {
                reg.unbind(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        registry.dispatch(ElementId::Document, Event::PointerUp { x: 0.0 });
        assert_eq!(registry.bindings_on(ElementId::Document), 0);
    }
}
