use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::time::Instant;

use super::gesture::{
    DragPhase, Release, SwipeDirection, classify_release, drag_transform, exit_transform,
    rest_transform,
};
use super::model::{StudyLogEntry, StudyResult};
use crate::AppContext;
use crate::ui::{BindingId, Control, ElementId, Event, Scope, Screen, SwipeCardView, Teardown};
use crate::views::card::Card;

struct DrillState {
    cards: Vec<Card>,
    index: usize,
    phase: DragPhase,
    shown_at: Instant,
    // 拖动期间挂在全局指针上的绑定
    pointer_binding: Option<BindingId>,
}

struct Drill {
    ctx: AppContext,
    scope: Weak<Scope>,
    deck_id: String,
    user_id: String,
    state: Mutex<DrillState>,
}

/// 一次判定的结果，锁外再落库和调度
struct Committed {
    entry: StudyLogEntry,
    pointer_binding: Option<BindingId>,
}

impl Drill {
    fn state(&self) -> MutexGuard<'_, DrillState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn progress(index: usize, total: usize) -> usize {
        (index + 1).min(total)
    }

    /// 展示当前序号的卡片；已全部学完时进入完成状态
    fn load_card(&self) {
        let mut state = self.state();
        let total = state.cards.len();
        let current = state.cards.get(state.index).cloned();
        match current {
            Some(card) => {
                state.phase = DragPhase::Idle;
                state.shown_at = Instant::now();
                let progress = Self::progress(state.index, total);
                drop(state);
                self.ctx.registry.update(|r| {
                    r.swipe.active = Some(SwipeCardView {
                        card,
                        flipped: false,
                        transform: Default::default(),
                    });
                    r.swipe.progress_current = progress;
                    r.swipe.progress_total = total;
                });
            }
            None => {
                state.phase = DragPhase::Completed;
                drop(state);
                tracing::info!("Drill of deck {} completed ({} cards)", self.deck_id, total);
                self.ctx.registry.update(|r| {
                    r.swipe.active = None;
                    r.swipe.completed = true;
                    r.swipe.forgot.disabled = true;
                    r.swipe.remembered.disabled = true;
                });
            }
        }
    }

    fn pointer_down(self: &Arc<Self>, x: f64) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        {
            let mut state = self.state();
            if state.phase != DragPhase::Idle {
                return;
            }
            state.phase = DragPhase::Dragging {
                start_x: x,
                current_x: x,
            };
        }

        let drill = Arc::clone(self);
        let binding = scope.bind(ElementId::Document, move |event| match *event {
            Event::PointerMove { x } => drill.pointer_move(x),
            Event::PointerUp { x } => drill.pointer_up(x),
            _ => {}
        });
        self.state().pointer_binding = Some(binding);
    }

    fn pointer_move(&self, x: f64) {
        let delta = {
            let mut state = self.state();
            let DragPhase::Dragging { start_x, .. } = state.phase else {
                return;
            };
            state.phase = DragPhase::Dragging {
                start_x,
                current_x: x,
            };
            x - start_x
        };
        let transform = drag_transform(delta, &self.ctx.config);
        self.ctx.registry.update(|r| {
            if let Some(active) = r.swipe.active.as_mut() {
                active.transform = transform;
            }
        });
    }

    fn pointer_up(self: &Arc<Self>, x: f64) {
        let (delta, binding) = {
            let mut state = self.state();
            let DragPhase::Dragging { start_x, .. } = state.phase else {
                return;
            };
            (x - start_x, state.pointer_binding.take())
        };
        self.release_pointer(binding);

        let width = self.ctx.registry.viewport_width();
        match classify_release(delta, width, &self.ctx.config) {
            Release::Tap => {
                self.state().phase = DragPhase::Idle;
                self.ctx.registry.update(|r| {
                    if let Some(active) = r.swipe.active.as_mut() {
                        active.flipped = !active.flipped;
                        active.transform = Default::default();
                    }
                });
            }
            Release::SnapBack => {
                self.state().phase = DragPhase::Idle;
                self.ctx.registry.update(|r| {
                    if let Some(active) = r.swipe.active.as_mut() {
                        active.transform = rest_transform();
                    }
                });
            }
            Release::Swipe(direction) => self.commit(direction.into()),
        }
    }

    fn release_pointer(&self, binding: Option<BindingId>) {
        if let (Some(binding), Some(scope)) = (binding, self.scope.upgrade()) {
            scope.unbind(binding);
        }
    }

    /// 判定当前卡片；同一张卡片只有第一次判定生效
    fn commit(self: &Arc<Self>, result: StudyResult) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        let committed = {
            let mut state = self.state();
            if !state.phase.accepts_action() {
                tracing::debug!("Ignoring {:?}, card already judged", result);
                return;
            }
            let Some(card) = state.cards.get(state.index) else {
                return;
            };
            let entry = StudyLogEntry {
                card_id: card.id.clone(),
                user_id: self.user_id.clone(),
                result,
                view_duration_ms: u64::try_from(state.shown_at.elapsed().as_millis())
                    .unwrap_or(u64::MAX),
                logged_at: Utc::now(),
            };
            state.phase = DragPhase::Animating;
            state.index += 1;
            Committed {
                entry,
                pointer_binding: state.pointer_binding.take(),
            }
        };
        self.release_pointer(committed.pointer_binding);

        let (index, total) = {
            let state = self.state();
            (state.index, state.cards.len())
        };
        let width = self.ctx.registry.viewport_width();
        let transform = exit_transform(SwipeDirection::from(result), width, &self.ctx.config);
        self.ctx.registry.update(|r| {
            if let Some(active) = r.swipe.active.as_mut() {
                active.transform = transform;
            }
            r.swipe.progress_current = Self::progress(index, total);
        });

        // 日志写入失败只记录，不阻塞学习流程
        let (documents, deck_id, entry) =
            (self.ctx.documents.clone(), self.deck_id.clone(), committed.entry);
        tokio::spawn(async move {
            if let Err(e) = entry.record(documents.as_ref(), &deck_id).await {
                tracing::error!("Error logging study result for card {}: {}", entry.card_id, e);
            }
        });

        let (drill, delay) = (Arc::clone(self), self.ctx.config.exit_animation());
        scope.spawn(async move {
            tokio::time::sleep(delay).await;
            drill.load_card();
        });
    }
}

/// 挂载滑动学习：卡片列表在挂载时复制一份，之后不随订阅变化
pub fn mount(ctx: &AppContext, deck_id: &str, user_id: &str, cards: Vec<Card>) -> Teardown {
    let scope = Scope::new(Screen::SwipeDrill, ctx.registry.clone());
    tracing::info!("Starting drill of deck {} with {} cards", deck_id, cards.len());

    let drill = Arc::new(Drill {
        ctx: ctx.clone(),
        scope: Arc::downgrade(&scope),
        deck_id: deck_id.to_string(),
        user_id: user_id.to_string(),
        state: Mutex::new(DrillState {
            cards,
            index: 0,
            phase: DragPhase::Idle,
            shown_at: Instant::now(),
            pointer_binding: None,
        }),
    });

    ctx.registry.update(|r| {
        r.swipe.completed = false;
        r.swipe.forgot = Control::default();
        r.swipe.remembered = Control::default();
    });
    drill.load_card();

    {
        let drill = drill.clone();
        scope.bind(ElementId::SwipeCard, move |event| {
            if let Event::PointerDown { x, .. } = *event {
                drill.pointer_down(x);
            }
        });
    }
    {
        let drill = drill.clone();
        scope.bind(ElementId::SwipeRemembered, move |_| drill.commit(StudyResult::Remembered));
    }
    {
        let drill = drill.clone();
        scope.bind(ElementId::SwipeForgot, move |_| drill.commit(StudyResult::Forgot));
    }

    scope.on_close(|registry| {
        registry.update(|r| r.swipe.active = None);
    });

    Teardown::new(scope)
}
