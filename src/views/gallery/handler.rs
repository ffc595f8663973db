use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::AbortHandle;

use crate::AppContext;
use crate::ui::{ElementId, Event, GalleryCell, OverlayPhase, Scope, Screen, Teardown};
use crate::views::card::Card;

struct Press {
    card_id: String,
    start_x: f64,
    /// 长按已触发，松手时不再翻面
    fired: bool,
    timer: Option<AbortHandle>,
}

impl Press {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Gallery {
    ctx: AppContext,
    scope: Weak<Scope>,
    press: Mutex<Option<Press>>,
}

/// 滑块值直接映射为列数
pub fn zoom_to_columns(value: &str, max_columns: u8) -> Option<u8> {
    let value: f64 = value.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(1.0, f64::from(max_columns.max(1))) as u8)
}

impl Gallery {
    fn press(&self) -> MutexGuard<'_, Option<Press>> {
        self.press.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pointer_down(self: &Arc<Self>, x: f64, card_id: &str) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        if let Some(mut previous) = self.press().take() {
            previous.cancel_timer();
        }

        let (gallery, delay, id) = (Arc::clone(self), self.ctx.config.long_press(), card_id.to_string());
        let timer = scope.spawn(async move {
            tokio::time::sleep(delay).await;
            gallery.long_press_fired(&id);
        });
        *self.press() = Some(Press {
            card_id: card_id.to_string(),
            start_x: x,
            fired: false,
            timer,
        });
    }

    fn long_press_fired(&self, card_id: &str) {
        {
            let mut press = self.press();
            match press.as_mut() {
                Some(p) if p.card_id == card_id && !p.fired => {
                    p.fired = true;
                    p.timer = None;
                }
                _ => return,
            }
        }
        tracing::debug!("Long press on card {}, opening overlay", card_id);
        self.ctx.registry.update(|r| {
            let card = r
                .gallery
                .cells
                .iter()
                .find(|cell| cell.card.id == card_id)
                .map(|cell| cell.card.clone());
            if let Some(card) = card {
                r.gallery.overlay.content = Some(card);
                r.gallery.overlay.phase = OverlayPhase::Shown;
            }
        });
    }

    fn pointer_move(&self, x: f64) {
        let mut press = self.press();
        let moved = press
            .as_ref()
            .is_some_and(|p| !p.fired && (x - p.start_x).abs() >= self.ctx.config.tap_epsilon_px);
        if moved {
            // 移动即视为滚动，取消长按与点击
            if let Some(mut p) = press.take() {
                p.cancel_timer();
            }
        }
    }

    fn pointer_leave(&self) {
        if let Some(mut p) = self.press().take() {
            p.cancel_timer();
        }
    }

    fn pointer_up(&self) {
        let Some(mut press) = self.press().take() else {
            return;
        };
        press.cancel_timer();
        if press.fired {
            return;
        }
        self.ctx.registry.update(|r| {
            if let Some(cell) = r.gallery.cells.iter_mut().find(|c| c.card.id == press.card_id) {
                cell.flipped = !cell.flipped;
            }
        });
    }

    fn dismiss_overlay(&self) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        let closing = self.ctx.registry.update(|r| {
            if r.gallery.overlay.phase != OverlayPhase::Shown {
                return false;
            }
            r.gallery.overlay.phase = OverlayPhase::Closing;
            true
        });
        if !closing {
            return;
        }

        let (registry, delay) = (self.ctx.registry.clone(), self.ctx.config.overlay_transition());
        scope.spawn(async move {
            tokio::time::sleep(delay).await;
            registry.update(|r| {
                // 淡出期间可能已重新打开
                if r.gallery.overlay.phase == OverlayPhase::Closing {
                    r.gallery.overlay.phase = OverlayPhase::Hidden;
                    r.gallery.overlay.content = None;
                }
            });
        });
    }
}

/// 挂载画廊：以网格展示传入的卡片，支持点击翻面与长按放大
pub fn mount(ctx: &AppContext, cards: Vec<Card>) -> Teardown {
    let scope = Scope::new(Screen::Gallery, ctx.registry.clone());
    let max_columns = ctx.config.gallery_max_columns;

    ctx.registry.update(|r| {
        r.gallery.cells = cards
            .into_iter()
            .map(|card| GalleryCell {
                card,
                flipped: false,
            })
            .collect();
        if let Some(columns) = zoom_to_columns(&r.gallery.zoom, max_columns) {
            r.gallery.columns = columns;
        }
        r.gallery.overlay = Default::default();
    });

    let gallery = Arc::new(Gallery {
        ctx: ctx.clone(),
        scope: Arc::downgrade(&scope),
        press: Mutex::new(None),
    });

    {
        let registry = ctx.registry.clone();
        scope.bind(ElementId::ZoomSlider, move |event| {
            let Event::Input(value) = event else {
                return;
            };
            match zoom_to_columns(value, max_columns) {
                Some(columns) => registry.update(|r| r.gallery.columns = columns),
                None => tracing::warn!("Ignoring zoom value {:?}", value),
            }
        });
    }

    {
        let gallery = gallery.clone();
        scope.bind(ElementId::GalleryGrid, move |event| match event {
            Event::PointerDown { x, item: Some(card_id) } => gallery.pointer_down(*x, card_id),
            Event::PointerMove { x } => gallery.pointer_move(*x),
            Event::PointerUp { .. } => gallery.pointer_up(),
            Event::PointerLeave => gallery.pointer_leave(),
            _ => {}
        });
    }

    {
        let gallery = gallery.clone();
        scope.bind(ElementId::GalleryOverlay, move |event| {
            if matches!(event, Event::Click) {
                gallery.dismiss_overlay();
            }
        });
    }

    scope.on_close(|registry| {
        registry.update(|r| {
            r.gallery.overlay = Default::default();
            r.gallery.cells.clear();
        });
    });

    Teardown::new(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_maps_directly_to_columns() {
        assert_eq!(zoom_to_columns("4", 6), Some(4));
        assert_eq!(zoom_to_columns(" 2 ", 6), Some(2));
        assert_eq!(zoom_to_columns("0", 6), Some(1));
        assert_eq!(zoom_to_columns("9", 6), Some(6));
        assert_eq!(zoom_to_columns("2.6", 6), Some(3));
        assert_eq!(zoom_to_columns("wide", 6), None);
    }
}
