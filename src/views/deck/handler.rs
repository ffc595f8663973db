use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;

use super::model::Deck;
use crate::AppContext;
use crate::ui::{
    BusyGuard, DeckItem, ElementId, Event, ItemBusyGuard, PendingItems, Scope, Screen, Teardown,
    ViewRegistry,
};

pub type OnSelect = Arc<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Default)]
struct DeckViewState {
    decks: Vec<Deck>,
}

fn render_decks(registry: &ViewRegistry, decks: &[Deck], deleting: &PendingItems) {
    registry.update(|r| {
        r.deck.items = decks
            .iter()
            .map(|deck| DeckItem {
                id: deck.id.clone(),
                name: deck.name.clone(),
                deleting: deleting.contains(&deck.id),
            })
            .collect();
        r.deck.empty_message_visible = decks.is_empty();
    });
}

/// 挂载卡组列表：订阅当前用户的卡组，绑定新建、删除与选择
pub fn mount(ctx: &AppContext, user_id: &str, on_select: OnSelect) -> Teardown {
    let scope = Scope::new(Screen::DeckList, ctx.registry.clone());
    let state = Arc::new(Mutex::new(DeckViewState::default()));
    let deleting = PendingItems::default();

    match ctx.documents.subscribe(Deck::query_for(user_id)) {
        Ok(subscription) => {
            let (guard, mut snapshots) = subscription.into_parts();
            scope.hold(guard);

            let (ctx, state, deleting, task_scope) =
                (ctx.clone(), state.clone(), deleting.clone(), scope.clone());
            scope.spawn(async move {
                while let Some(snapshot) = snapshots.next().await {
                    if !task_scope.is_live() {
                        break;
                    }
                    match snapshot {
                        Ok(docs) => {
                            let decks: Vec<Deck> = docs
                                .iter()
                                .filter_map(|doc| match Deck::from_document(doc) {
                                    Ok(deck) => Some(deck),
                                    Err(e) => {
                                        tracing::warn!("Skipping deck: {}", e);
                                        None
                                    }
                                })
                                .collect();
                            render_decks(&ctx.registry, &decks, &deleting);
                            state.lock().unwrap_or_else(PoisonError::into_inner).decks = decks;
                        }
                        Err(e) => {
                            tracing::error!("Error fetching decks: {}", e);
                            ctx.dialogs.notify("Failed to load decks.");
                        }
                    }
                }
            });
        }
        Err(e) => {
            tracing::error!("Error subscribing to decks: {}", e);
            ctx.dialogs.notify("Failed to load decks.");
        }
    }

    {
        let registry = ctx.registry.clone();
        scope.bind(ElementId::AddDeckFab, move |_| {
            registry.update(|r| r.deck.add_modal_open = true);
        });
    }
    {
        let registry = ctx.registry.clone();
        scope.bind(ElementId::CancelAddDeck, move |_| {
            registry.update(|r| {
                r.deck.add_modal_open = false;
                r.deck.new_name.clear();
            });
        });
    }

    {
        let (ctx, scope_ref, user_id) = (ctx.clone(), Arc::downgrade(&scope), user_id.to_string());
        scope.bind(ElementId::ConfirmAddDeck, move |_| {
            let Some(scope) = scope_ref.upgrade() else {
                return;
            };
            add_deck(&ctx, scope, &user_id);
        });
    }

    {
        let (ctx, state, scope_ref) = (ctx.clone(), state.clone(), Arc::downgrade(&scope));
        let deleting = deleting.clone();
        scope.bind(ElementId::DeckList, move |event| match event {
            Event::ClickItemDelete(deck_id) => {
                if let Some(scope) = scope_ref.upgrade() {
                    delete_deck(&ctx, scope, &deleting, deck_id);
                }
            }
            Event::ClickItem(deck_id) => {
                let name = state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .decks
                    .iter()
                    .find(|d| &d.id == deck_id)
                    .map(|d| d.name.clone());
                // 锁释放后再回调，回调会挂载下一个屏幕
                match name {
                    Some(name) => on_select(deck_id, &name),
                    None => tracing::warn!("Clicked unknown deck {}", deck_id),
                }
            }
            _ => {}
        });
    }

    Teardown::new(scope)
}

fn add_deck(ctx: &AppContext, scope: Arc<Scope>, user_id: &str) {
    let name = ctx.registry.read(|r| r.deck.new_name.trim().to_string());
    if name.is_empty() {
        ctx.dialogs.notify("Please enter a deck name.");
        return;
    }

    let busy = BusyGuard::engage(ctx.registry.clone(), ElementId::ConfirmAddDeck);
    let (ctx, user_id) = (ctx.clone(), user_id.to_string());
    // 写操作不随屏幕卸载取消
    tokio::spawn(async move {
        let _busy = busy;
        match Deck::create(ctx.documents.as_ref(), &name, &user_id).await {
            Ok(_) => {
                if scope.is_live() {
                    ctx.registry.update(|r| {
                        r.deck.new_name.clear();
                        r.deck.add_modal_open = false;
                    });
                }
            }
            Err(e) => {
                tracing::error!("Error adding deck: {}", e);
                if scope.is_live() {
                    ctx.dialogs.notify(&format!("Failed to add the deck. {}", e.notice()));
                }
            }
        }
    });
}

fn delete_deck(ctx: &AppContext, scope: Arc<Scope>, deleting: &PendingItems, deck_id: &str) {
    // 同一卡组的删除尚未结束时忽略重复点击
    let Some(busy) = ItemBusyGuard::engage(ctx.registry.clone(), ElementId::DeckList, deck_id, deleting)
    else {
        tracing::debug!("Delete of deck {} already in progress", deck_id);
        return;
    };
    if !ctx
        .dialogs
        .confirm("Delete this deck? Its cards are not removed automatically.")
    {
        return;
    }

    let (ctx, deck_id) = (ctx.clone(), deck_id.to_string());
    tokio::spawn(async move {
        let _busy = busy;
        if let Err(e) = Deck::delete(ctx.documents.as_ref(), &deck_id).await {
            tracing::error!("Error deleting deck {}: {}", deck_id, e);
            if scope.is_live() {
                ctx.dialogs.notify("Failed to delete the deck.");
            }
        }
    });
}
