use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::StreamExt;

use super::model::{Card, CardDraft, filter_cards};
use crate::AppContext;
use crate::ui::{
    BusyGuard, CardItem, ElementId, Event, ItemBusyGuard, PendingItems, Regions, Scope, Screen,
    Teardown, ViewRegistry,
};

pub type OnCards = Arc<dyn Fn(Vec<Card>) + Send + Sync>;

/// 卡片列表向外发出的请求
#[derive(Clone)]
pub struct CardCallbacks {
    pub on_study: OnCards,
    pub on_gallery: OnCards,
}

#[derive(Default)]
struct CardViewState {
    all: Vec<Card>,
    filtered: Vec<Card>,
    term: String,
}

impl CardViewState {
    fn refilter(&mut self) {
        self.filtered = filter_cards(&self.all, &self.term);
    }
}

fn render_cards(registry: &ViewRegistry, cards: &[Card], deleting: &PendingItems) {
    registry.update(|r| {
        let flipped = r.flipped_card_ids();
        let items = cards
            .iter()
            .map(|card| CardItem {
                flipped: flipped.contains(card.id.as_str()),
                deleting: deleting.contains(&card.id),
                card: card.clone(),
            })
            .collect();
        r.card.items = items;
        r.card.empty_message_visible = cards.is_empty();
    });
}

fn clear_card_form(r: &mut Regions) {
    r.card.new_front.clear();
    r.card.new_back.clear();
    r.card.new_front_image = None;
    r.card.new_back_image = None;
    r.card.add_modal_open = false;
}

type SharedState = Arc<Mutex<CardViewState>>;

fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut CardViewState) -> R) -> R {
    f(&mut state.lock().unwrap_or_else(PoisonError::into_inner))
}

/// 挂载卡片列表：订阅指定卡组的卡片，支持搜索、新建、删除，并可进入学习或画廊模式
pub fn mount(ctx: &AppContext, deck_id: &str, deck_name: &str, callbacks: CardCallbacks) -> Teardown {
    let scope = Scope::new(Screen::CardList, ctx.registry.clone());
    let state: SharedState = Arc::new(Mutex::new(CardViewState {
        term: ctx.registry.read(|r| r.card.search.clone()),
        ..Default::default()
    }));
    let deleting = PendingItems::default();

    ctx.registry.update(|r| {
        r.card.title = deck_name.to_string();
        r.card.items.clear();
        r.card.empty_message_visible = true;
    });

    match ctx.documents.subscribe(Card::query_for(deck_id)) {
        Ok(subscription) => {
            let (guard, mut snapshots) = subscription.into_parts();
            scope.hold(guard);

            let (ctx, state, deleting, task_scope, deck_id) = (
                ctx.clone(),
                state.clone(),
                deleting.clone(),
                scope.clone(),
                deck_id.to_string(),
            );
            scope.spawn(async move {
                while let Some(snapshot) = snapshots.next().await {
                    if !task_scope.is_live() {
                        break;
                    }
                    match snapshot {
                        Ok(docs) => {
                            let cards: Vec<Card> = docs
                                .iter()
                                .filter_map(|doc| match Card::from_document(&deck_id, doc) {
                                    Ok(card) => Some(card),
                                    Err(e) => {
                                        tracing::warn!("Skipping card: {}", e);
                                        None
                                    }
                                })
                                .collect();
                            let filtered = with_state(&state, |s| {
                                s.all = cards;
                                s.refilter();
                                s.filtered.clone()
                            });
                            render_cards(&ctx.registry, &filtered, &deleting);
                        }
                        Err(e) => {
                            tracing::error!("Error fetching cards: {}", e);
                            ctx.dialogs.notify("Failed to load cards.");
                        }
                    }
                }
            });
        }
        Err(e) => {
            tracing::error!("Error subscribing to cards of {}: {}", deck_id, e);
            ctx.dialogs.notify("Failed to load cards.");
        }
    }

    {
        let (registry, state, deleting) = (ctx.registry.clone(), state.clone(), deleting.clone());
        scope.bind(ElementId::CardSearch, move |event| {
            if let Event::Input(term) = event {
                let filtered = with_state(&state, |s| {
                    s.term = term.clone();
                    s.refilter();
                    s.filtered.clone()
                });
                render_cards(&registry, &filtered, &deleting);
            }
        });
    }

    {
        let registry = ctx.registry.clone();
        scope.bind(ElementId::AddCardFab, move |_| {
            registry.update(|r| r.card.add_modal_open = true);
        });
    }
    {
        let registry = ctx.registry.clone();
        scope.bind(ElementId::CancelAddCard, move |_| registry.update(clear_card_form));
    }

    {
        let (ctx, scope_ref, deck_id) = (ctx.clone(), Arc::downgrade(&scope), deck_id.to_string());
        scope.bind(ElementId::ConfirmAddCard, move |_| add_card(&ctx, &scope_ref, &deck_id));
    }

    {
        let (ctx, scope_ref, deck_id) = (ctx.clone(), Arc::downgrade(&scope), deck_id.to_string());
        let deleting = deleting.clone();
        scope.bind(ElementId::CardList, move |event| match event {
            Event::ClickItemDelete(card_id) => {
                delete_card(&ctx, &scope_ref, &deleting, &deck_id, card_id)
            }
            Event::ClickItem(card_id) => ctx.registry.update(|r| {
                if let Some(item) = r.card.items.iter_mut().find(|i| &i.card.id == card_id) {
                    item.flipped = !item.flipped;
                }
            }),
            _ => {}
        });
    }

    {
        let (ctx, state, on_study) = (ctx.clone(), state.clone(), callbacks.on_study);
        scope.bind(ElementId::StartSwipe, move |_| {
            let cards = with_state(&state, |s| s.filtered.clone());
            if cards.is_empty() {
                ctx.dialogs.notify("There are no cards to study.");
                return;
            }
            on_study(cards);
        });
    }

    {
        let (ctx, state, on_gallery) = (ctx.clone(), state.clone(), callbacks.on_gallery);
        scope.bind(ElementId::StartGallery, move |_| {
            let cards = with_state(&state, |s| s.filtered.clone());
            if cards.is_empty() {
                ctx.dialogs.notify("There are no cards to show.");
                return;
            }
            on_gallery(cards);
        });
    }

    Teardown::new(scope)
}

fn add_card(ctx: &AppContext, scope: &Weak<Scope>, deck_id: &str) {
    let draft = ctx.registry.read(|r| CardDraft {
        front_text: r.card.new_front.clone(),
        back_text: r.card.new_back.clone(),
        front_image: r.card.new_front_image.clone(),
        back_image: r.card.new_back_image.clone(),
    });
    if let Err(e) = draft.validate() {
        ctx.dialogs.notify(&e.notice());
        return;
    }

    let busy = BusyGuard::engage(ctx.registry.clone(), ElementId::ConfirmAddCard);
    let (ctx, scope, deck_id) = (ctx.clone(), scope.clone(), deck_id.to_string());
    tokio::spawn(async move {
        let _busy = busy;
        let result =
            Card::create(ctx.documents.as_ref(), ctx.objects.as_ref(), &deck_id, draft).await;
        let live = scope.upgrade().is_some_and(|s| s.is_live());
        match result {
            Ok(_) if live => ctx.registry.update(clear_card_form),
            Ok(card_id) => tracing::info!("Card {} added after its screen closed", card_id),
            Err(e) => {
                tracing::error!("Error adding card to {}: {}", deck_id, e);
                if live {
                    ctx.dialogs.notify(&format!("Failed to add the card. {}", e.notice()));
                }
            }
        }
    });
}

fn delete_card(
    ctx: &AppContext,
    scope: &Weak<Scope>,
    deleting: &PendingItems,
    deck_id: &str,
    card_id: &str,
) {
    let Some(busy) = ItemBusyGuard::engage(ctx.registry.clone(), ElementId::CardList, card_id, deleting)
    else {
        tracing::debug!("Delete of card {} already in progress", card_id);
        return;
    };
    if !ctx.dialogs.confirm("Delete this card?") {
        return;
    }

    let (ctx, scope, deck_id, card_id) =
        (ctx.clone(), scope.clone(), deck_id.to_string(), card_id.to_string());
    tokio::spawn(async move {
        let _busy = busy;
        if let Err(e) =
            Card::delete(ctx.documents.as_ref(), ctx.objects.as_ref(), &deck_id, &card_id).await
        {
            tracing::error!("Error deleting card {}: {}", card_id, e);
            if scope.upgrade().is_some_and(|s| s.is_live()) {
                ctx.dialogs.notify("Failed to delete the card.");
            }
        }
    });
}
