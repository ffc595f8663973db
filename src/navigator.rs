use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinHandle;

use crate::AppContext;
use crate::backend::User;
use crate::ui::{BindingId, ElementId, Screen, Teardown};
use crate::views::card::{Card, CardCallbacks};
use crate::views::{auth, card, deck, gallery, swipe};

#[derive(Default)]
struct NavState {
    user: Option<User>,
    /// 当前打开的卡组 (id, 名称)
    deck: Option<(String, String)>,
    shell: Option<Teardown>,
    shell_bindings: Vec<BindingId>,
    auth_listener: Option<JoinHandle<()>>,
    deck_view: Option<Teardown>,
    card_view: Option<Teardown>,
    swipe_view: Option<Teardown>,
    gallery_view: Option<Teardown>,
}

impl NavState {
    /// 按从深到浅的顺序释放所有下游屏幕
    fn dispose_views(&mut self) {
        for view in [
            self.gallery_view.take(),
            self.swipe_view.take(),
            self.card_view.take(),
            self.deck_view.take(),
        ]
        .into_iter()
        .flatten()
        {
            view.dispose();
        }
    }
}

/// 顶层导航：每次切换都先释放离开的屏幕，再挂载新屏幕，最后显示
pub struct Navigator {
    ctx: AppContext,
    me: Weak<Navigator>,
    state: Mutex<NavState>,
}

impl Navigator {
    pub fn start(ctx: AppContext) -> Arc<Self> {
        let navigator = Arc::new_cyclic(|me| Navigator {
            ctx,
            me: me.clone(),
            state: Mutex::new(NavState::default()),
        });
        navigator.mount_shell();
        navigator
    }

    fn state(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mount_shell(&self) {
        let shell = auth::mount(&self.ctx);

        let back_edges: [(ElementId, fn(&Navigator)); 3] = [
            (ElementId::BackToDecks, Navigator::back_to_decks),
            (ElementId::SwipeBack, Navigator::back_to_cards),
            (ElementId::GalleryBack, Navigator::back_to_cards),
        ];
        let mut bindings = Vec::new();
        for (element, action) in back_edges {
            let me = self.me.clone();
            bindings.push(self.ctx.registry.bind(element, move |_| {
                if let Some(navigator) = me.upgrade() {
                    action(&navigator);
                }
            }));
        }

        let mut auth_state = self.ctx.auth.auth_state();
        let current = auth_state.borrow_and_update().clone();
        self.apply_auth(current);

        let me = self.me.clone();
        let listener = tokio::spawn(async move {
            while auth_state.changed().await.is_ok() {
                let user = auth_state.borrow_and_update().clone();
                let Some(navigator) = me.upgrade() else {
                    break;
                };
                navigator.apply_auth(user);
            }
        });

        let mut state = self.state();
        state.shell = Some(shell);
        state.shell_bindings = bindings;
        state.auth_listener = Some(listener);
    }

    pub fn screen(&self) -> Screen {
        self.ctx.registry.active_screen()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn apply_auth(&self, user: Option<User>) {
        match user {
            Some(user) => self.handle_login(user),
            None => self.handle_logout(),
        }
    }

    fn handle_login(&self, user: User) {
        let mut state = self.state();
        if state.user.as_ref().is_some_and(|u| u.id == user.id) {
            return;
        }
        tracing::info!("User {} signed in", user.id);

        state.dispose_views();
        state.deck = None;
        state.deck_view = Some(self.mount_decks(&user.id));
        state.user = Some(user);
        self.ctx.registry.show_screen(Screen::DeckList);
    }

    fn handle_logout(&self) {
        let mut state = self.state();
        if let Some(user) = state.user.take() {
            tracing::info!("User {} signed out", user.id);
        }
        state.dispose_views();
        state.deck = None;

        self.ctx.registry.update(|r| {
            r.deck.items.clear();
            r.deck.empty_message_visible = true;
            r.deck.add_modal_open = false;
            r.deck.new_name.clear();
        });
        self.ctx.registry.show_screen(Screen::Auth);
    }

    fn mount_decks(&self, user_id: &str) -> Teardown {
        let me = self.me.clone();
        deck::mount(
            &self.ctx,
            user_id,
            Arc::new(move |deck_id: &str, deck_name: &str| {
                if let Some(navigator) = me.upgrade() {
                    navigator.open_deck(deck_id, deck_name);
                }
            }),
        )
    }

    fn mount_cards(&self, deck_id: &str, deck_name: &str) -> Teardown {
        let (study, browse) = (self.me.clone(), self.me.clone());
        let callbacks = CardCallbacks {
            on_study: Arc::new(move |cards: Vec<Card>| {
                if let Some(navigator) = study.upgrade() {
                    navigator.start_drill(cards);
                }
            }),
            on_gallery: Arc::new(move |cards: Vec<Card>| {
                if let Some(navigator) = browse.upgrade() {
                    navigator.start_gallery(cards);
                }
            }),
        };
        card::mount(&self.ctx, deck_id, deck_name, callbacks)
    }

    pub fn open_deck(&self, deck_id: &str, deck_name: &str) {
        let mut state = self.state();
        if state.user.is_none() {
            tracing::warn!("Ignoring deck {} without a signed-in user", deck_id);
            return;
        }
        tracing::info!("Opening deck {}", deck_id);

        if let Some(view) = state.deck_view.take() {
            view.dispose();
        }
        if let Some(view) = state.card_view.take() {
            view.dispose();
        }
        self.ctx.registry.update(|r| r.card.search.clear());
        state.card_view = Some(self.mount_cards(deck_id, deck_name));
        state.deck = Some((deck_id.to_string(), deck_name.to_string()));
        self.ctx.registry.show_screen(Screen::CardList);
    }

    pub fn back_to_decks(&self) {
        let mut state = self.state();
        let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        if state.deck_view.is_some() {
            return;
        }

        state.dispose_views();
        state.deck = None;
        state.deck_view = Some(self.mount_decks(&user_id));
        self.ctx.registry.show_screen(Screen::DeckList);
    }

    pub fn start_drill(&self, cards: Vec<Card>) {
        let mut state = self.state();
        let (Some(user_id), Some((deck_id, _))) =
            (state.user.as_ref().map(|u| u.id.clone()), state.deck.clone())
        else {
            return;
        };

        if let Some(view) = state.card_view.take() {
            view.dispose();
        }
        state.swipe_view = Some(swipe::mount(&self.ctx, &deck_id, &user_id, cards));
        self.ctx.registry.show_screen(Screen::SwipeDrill);
    }

    pub fn start_gallery(&self, cards: Vec<Card>) {
        let mut state = self.state();
        if state.deck.is_none() {
            return;
        }

        if let Some(view) = state.card_view.take() {
            view.dispose();
        }
        state.gallery_view = Some(gallery::mount(&self.ctx, cards));
        self.ctx.registry.show_screen(Screen::Gallery);
    }

    pub fn back_to_cards(&self) {
        let mut state = self.state();
        let Some((deck_id, deck_name)) = state.deck.clone() else {
            return;
        };
        if state.swipe_view.is_none() && state.gallery_view.is_none() {
            return;
        }

        for view in [state.swipe_view.take(), state.gallery_view.take()]
            .into_iter()
            .flatten()
        {
            view.dispose();
        }
        state.card_view = Some(self.mount_cards(&deck_id, &deck_name));
        self.ctx.registry.show_screen(Screen::CardList);
    }

    /// 释放全部屏幕与外壳绑定
    pub fn shutdown(&self) {
        let mut state = self.state();
        state.dispose_views();
        for id in std::mem::take(&mut state.shell_bindings) {
            self.ctx.registry.unbind(id);
        }
        if let Some(listener) = state.auth_listener.take() {
            listener.abort();
        }
        if let Some(shell) = state.shell.take() {
            shell.dispose();
        }
        tracing::info!("Navigator shut down");
    }
}
