#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use flashdeck::AppContext;
use flashdeck::backend::memory::{MemoryAuth, MemoryDocumentStore, MemoryObjectStore};
use flashdeck::config::Config;
use flashdeck::navigator::Navigator;
use flashdeck::ui::{ElementId, Event, ScriptedDialogs, ViewRegistry};

pub struct Harness {
    pub ctx: AppContext,
    pub auth: Arc<MemoryAuth>,
    pub documents: MemoryDocumentStore,
    pub objects: Arc<MemoryObjectStore>,
    pub dialogs: Arc<ScriptedDialogs>,
    pub navigator: Arc<Navigator>,
}

pub fn test_config() -> Config {
    Config {
        password_hash_cost: 4,
        storage_bucket: "test".to_string(),
        ..Config::default()
    }
}

/// 让后台任务与快照推送跑完；在暂停时钟下几乎不耗时
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

impl Harness {
    pub fn new() -> Self {
        let config = test_config();
        let auth = Arc::new(MemoryAuth::new(config.password_hash_cost));
        let documents = MemoryDocumentStore::new();
        let objects = Arc::new(MemoryObjectStore::new(&config.storage_bucket));
        let dialogs = Arc::new(ScriptedDialogs::new(true));

        let ctx = AppContext::new(
            config,
            auth.clone(),
            Arc::new(documents.clone()),
            objects.clone(),
            dialogs.clone(),
        );
        let navigator = Navigator::start(ctx.clone());

        Self {
            ctx,
            auth,
            documents,
            objects,
            dialogs,
            navigator,
        }
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.ctx.registry
    }

    pub fn click(&self, element: ElementId) {
        self.registry().dispatch(element, Event::Click);
    }

    pub fn input(&self, element: ElementId, value: &str) {
        self.registry()
            .dispatch(element, Event::Input(value.to_string()));
    }

    pub async fn sign_up(&self, email: &str) {
        self.click(ElementId::ShowSignupTab);
        self.input(ElementId::SignupEmail, email);
        self.input(ElementId::SignupPassword, "secret-pass");
        self.click(ElementId::SignupButton);
        settle().await;
    }

    pub async fn create_deck(&self, name: &str) -> String {
        self.click(ElementId::AddDeckFab);
        self.input(ElementId::NewDeckName, name);
        self.click(ElementId::ConfirmAddDeck);
        settle().await;
        self.registry()
            .read(|r| r.deck.items.iter().find(|d| d.name == name).map(|d| d.id.clone()))
            .expect("deck should be listed")
    }

    pub async fn open_deck(&self, deck_id: &str) {
        self.registry()
            .dispatch(ElementId::DeckList, Event::ClickItem(deck_id.to_string()));
        settle().await;
    }

    pub async fn add_card(&self, front: &str, back: &str) {
        self.click(ElementId::AddCardFab);
        self.input(ElementId::NewCardFront, front);
        self.input(ElementId::NewCardBack, back);
        self.click(ElementId::ConfirmAddCard);
        settle().await;
    }

    /// 登录并打开一个含若干卡片的卡组，返回卡组 id
    pub async fn deck_with_cards(&self, cards: &[(&str, &str)]) -> String {
        self.sign_up("learner@example.com").await;
        let deck_id = self.create_deck("Spanish").await;
        self.open_deck(&deck_id).await;
        for (front, back) in cards {
            self.add_card(front, back).await;
        }
        deck_id
    }

    pub fn swipe(&self, from: f64, to: f64) {
        let registry = self.registry();
        registry.dispatch(
            ElementId::SwipeCard,
            Event::PointerDown {
                x: from,
                item: None,
            },
        );
        registry.dispatch(ElementId::Document, Event::PointerMove { x: to });
        registry.dispatch(ElementId::Document, Event::PointerUp { x: to });
    }

    pub fn active_front(&self) -> Option<String> {
        self.registry()
            .read(|r| r.swipe.active.as_ref().and_then(|a| a.card.front_text.clone()))
    }
}
