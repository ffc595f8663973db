use std::sync::Arc;
use std::time::Duration;

use flashdeck::{
    AppContext,
    backend::memory::{MemoryAuth, MemoryDocumentStore, MemoryObjectStore},
    config::Config,
    navigator::Navigator,
    ui::{ElementId, Event, ScriptedDialogs, ViewRegistry},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 等待后台写入与快照推送
async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

fn input(registry: &ViewRegistry, element: ElementId, value: &str) {
    registry.dispatch(element, Event::Input(value.to_string()));
}

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();
    let step = Duration::from_millis(50);
    let animation = config.exit_animation() + step;

    // 进程内后端
    let ctx = AppContext::new(
        config.clone(),
        Arc::new(MemoryAuth::new(config.password_hash_cost)),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemoryObjectStore::new(&config.storage_bucket)),
        Arc::new(ScriptedDialogs::new(true)),
    );
    let registry = ctx.registry.clone();
    let navigator = Navigator::start(ctx);
    tracing::info!("Screen: {:?}", navigator.screen());

    // 注册并登录
    registry.dispatch(ElementId::ShowSignupTab, Event::Click);
    input(&registry, ElementId::SignupEmail, "learner@example.com");
    input(&registry, ElementId::SignupPassword, "correct horse");
    registry.dispatch(ElementId::SignupButton, Event::Click);
    settle(step).await;
    tracing::info!(
        "Screen: {:?}, decks: {}",
        navigator.screen(),
        registry.read(|r| r.deck.items.len())
    );

    // 新建卡组
    registry.dispatch(ElementId::AddDeckFab, Event::Click);
    input(&registry, ElementId::NewDeckName, "Spanish");
    registry.dispatch(ElementId::ConfirmAddDeck, Event::Click);
    settle(step).await;

    let Some(deck_id) = registry.read(|r| r.deck.items.first().map(|d| d.id.clone())) else {
        tracing::error!("Deck was not created");
        return;
    };
    registry.dispatch(ElementId::DeckList, Event::ClickItem(deck_id));
    settle(step).await;
    tracing::info!(
        "Screen: {:?}, title: {}",
        navigator.screen(),
        registry.read(|r| r.card.title.clone())
    );

    // 新建卡片
    registry.dispatch(ElementId::AddCardFab, Event::Click);
    input(&registry, ElementId::NewCardFront, "hola");
    input(&registry, ElementId::NewCardBack, "hello");
    registry.dispatch(ElementId::ConfirmAddCard, Event::Click);
    settle(step).await;
    tracing::info!("Cards: {}", registry.read(|r| r.card.items.len()));

    // 滑动学习：向右滑动一张
    registry.dispatch(ElementId::StartSwipe, Event::Click);
    settle(step).await;
    let width = registry.viewport_width();
    registry.dispatch(
        ElementId::SwipeCard,
        Event::PointerDown { x: 100.0, item: None },
    );
    registry.dispatch(ElementId::Document, Event::PointerMove { x: 100.0 + width / 3.0 });
    registry.dispatch(ElementId::Document, Event::PointerUp { x: 100.0 + width / 3.0 });
    settle(animation).await;

    let swipe = registry.read(|r| r.swipe.clone());
    tracing::info!(
        "Screen: {:?}, progress: {}, completed: {}, buttons disabled: {}",
        navigator.screen(),
        swipe.progress_label(),
        swipe.completed,
        swipe.forgot.disabled && swipe.remembered.disabled
    );

    navigator.shutdown();
}
