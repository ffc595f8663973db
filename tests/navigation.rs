mod common;

use common::{Harness, settle};
use flashdeck::ui::{ElementId, LifecycleEvent, Screen};

#[tokio::test(start_paused = true)]
async fn starts_on_auth_screen_and_signs_in_to_decks() {
    let h = Harness::new();
    assert_eq!(h.navigator.screen(), Screen::Auth);
    assert_eq!(h.documents.active_subscriptions(), 0);

    h.sign_up("learner@example.com").await;

    assert_eq!(h.navigator.screen(), Screen::DeckList);
    assert_eq!(
        h.navigator.user().map(|u| u.email),
        Some("learner@example.com".to_string())
    );
    assert_eq!(h.documents.active_subscriptions(), 1);
    assert!(h.registry().read(|r| r.deck.empty_message_visible));
}

#[tokio::test(start_paused = true)]
async fn toggling_deck_and_card_screens_keeps_one_subscription() {
    let h = Harness::new();
    h.sign_up("learner@example.com").await;
    let deck_id = h.create_deck("Spanish").await;

    for _ in 0..5 {
        h.open_deck(&deck_id).await;
        assert_eq!(h.navigator.screen(), Screen::CardList);
        assert_eq!(h.documents.active_subscriptions(), 1);

        h.click(ElementId::BackToDecks);
        settle().await;
        assert_eq!(h.navigator.screen(), Screen::DeckList);
        assert_eq!(h.documents.active_subscriptions(), 1);
    }

    // 重复挂载不会导致列表重复
    assert_eq!(h.registry().read(|r| r.deck.items.len()), 1);
    assert_eq!(h.registry().bindings_on(ElementId::DeckList), 1);
    assert_eq!(h.registry().bindings_on(ElementId::CardList), 0);
}

#[tokio::test(start_paused = true)]
async fn leaving_a_screen_tears_it_down_before_mounting_the_next() {
    let h = Harness::new();
    let deck_id = h.deck_with_cards(&[("hola", "hello")]).await;
    h.click(ElementId::BackToDecks);
    settle().await;
    h.registry().clear_journal();

    h.open_deck(&deck_id).await;
    h.click(ElementId::StartSwipe);
    settle().await;
    h.click(ElementId::SwipeBack);
    settle().await;
    h.click(ElementId::StartGallery);
    settle().await;
    h.click(ElementId::GalleryBack);
    settle().await;

    use LifecycleEvent::*;
    assert_eq!(
        h.registry().lifecycle_journal(),
        vec![
            TornDown(Screen::DeckList),
            Mounted(Screen::CardList),
            Shown(Screen::CardList),
            TornDown(Screen::CardList),
            Mounted(Screen::SwipeDrill),
            Shown(Screen::SwipeDrill),
            TornDown(Screen::SwipeDrill),
            Mounted(Screen::CardList),
            Shown(Screen::CardList),
            TornDown(Screen::CardList),
            Mounted(Screen::Gallery),
            Shown(Screen::Gallery),
            TornDown(Screen::Gallery),
            Mounted(Screen::CardList),
            Shown(Screen::CardList),
        ]
    );
    assert_eq!(h.documents.active_subscriptions(), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_from_any_screen_resets_to_auth() {
    let h = Harness::new();
    h.deck_with_cards(&[("hola", "hello")]).await;
    h.click(ElementId::StartSwipe);
    settle().await;
    assert_eq!(h.navigator.screen(), Screen::SwipeDrill);

    h.click(ElementId::LogoutButton);
    settle().await;

    assert_eq!(h.navigator.screen(), Screen::Auth);
    assert_eq!(h.navigator.user(), None);
    assert_eq!(h.documents.active_subscriptions(), 0);
    let regions = h.registry().snapshot();
    assert!(regions.deck.items.is_empty());
    assert!(regions.deck.empty_message_visible);
    assert!(regions.swipe.active.is_none());

    // 只剩外壳绑定：认证区域、退出按钮与三个返回按钮
    assert_eq!(h.registry().bindings_on(ElementId::SwipeCard), 0);
    assert_eq!(h.registry().bindings_on(ElementId::ConfirmAddDeck), 0);
    assert_eq!(h.registry().binding_count(), 8);
}

#[tokio::test(start_paused = true)]
async fn decks_are_private_to_their_owner() {
    let h = Harness::new();
    h.sign_up("first@example.com").await;
    h.create_deck("Mine").await;
    h.click(ElementId::LogoutButton);
    settle().await;

    h.sign_up("second@example.com").await;
    assert_eq!(h.navigator.screen(), Screen::DeckList);
    assert!(h.registry().read(|r| r.deck.items.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn failed_login_shows_friendly_error() {
    let h = Harness::new();
    h.sign_up("learner@example.com").await;
    h.click(ElementId::LogoutButton);
    settle().await;

    h.click(ElementId::ShowLoginTab);
    h.input(ElementId::LoginEmail, "learner@example.com");
    h.input(ElementId::LoginPassword, "wrong-pass");
    h.click(ElementId::LoginButton);
    settle().await;

    assert_eq!(h.navigator.screen(), Screen::Auth);
    let auth = h.registry().read(|r| r.auth.clone());
    assert_eq!(auth.error, "The password is incorrect.");
    assert!(!auth.login_button.disabled);

    h.input(ElementId::LoginPassword, "secret-pass");
    h.click(ElementId::LoginButton);
    settle().await;
    assert_eq!(h.navigator.screen(), Screen::DeckList);
    assert!(h.registry().read(|r| r.auth.error.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn weak_password_is_rejected_on_sign_up() {
    let h = Harness::new();
    h.click(ElementId::ShowSignupTab);
    h.input(ElementId::SignupEmail, "learner@example.com");
    h.input(ElementId::SignupPassword, "123");
    h.click(ElementId::SignupButton);
    settle().await;

    assert_eq!(h.navigator.screen(), Screen::Auth);
    assert_eq!(
        h.registry().read(|r| r.auth.error.clone()),
        "Password must be at least 6 characters."
    );

    h.click(ElementId::ShowLoginTab);
    assert!(h.registry().read(|r| r.auth.error.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn deleting_a_deck_asks_for_confirmation() {
    let h = Harness::new();
    h.sign_up("learner@example.com").await;
    let deck_id = h.create_deck("Spanish").await;

    h.dialogs.answer_with(false);
    h.registry().dispatch(
        ElementId::DeckList,
        flashdeck::ui::Event::ClickItemDelete(deck_id.clone()),
    );
    settle().await;
    assert_eq!(h.registry().read(|r| r.deck.items.len()), 1);

    h.dialogs.answer_with(true);
    h.registry().dispatch(
        ElementId::DeckList,
        flashdeck::ui::Event::ClickItemDelete(deck_id),
    );
    settle().await;
    assert!(h.registry().read(|r| r.deck.items.is_empty() && r.deck.empty_message_visible));
    assert_eq!(h.dialogs.confirmations().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn blank_deck_name_is_refused_without_write() {
    let h = Harness::new();
    h.sign_up("learner@example.com").await;

    h.click(ElementId::AddDeckFab);
    h.input(ElementId::NewDeckName, "   ");
    h.click(ElementId::ConfirmAddDeck);
    settle().await;

    assert_eq!(h.dialogs.notices(), vec!["Please enter a deck name.".to_string()]);
    assert!(h.registry().read(|r| r.deck.add_modal_open && r.deck.items.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn subscription_failure_is_reported_on_sign_in() {
    let h = Harness::new();
    h.documents
        .fail_subscriptions(Some(flashdeck::error::StoreError::PermissionDenied("rules".into())));

    h.sign_up("learner@example.com").await;

    assert_eq!(h.navigator.screen(), Screen::DeckList);
    assert_eq!(h.dialogs.notices(), vec!["Failed to load decks.".to_string()]);
    assert_eq!(h.documents.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn deck_delete_ignores_clicks_while_pending() {
    let h = Harness::new();
    h.sign_up("learner@example.com").await;
    let deck_id = h.create_deck("Spanish").await;
    h.documents.set_latency(std::time::Duration::from_millis(200));

    for _ in 0..2 {
        h.registry().dispatch(
            ElementId::DeckList,
            flashdeck::ui::Event::ClickItemDelete(deck_id.clone()),
        );
    }
    assert!(h.registry().read(|r| r.deck.items[0].deleting));
    assert_eq!(h.dialogs.confirmations().len(), 1);

    common::advance(300).await;
    assert!(h.registry().read(|r| r.deck.items.is_empty()));
    assert!(h.dialogs.notices().is_empty());
}
