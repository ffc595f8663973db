mod common;

use common::{Harness, advance, settle};
use flashdeck::ui::{ElementId, Event, OverlayPhase, Screen};

async fn open_gallery(h: &Harness) -> Vec<String> {
    h.deck_with_cards(&[("uno", "one"), ("dos", "two"), ("tres", "three")])
        .await;
    h.click(ElementId::StartGallery);
    settle().await;
    assert_eq!(h.navigator.screen(), Screen::Gallery);
    h.registry()
        .read(|r| r.gallery.cells.iter().map(|c| c.card.id.clone()).collect())
}

fn press(h: &Harness, card_id: &str, x: f64) {
    h.registry().dispatch(
        ElementId::GalleryGrid,
        Event::PointerDown {
            x,
            item: Some(card_id.to_string()),
        },
    );
}

fn release(h: &Harness, x: f64) {
    h.registry()
        .dispatch(ElementId::GalleryGrid, Event::PointerUp { x });
}

fn flipped(h: &Harness, card_id: &str) -> bool {
    h.registry().read(|r| {
        r.gallery
            .cells
            .iter()
            .any(|c| c.card.id == card_id && c.flipped)
    })
}

#[tokio::test(start_paused = true)]
async fn gallery_shows_filtered_cards_with_zoom() {
    let h = Harness::new();
    h.deck_with_cards(&[("uno", "one"), ("dos", "two")]).await;
    h.input(ElementId::CardSearch, "dos");
    h.click(ElementId::StartGallery);
    settle().await;

    let regions = h.registry().snapshot();
    assert_eq!(regions.gallery.cells.len(), 1);
    assert_eq!(regions.gallery.columns, 3);

    h.input(ElementId::ZoomSlider, "5");
    assert_eq!(h.registry().read(|r| r.gallery.columns), 5);
    h.input(ElementId::ZoomSlider, "40");
    assert_eq!(h.registry().read(|r| r.gallery.columns), 6);
}

#[tokio::test(start_paused = true)]
async fn short_press_flips_in_place() {
    let h = Harness::new();
    let ids = open_gallery(&h).await;

    press(&h, &ids[1], 10.0);
    advance(200).await;
    release(&h, 11.0);
    assert!(flipped(&h, &ids[1]));
    assert!(!flipped(&h, &ids[0]));

    // 长按计时已被取消
    advance(1_000).await;
    assert_eq!(
        h.registry().read(|r| r.gallery.overlay.phase),
        OverlayPhase::Hidden
    );
}

#[tokio::test(start_paused = true)]
async fn long_press_opens_overlay_instead_of_flipping() {
    let h = Harness::new();
    let ids = open_gallery(&h).await;

    press(&h, &ids[0], 10.0);
    advance(510).await;
    let overlay = h.registry().read(|r| r.gallery.overlay.clone());
    assert_eq!(overlay.phase, OverlayPhase::Shown);
    assert_eq!(overlay.content.map(|c| c.id), Some(ids[0].clone()));

    release(&h, 10.0);
    assert!(!flipped(&h, &ids[0]));

    h.click(ElementId::GalleryOverlay);
    assert_eq!(
        h.registry().read(|r| r.gallery.overlay.phase),
        OverlayPhase::Closing
    );
    advance(310).await;
    let overlay = h.registry().read(|r| r.gallery.overlay.clone());
    assert_eq!(overlay.phase, OverlayPhase::Hidden);
    assert!(overlay.content.is_none());
}

#[tokio::test(start_paused = true)]
async fn moving_or_leaving_cancels_the_press() {
    let h = Harness::new();
    let ids = open_gallery(&h).await;

    press(&h, &ids[2], 10.0);
    h.registry()
        .dispatch(ElementId::GalleryGrid, Event::PointerMove { x: 40.0 });
    advance(600).await;
    release(&h, 40.0);
    assert!(!flipped(&h, &ids[2]));

    press(&h, &ids[2], 10.0);
    h.registry()
        .dispatch(ElementId::GalleryGrid, Event::PointerLeave);
    advance(600).await;

    assert_eq!(
        h.registry().read(|r| r.gallery.overlay.phase),
        OverlayPhase::Hidden
    );
    assert!(!flipped(&h, &ids[2]));
}

#[tokio::test(start_paused = true)]
async fn leaving_gallery_cancels_timers_and_clears_overlay() {
    let h = Harness::new();
    let ids = open_gallery(&h).await;

    press(&h, &ids[0], 10.0);
    h.click(ElementId::GalleryBack);
    advance(600).await;

    assert_eq!(h.navigator.screen(), Screen::CardList);
    let gallery = h.registry().read(|r| r.gallery.clone());
    assert_eq!(gallery.overlay.phase, OverlayPhase::Hidden);
    assert!(gallery.cells.is_empty());
    assert_eq!(h.registry().bindings_on(ElementId::GalleryGrid), 0);
}
