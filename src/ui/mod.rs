//! Headless view layer: typed screen regions, event bindings and the scoped lifecycle every
//! controller mount returns.

mod dialogs;
mod regions;
mod registry;
mod scope;

pub use dialogs::{Dialogs, ScriptedDialogs};
pub use regions::{
    AuthMode, AuthRegion, CardItem, CardRegion, Control, DeckItem, DeckRegion, GalleryCell,
    GalleryRegion, Overlay, OverlayPhase, Regions, SwipeCardView, SwipeRegion, Transform,
};
pub use registry::{BindingId, Handler, LifecycleEvent, ViewRegistry};
pub use scope::{BusyGuard, ItemBusyGuard, PendingItems, Scope, Teardown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Auth,
    DeckList,
    CardList,
    SwipeDrill,
    Gallery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    // 认证
    ShowLoginTab,
    ShowSignupTab,
    LoginEmail,
    LoginPassword,
    LoginButton,
    SignupEmail,
    SignupPassword,
    SignupButton,
    // 卡组列表
    LogoutButton,
    DeckList,
    AddDeckFab,
    NewDeckName,
    ConfirmAddDeck,
    CancelAddDeck,
    // 卡片列表
    BackToDecks,
    CardSearch,
    CardList,
    StartSwipe,
    StartGallery,
    AddCardFab,
    NewCardFront,
    NewCardBack,
    NewCardFrontImage,
    NewCardBackImage,
    ConfirmAddCard,
    CancelAddCard,
    // 滑动学习
    SwipeBack,
    SwipeCard,
    SwipeForgot,
    SwipeRemembered,
    // 画廊
    GalleryBack,
    ZoomSlider,
    GalleryGrid,
    GalleryOverlay,
    // 全局指针事件
    Document,
}

impl ElementId {
    pub fn screen(self) -> Option<Screen> {
        use ElementId::*;
        match self {
            ShowLoginTab | ShowSignupTab | LoginEmail | LoginPassword | LoginButton
            | SignupEmail | SignupPassword | SignupButton => Some(Screen::Auth),
            LogoutButton | DeckList | AddDeckFab | NewDeckName | ConfirmAddDeck
            | CancelAddDeck => Some(Screen::DeckList),
            BackToDecks | CardSearch | CardList | StartSwipe | StartGallery | AddCardFab
            | NewCardFront | NewCardBack | NewCardFrontImage | NewCardBackImage
            | ConfirmAddCard | CancelAddCard => Some(Screen::CardList),
            SwipeBack | SwipeCard | SwipeForgot | SwipeRemembered => Some(Screen::SwipeDrill),
            GalleryBack | ZoomSlider | GalleryGrid | GalleryOverlay => Some(Screen::Gallery),
            Document => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click,
    /// 列表内某一项被点击
    ClickItem(String),
    /// 列表项上的删除按钮被点击
    ClickItemDelete(String),
    Input(String),
    FileChosen(Option<ImageFile>),
    PointerDown { x: f64, item: Option<String> },
    PointerMove { x: f64 },
    PointerUp { x: f64 },
    PointerLeave,
}
