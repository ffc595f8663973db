use std::collections::HashSet;

use super::{ElementId, ImageFile, Screen};
use crate::views::card::Card;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    pub disabled: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthRegion {
    pub mode: AuthMode,
    pub error: String,
    pub login_email: String,
    pub login_password: String,
    pub signup_email: String,
    pub signup_password: String,
    pub login_button: Control,
    pub signup_button: Control,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckItem {
    pub id: String,
    pub name: String,
    /// 删除进行中，删除按钮不可用
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckRegion {
    pub items: Vec<DeckItem>,
    pub empty_message_visible: bool,
    pub add_modal_open: bool,
    pub new_name: String,
    pub confirm: Control,
}

impl Default for DeckRegion {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            empty_message_visible: true,
            add_modal_open: false,
            new_name: String::new(),
            confirm: Control::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardItem {
    pub card: Card,
    pub flipped: bool,
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardRegion {
    pub title: String,
    pub items: Vec<CardItem>,
    pub empty_message_visible: bool,
    pub search: String,
    pub add_modal_open: bool,
    pub new_front: String,
    pub new_back: String,
    pub new_front_image: Option<ImageFile>,
    pub new_back_image: Option<ImageFile>,
    pub confirm: Control,
}

impl Default for CardRegion {
    fn default() -> Self {
        Self {
            title: String::new(),
            items: Vec::new(),
            empty_message_visible: true,
            search: String::new(),
            add_modal_open: false,
            new_front: String::new(),
            new_back: String::new(),
            new_front_image: None,
            new_back_image: None,
            confirm: Control::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub translate_x: f64,
    pub rotate_deg: f64,
    /// 是否带过渡动画
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwipeCardView {
    pub card: Card,
    pub flipped: bool,
    pub transform: Transform,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwipeRegion {
    pub progress_current: usize,
    pub progress_total: usize,
    pub active: Option<SwipeCardView>,
    pub completed: bool,
    pub forgot: Control,
    pub remembered: Control,
}

impl SwipeRegion {
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.progress_current, self.progress_total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryCell {
    pub card: Card,
    pub flipped: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayPhase {
    #[default]
    Hidden,
    Shown,
    Closing,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub phase: OverlayPhase,
    pub content: Option<Card>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryRegion {
    /// 缩放滑块的原始值
    pub zoom: String,
    pub columns: u8,
    pub cells: Vec<GalleryCell>,
    pub overlay: Overlay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Regions {
    pub active: Screen,
    pub viewport_width: f64,
    pub auth: AuthRegion,
    pub deck: DeckRegion,
    pub card: CardRegion,
    pub swipe: SwipeRegion,
    pub gallery: GalleryRegion,
}

impl Regions {
    pub fn new(viewport_width: f64, gallery_columns: u8) -> Self {
        Self {
            active: Screen::Auth,
            viewport_width,
            auth: AuthRegion::default(),
            deck: DeckRegion::default(),
            card: CardRegion::default(),
            swipe: SwipeRegion::default(),
            gallery: GalleryRegion {
                zoom: gallery_columns.to_string(),
                columns: gallery_columns,
                cells: Vec::new(),
                overlay: Overlay::default(),
            },
        }
    }

    pub fn control(&self, element: ElementId) -> Option<&Control> {
        match element {
            ElementId::LoginButton => Some(&self.auth.login_button),
            ElementId::SignupButton => Some(&self.auth.signup_button),
            ElementId::ConfirmAddDeck => Some(&self.deck.confirm),
            ElementId::ConfirmAddCard => Some(&self.card.confirm),
            ElementId::SwipeForgot => Some(&self.swipe.forgot),
            ElementId::SwipeRemembered => Some(&self.swipe.remembered),
            _ => None,
        }
    }

    pub fn control_mut(&mut self, element: ElementId) -> Option<&mut Control> {
        match element {
            ElementId::LoginButton => Some(&mut self.auth.login_button),
            ElementId::SignupButton => Some(&mut self.auth.signup_button),
            ElementId::ConfirmAddDeck => Some(&mut self.deck.confirm),
            ElementId::ConfirmAddCard => Some(&mut self.card.confirm),
            ElementId::SwipeForgot => Some(&mut self.swipe.forgot),
            ElementId::SwipeRemembered => Some(&mut self.swipe.remembered),
            _ => None,
        }
    }

    /// 文本输入框的当前值
    pub fn input_mut(&mut self, element: ElementId) -> Option<&mut String> {
        match element {
            ElementId::LoginEmail => Some(&mut self.auth.login_email),
            ElementId::LoginPassword => Some(&mut self.auth.login_password),
            ElementId::SignupEmail => Some(&mut self.auth.signup_email),
            ElementId::SignupPassword => Some(&mut self.auth.signup_password),
            ElementId::NewDeckName => Some(&mut self.deck.new_name),
            ElementId::CardSearch => Some(&mut self.card.search),
            ElementId::NewCardFront => Some(&mut self.card.new_front),
            ElementId::NewCardBack => Some(&mut self.card.new_back),
            ElementId::ZoomSlider => Some(&mut self.gallery.zoom),
            _ => None,
        }
    }

    pub fn file_mut(&mut self, element: ElementId) -> Option<&mut Option<ImageFile>> {
        match element {
            ElementId::NewCardFrontImage => Some(&mut self.card.new_front_image),
            ElementId::NewCardBackImage => Some(&mut self.card.new_back_image),
            _ => None,
        }
    }

    /// 列表中某一项的删除标记
    pub fn item_deleting_mut(&mut self, list: ElementId, id: &str) -> Option<&mut bool> {
        match list {
            ElementId::DeckList => self
                .deck
                .items
                .iter_mut()
                .find(|item| item.id == id)
                .map(|item| &mut item.deleting),
            ElementId::CardList => self
                .card
                .items
                .iter_mut()
                .find(|item| item.card.id == id)
                .map(|item| &mut item.deleting),
            _ => None,
        }
    }

    pub fn flipped_card_ids(&self) -> HashSet<&str> {
        self.card
            .items
            .iter()
            .filter(|item| item.flipped)
            .map(|item| item.card.id.as_str())
            .collect()
    }
}
