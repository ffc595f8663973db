mod handler;
mod model;

pub use handler::{CardCallbacks, OnCards, mount};
pub use model::{Card, CardDraft, filter_cards, has_front};
