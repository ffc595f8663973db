mod handler;
mod model;

pub use handler::{OnSelect, mount};
pub use model::Deck;
