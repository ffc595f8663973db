//! Screen controllers. Each `mount` establishes its subscriptions and bindings and returns the
//! single `Teardown` that releases them.

pub mod auth;
pub mod card;
pub mod deck;
pub mod gallery;
pub mod swipe;
