//! In-process implementations of the backend capabilities, used by the demo binary and tests.

mod auth;
mod documents;
mod objects;

pub use auth::MemoryAuth;
pub use documents::MemoryDocumentStore;
pub use objects::MemoryObjectStore;
