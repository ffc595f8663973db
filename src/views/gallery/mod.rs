mod handler;

pub use handler::{mount, zoom_to_columns};
