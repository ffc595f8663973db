mod handler;

pub use handler::mount;
