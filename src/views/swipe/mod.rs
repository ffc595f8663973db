mod gesture;
mod handler;
mod model;

pub use gesture::{
    DragPhase, Release, SwipeDirection, classify_release, drag_transform, exit_transform,
};
pub use handler::mount;
pub use model::{StudyLogEntry, StudyResult};
