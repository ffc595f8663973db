use std::sync::Arc;

use backend::{AuthProvider, DocumentStore, ObjectStore};
use config::Config;
use ui::{Dialogs, ViewRegistry};

pub mod backend;
pub mod config;
pub mod error;
pub mod navigator;
pub mod ui;
pub mod utils;
pub mod views;

/// 应用启动时构建、传给每个控制器的共享上下文
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub registry: Arc<ViewRegistry>,
    pub auth: Arc<dyn AuthProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub dialogs: Arc<dyn Dialogs>,
}

impl AppContext {
    pub fn new(
        config: Config,
        auth: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        let registry = Arc::new(ViewRegistry::new(
            config.viewport_width,
            config.gallery_default_columns,
        ));
        Self {
            config,
            registry,
            auth,
            documents,
            objects,
            dialogs,
        }
    }
}
