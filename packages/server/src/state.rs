use std::sync::Arc;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::directory::Directory;
use crate::services::search::MessageSearcher;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub object_store: Arc<dyn ObjectStore>,
    pub directory: Arc<dyn Directory>,
    /// Chosen once at startup by [`crate::services::search::select_searcher`].
    pub searcher: Arc<dyn MessageSearcher>,
}
