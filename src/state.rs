//! Shared application state handed to every handler.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::SessionManager;
use crate::config::AppConfig;
use crate::db::{QuestionRepository, RoleRepository, TopicRepository, UserRepository};
use crate::search::SearchIndex;

pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub search: Arc<dyn SearchIndex>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, search: Arc<dyn SearchIndex>) -> Self {
        let sessions = SessionManager::new(db.clone(), config.session_ttl);
        Self {
            db,
            config,
            search,
            sessions,
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db.clone(), self.config.admin_email.clone())
    }

    pub fn roles(&self) -> RoleRepository {
        RoleRepository::new(self.db.clone())
    }

    pub fn questions(&self) -> QuestionRepository {
        QuestionRepository::new(self.db.clone(), self.search.clone())
    }

    pub fn topics(&self) -> TopicRepository {
        TopicRepository::new(self.db.clone())
    }

    /// Seeded in-memory state for handler tests.
    #[cfg(test)]
    pub async fn for_tests(admin_email: Option<&str>) -> Arc<Self> {
        let db = crate::db::connect_in_memory().await.unwrap();
        let config = AppConfig {
            admin_email: admin_email.map(str::to_string),
            ..AppConfig::default()
        };
        let search: Arc<dyn SearchIndex> = Arc::new(crate::search::SqlSearchIndex::new(db.clone()));
        let state = Self::new(db, config, search);
        state.roles().insert_roles().await.unwrap();
        Arc::new(state)
    }
}
