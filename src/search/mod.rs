//! Full-text search over questions.
//!
//! The index is an external collaborator behind [`SearchIndex`]:
//! - Meilisearch when `MEILI_URL` is configured (language-aware tokenizer,
//!   segments Chinese text)
//! - a plain SQL `LIKE` query over the questions table otherwise
//!
//! Question writes go to the database first; the index follows after commit.

mod meili;
mod sql;

pub use meili::MeiliSearchIndex;
pub use sql::SqlSearchIndex;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::entities::question;

/// Search error types
#[derive(Debug)]
pub enum SearchError {
    /// The search engine rejected or failed the request
    Engine(String),
    /// Reading questions back from the database failed
    Database(sea_orm::DbErr),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Engine(msg) => write!(f, "Search engine error: {}", msg),
            SearchError::Database(e) => write!(f, "Search database error: {}", e),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<sea_orm::DbErr> for SearchError {
    fn from(e: sea_orm::DbErr) -> Self {
        SearchError::Database(e)
    }
}

impl From<meilisearch_sdk::errors::Error> for SearchError {
    fn from(e: meilisearch_sdk::errors::Error) -> Self {
        SearchError::Engine(e.to_string())
    }
}

pub type SearchResult<T> = Result<T, SearchError>;

/// The searchable projection of a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDocument {
    pub id: i32,
    pub title: String,
    pub description: String,
}

impl From<&question::Model> for QuestionDocument {
    fn from(q: &question::Model) -> Self {
        Self {
            id: q.id,
            title: q.title.clone(),
            description: q.description.clone(),
        }
    }
}

/// Pluggable question index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Add or replace a question
    async fn index_question(&self, doc: &QuestionDocument) -> SearchResult<()>;

    /// Drop a question from the index
    async fn remove_question(&self, id: i32) -> SearchResult<()>;

    /// Replace the whole index content
    async fn rebuild(&self, docs: &[QuestionDocument]) -> SearchResult<()>;

    /// Ranked question ids matching a free-text query, at most `limit`
    async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<i32>>;
}

/// Pick the index from configuration.
pub fn build(config: &AppConfig, db: DatabaseConnection) -> Arc<dyn SearchIndex> {
    if let Some(url) = &config.meili_url {
        match MeiliSearchIndex::new(url, config.meili_api_key.as_deref()) {
            Ok(index) => {
                tracing::info!("Using Meilisearch at {}", url);
                return Arc::new(index);
            }
            Err(e) => {
                tracing::warn!("Meilisearch unavailable ({}), falling back to SQL search", e);
            }
        }
    }
    Arc::new(SqlSearchIndex::new(db))
}
