//! Fallback index: the questions table itself, queried with `LIKE`.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use super::{QuestionDocument, SearchIndex, SearchResult};
use crate::db::entities::question;

pub struct SqlSearchIndex {
    db: DatabaseConnection,
}

impl SqlSearchIndex {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Title hits weigh twice as much as description hits.
fn score(q: &question::Model, terms: &[String]) -> usize {
    let title = q.title.to_lowercase();
    let description = q.description.to_lowercase();
    terms
        .iter()
        .map(|t| {
            let mut s = 0;
            if title.contains(t.as_str()) {
                s += 2;
            }
            if description.contains(t.as_str()) {
                s += 1;
            }
            s
        })
        .sum()
}

#[async_trait]
impl SearchIndex for SqlSearchIndex {
    fn name(&self) -> &'static str {
        "sql"
    }

    // Writes land in the table already
    async fn index_question(&self, _doc: &QuestionDocument) -> SearchResult<()> {
        Ok(())
    }

    async fn remove_question(&self, _id: i32) -> SearchResult<()> {
        Ok(())
    }

    async fn rebuild(&self, _docs: &[QuestionDocument]) -> SearchResult<()> {
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<i32>> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // SQLite's LIKE only folds ASCII case, so a term with other letters
        // cannot narrow the scan; `score` does the Unicode-aware match.
        let mut select = question::Entity::find();
        if terms.iter().all(|t| t.is_ascii()) {
            let mut any_term = Condition::any();
            for term in &terms {
                any_term = any_term
                    .add(question::Column::Title.contains(term.as_str()))
                    .add(question::Column::Description.contains(term.as_str()));
            }
            select = select.filter(any_term);
        }
        let candidates = select.all(&self.db).await?;

        let mut ranked: Vec<(usize, i64, i32)> = candidates
            .iter()
            .map(|q| (score(q, &terms), q.created_at, q.id))
            .filter(|(s, _, _)| *s > 0)
            .collect();
        // Best score first, newest first on ties
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(b.2.cmp(&a.2)));

        Ok(ranked.into_iter().take(limit).map(|(_, _, id)| id).collect())
    }
}
