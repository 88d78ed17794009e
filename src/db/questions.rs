//! Questions and everything that hangs off them: answers, comments, topics.
//!
//! Every write that touches more than one row runs in a transaction. The
//! search index is updated after the commit; an index failure is logged and
//! the database stays authoritative.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::entities::{answer, answer_comment, question, question_comment, topic_question};
use super::topics;
use crate::error::{Result, ServerError};
use crate::search::{QuestionDocument, SearchIndex};

/// Answers are posted through this so content derivation always happens.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: i32,
    pub author_id: i32,
    pub content: String,
}

#[derive(Clone)]
pub struct QuestionRepository {
    db: DatabaseConnection,
    search: Arc<dyn SearchIndex>,
}

impl QuestionRepository {
    pub fn new(db: DatabaseConnection, search: Arc<dyn SearchIndex>) -> Self {
        Self { db, search }
    }

    /// Create a question, tag it and index it.
    pub async fn create(
        &self,
        author_id: i32,
        title: &str,
        description: &str,
        topic_names: &[String],
    ) -> Result<question::Model> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServerError::InvalidRequest("Title cannot be empty".to_string()));
        }

        let txn = self.db.begin().await?;
        let created = question::ActiveModel {
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            author_id: Set(author_id),
            created_at: Set(super::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for name in topic_names {
            let found = topics::find_or_create(&txn, name).await?;
            topics::attach(&txn, found.id, created.id).await?;
        }
        txn.commit().await?;

        tracing::info!("Question {} created by user {}", created.id, author_id);
        self.sync_index(&created).await;
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<question::Model> {
        question::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("question {}", id)))
    }

    /// All questions, newest first.
    pub async fn list_recent(&self) -> Result<Vec<question::Model>> {
        Ok(question::Entity::find()
            .order_by_desc(question::Column::CreatedAt)
            .order_by_desc(question::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_by_author(&self, author_id: i32) -> Result<Vec<question::Model>> {
        Ok(question::Entity::find()
            .filter(question::Column::AuthorId.eq(author_id))
            .order_by_desc(question::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Fetch questions by id, keeping the order of `ids` (search ranking).
    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<question::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = question::Entity::find()
            .filter(question::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|q| q.id == *id).cloned())
            .collect())
    }

    pub async fn update(&self, id: i32, title: &str, description: &str) -> Result<question::Model> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServerError::InvalidRequest("Title cannot be empty".to_string()));
        }

        let mut active: question::ActiveModel = self.get(id).await?.into();
        active.title = Set(title.to_string());
        active.description = Set(description.to_string());
        let updated = active.update(&self.db).await?;

        self.sync_index(&updated).await;
        Ok(updated)
    }

    /// Delete a question with its answers, comments and topic edges.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let txn = self.db.begin().await?;

        let found = question::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("question {}", id)))?;

        let answer_ids: Vec<i32> = answer::Entity::find()
            .filter(answer::Column::QuestionId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        if !answer_ids.is_empty() {
            answer_comment::Entity::delete_many()
                .filter(answer_comment::Column::AnswerId.is_in(answer_ids))
                .exec(&txn)
                .await?;
        }
        answer::Entity::delete_many()
            .filter(answer::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
        question_comment::Entity::delete_many()
            .filter(question_comment::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
        topic_question::Entity::delete_many()
            .filter(topic_question::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
        found.delete(&txn).await?;

        txn.commit().await?;
        tracing::info!("Question {} deleted", id);

        if let Err(e) = self.search.remove_question(id).await {
            tracing::warn!("Failed to remove question {} from {} index: {}", id, self.search.name(), e);
        }
        Ok(())
    }

    /// Ranked questions matching a free-text query.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<question::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let ids = self
            .search
            .search(query, limit)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        self.get_many(&ids).await
    }

    /// Push every question to the index. Run at startup.
    pub async fn reindex_all(&self) -> Result<usize> {
        let docs: Vec<QuestionDocument> = question::Entity::find()
            .all(&self.db)
            .await?
            .iter()
            .map(QuestionDocument::from)
            .collect();
        self.search
            .rebuild(&docs)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(docs.len())
    }

    async fn sync_index(&self, q: &question::Model) {
        if let Err(e) = self.search.index_question(&QuestionDocument::from(q)).await {
            tracing::warn!("Failed to index question {} in {}: {}", q.id, self.search.name(), e);
        }
    }

    /// Post an answer; derived columns are computed from the content here.
    pub async fn add_answer(&self, new_answer: NewAnswer) -> Result<answer::Model> {
        if new_answer.content.trim().is_empty() {
            return Err(ServerError::InvalidRequest("Answer cannot be empty".to_string()));
        }
        self.get(new_answer.question_id).await?;

        let mut active = answer::ActiveModel {
            question_id: Set(new_answer.question_id),
            author_id: Set(new_answer.author_id),
            created_at: Set(super::now()),
            ..Default::default()
        };
        active.set_content(&new_answer.content);

        let created = active.insert(&self.db).await?;
        tracing::debug!("Answer {} posted to question {}", created.id, created.question_id);
        Ok(created)
    }

    /// Replace an answer's content and its derived columns together.
    pub async fn edit_answer(&self, id: i32, content: &str) -> Result<answer::Model> {
        if content.trim().is_empty() {
            return Err(ServerError::InvalidRequest("Answer cannot be empty".to_string()));
        }
        let mut active: answer::ActiveModel = self.get_answer(id).await?.into();
        active.set_content(content);
        Ok(active.update(&self.db).await?)
    }

    pub async fn get_answer(&self, id: i32) -> Result<answer::Model> {
        answer::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("answer {}", id)))
    }

    /// Answers to a question, oldest first.
    pub async fn answers(&self, question_id: i32) -> Result<Vec<answer::Model>> {
        Ok(answer::Entity::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .order_by_asc(answer::Column::CreatedAt)
            .order_by_asc(answer::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn answer_count(&self, question_id: i32) -> Result<u64> {
        Ok(answer::Entity::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .count(&self.db)
            .await?)
    }

    pub async fn answers_by_author(&self, author_id: i32) -> Result<Vec<answer::Model>> {
        Ok(answer::Entity::find()
            .filter(answer::Column::AuthorId.eq(author_id))
            .order_by_desc(answer::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Every answer, newest first (admin list).
    pub async fn list_answers(&self) -> Result<Vec<answer::Model>> {
        Ok(answer::Entity::find()
            .order_by_desc(answer::Column::CreatedAt)
            .order_by_desc(answer::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn add_question_comment(
        &self,
        question_id: i32,
        author_id: i32,
        content: &str,
    ) -> Result<question_comment::Model> {
        let content = non_empty_comment(content)?;
        self.get(question_id).await?;

        Ok(question_comment::ActiveModel {
            question_id: Set(question_id),
            author_id: Set(author_id),
            content: Set(content),
            created_at: Set(super::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    pub async fn add_answer_comment(
        &self,
        answer_id: i32,
        author_id: i32,
        content: &str,
    ) -> Result<answer_comment::Model> {
        let content = non_empty_comment(content)?;
        self.get_answer(answer_id).await?;

        Ok(answer_comment::ActiveModel {
            answer_id: Set(answer_id),
            author_id: Set(author_id),
            content: Set(content),
            created_at: Set(super::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    pub async fn question_comments(&self, question_id: i32) -> Result<Vec<question_comment::Model>> {
        Ok(question_comment::Entity::find()
            .filter(question_comment::Column::QuestionId.eq(question_id))
            .order_by_asc(question_comment::Column::CreatedAt)
            .order_by_asc(question_comment::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn answer_comments(&self, answer_id: i32) -> Result<Vec<answer_comment::Model>> {
        Ok(answer_comment::Entity::find()
            .filter(answer_comment::Column::AnswerId.eq(answer_id))
            .order_by_asc(answer_comment::Column::CreatedAt)
            .order_by_asc(answer_comment::Column::Id)
            .all(&self.db)
            .await?)
    }
}

fn non_empty_comment(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ServerError::InvalidRequest("Comment cannot be empty".to_string()));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, NewUser, RoleRepository, TopicRepository, UserRepository};
    use crate::search::{SearchResult, SqlSearchIndex};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records index calls so tests can check the index follows the table.
    #[derive(Default)]
    struct RecordingIndex {
        indexed: Mutex<Vec<QuestionDocument>>,
        removed: Mutex<Vec<i32>>,
    }

    #[async_trait]
    impl SearchIndex for RecordingIndex {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn index_question(&self, doc: &QuestionDocument) -> SearchResult<()> {
            self.indexed.lock().push(doc.clone());
            Ok(())
        }

        async fn remove_question(&self, id: i32) -> SearchResult<()> {
            self.removed.lock().push(id);
            Ok(())
        }

        async fn rebuild(&self, docs: &[QuestionDocument]) -> SearchResult<()> {
            *self.indexed.lock() = docs.to_vec();
            Ok(())
        }

        async fn search(&self, _query: &str, _limit: usize) -> SearchResult<Vec<i32>> {
            Ok(Vec::new())
        }
    }

    async fn setup(search: Arc<dyn SearchIndex>) -> (QuestionRepository, TopicRepository, i32) {
        let db = connect_in_memory().await.unwrap();
        RoleRepository::new(db.clone()).insert_roles().await.unwrap();
        let author = UserRepository::new(db.clone(), None)
            .create(NewUser {
                fullname: "Asker".to_string(),
                email: "asker@example.com".to_string(),
                password: "pw123456".to_string(),
                role_id: None,
            })
            .await
            .unwrap();
        (
            QuestionRepository::new(db.clone(), search),
            TopicRepository::new(db),
            author.id,
        )
    }

    #[tokio::test]
    async fn test_create_tags_and_indexes() {
        let index = Arc::new(RecordingIndex::default());
        let (questions, topics, author) = setup(index.clone()).await;

        let q = questions
            .create(author, "What is a borrow?", "Explain", &["rust".to_string(), "memory".to_string()])
            .await
            .unwrap();

        assert_eq!(index.indexed.lock().len(), 1);
        assert_eq!(index.indexed.lock()[0].title, "What is a borrow?");

        let names: Vec<String> = topics.topics_for(q.id).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["memory", "rust"]);

        let rust = topics.list().await.unwrap().into_iter().find(|t| t.name == "rust").unwrap();
        let tagged = topics.questions(rust.id).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, q.id);

        // Existing topic is reused
        questions.create(author, "Second", "", &["rust".to_string()]).await.unwrap();
        assert_eq!(topics.list().await.unwrap().len(), 2);
        assert_eq!(topics.questions(rust.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_question_is_not_found() {
        let (questions, _, _) = setup(Arc::new(RecordingIndex::default())).await;
        assert!(matches!(questions.get(42).await, Err(ServerError::NotFound(_))));
        assert!(matches!(questions.get_answer(42).await, Err(ServerError::NotFound(_))));
        assert!(matches!(
            questions
                .add_answer(NewAnswer { question_id: 42, author_id: 1, content: "hi".to_string() })
                .await,
            Err(ServerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let (questions, _, author) = setup(Arc::new(RecordingIndex::default())).await;
        assert!(matches!(
            questions.create(author, "   ", "body", &[]).await,
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_answer_derivation_persists() {
        let (questions, _, author) = setup(Arc::new(RecordingIndex::default())).await;
        let q = questions.create(author, "Cats?", "", &[]).await.unwrap();

        let content = "line 1\n![cat](/cat.png)\nline 3\nline 4\nline 5\nline 6";
        let posted = questions
            .add_answer(NewAnswer { question_id: q.id, author_id: author, content: content.to_string() })
            .await
            .unwrap();

        let stored = questions.get_answer(posted.id).await.unwrap();
        assert_eq!(stored.content, content);
        assert!(stored.content_html.contains("<img src=\"/cat.png\""));
        assert!(!stored.summary.contains("line 6"));
        assert_eq!(stored.summary_img_url.as_deref(), Some("/cat.png"));

        let edited = questions.edit_answer(posted.id, "plain text now").await.unwrap();
        assert_eq!(edited.summary_img_url, None);
        assert_eq!(edited.content_html, "<p>plain text now</p>\n");
        assert_eq!(questions.get_answer(posted.id).await.unwrap().summary_img_url, None);

        let err = questions.edit_answer(posted.id, "  \n").await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_answers_and_comments_in_order() {
        let (questions, _, author) = setup(Arc::new(RecordingIndex::default())).await;
        let q = questions.create(author, "Order?", "", &[]).await.unwrap();

        let first = questions
            .add_answer(NewAnswer { question_id: q.id, author_id: author, content: "first".to_string() })
            .await
            .unwrap();
        let second = questions
            .add_answer(NewAnswer { question_id: q.id, author_id: author, content: "second".to_string() })
            .await
            .unwrap();
        let ids: Vec<i32> = questions.answers(q.id).await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(questions.answer_count(q.id).await.unwrap(), 2);

        questions.add_question_comment(q.id, author, "nice question").await.unwrap();
        questions.add_answer_comment(first.id, author, "good answer").await.unwrap();
        assert_eq!(questions.question_comments(q.id).await.unwrap()[0].content, "nice question");
        assert_eq!(questions.answer_comments(first.id).await.unwrap()[0].content, "good answer");
        assert!(questions.answer_comments(second.id).await.unwrap().is_empty());

        assert!(matches!(
            questions.add_question_comment(q.id, author, "  ").await,
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_unindexes() {
        let index = Arc::new(RecordingIndex::default());
        let (questions, topics, author) = setup(index.clone()).await;
        let q = questions.create(author, "Doomed", "", &["tmp".to_string()]).await.unwrap();
        let a = questions
            .add_answer(NewAnswer { question_id: q.id, author_id: author, content: "x".to_string() })
            .await
            .unwrap();
        questions.add_answer_comment(a.id, author, "c").await.unwrap();
        questions.add_question_comment(q.id, author, "c").await.unwrap();

        questions.delete(q.id).await.unwrap();

        assert!(matches!(questions.get(q.id).await, Err(ServerError::NotFound(_))));
        assert!(matches!(questions.get_answer(a.id).await, Err(ServerError::NotFound(_))));
        assert!(topics.topics_for(q.id).await.unwrap().is_empty());
        assert_eq!(*index.removed.lock(), vec![q.id]);
    }

    #[tokio::test]
    async fn test_update_reindexes() {
        let index = Arc::new(RecordingIndex::default());
        let (questions, _, author) = setup(index.clone()).await;
        let q = questions.create(author, "Old", "", &[]).await.unwrap();

        questions.update(q.id, "New title", "new body").await.unwrap();

        let indexed = index.indexed.lock();
        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed[1].title, "New title");
    }

    #[tokio::test]
    async fn test_search_through_sql_index() {
        let db = connect_in_memory().await.unwrap();
        let search: Arc<dyn SearchIndex> = Arc::new(SqlSearchIndex::new(db.clone()));
        RoleRepository::new(db.clone()).insert_roles().await.unwrap();
        let author = UserRepository::new(db.clone(), None)
            .create(NewUser {
                fullname: "Asker".to_string(),
                email: "asker@example.com".to_string(),
                password: "pw123456".to_string(),
                role_id: None,
            })
            .await
            .unwrap();
        let questions = QuestionRepository::new(db, search);

        let q = questions.create(author.id, "Tokio runtime", "async", &[]).await.unwrap();
        questions.create(author.id, "Unrelated", "nothing", &[]).await.unwrap();

        let hits = questions.search("tokio", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, q.id);
        assert!(questions.search("", 10).await.unwrap().is_empty());
        assert_eq!(questions.reindex_all().await.unwrap(), 2);
    }
}
