//! Topics and their question edges.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use super::entities::{question, topic, topic_question};
use crate::error::{Result, ServerError};

#[derive(Clone)]
pub struct TopicRepository {
    db: DatabaseConnection,
}

impl TopicRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<topic::Model>> {
        Ok(topic::Entity::find()
            .order_by_asc(topic::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<topic::Model> {
        topic::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("topic {}", id)))
    }

    /// Questions tagged with a topic, newest first.
    pub async fn questions(&self, topic_id: i32) -> Result<Vec<question::Model>> {
        let found = self.get(topic_id).await?;
        Ok(found
            .find_related(question::Entity)
            .order_by_desc(question::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn topics_for(&self, question_id: i32) -> Result<Vec<topic::Model>> {
        Ok(topic::Entity::find()
            .join(JoinType::InnerJoin, topic_question::Relation::Topic.def().rev())
            .filter(topic_question::Column::QuestionId.eq(question_id))
            .order_by_asc(topic::Column::Name)
            .all(&self.db)
            .await?)
    }
}

/// Topic with this exact name, created if missing.
pub(crate) async fn find_or_create<C: ConnectionTrait>(conn: &C, name: &str) -> Result<topic::Model> {
    // A concurrent insert of the same name is absorbed by the unique index
    topic::Entity::insert(topic::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    })
    .on_conflict(OnConflict::column(topic::Column::Name).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    topic::Entity::find()
        .filter(topic::Column::Name.eq(name))
        .one(conn)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("topic {}", name)))
}

/// Attach a topic to a question; attaching twice is a no-op.
pub(crate) async fn attach<C: ConnectionTrait>(conn: &C, topic_id: i32, question_id: i32) -> Result<()> {
    topic_question::Entity::insert(topic_question::ActiveModel {
        topic_id: Set(topic_id),
        question_id: Set(question_id),
    })
    .on_conflict(
        OnConflict::columns([topic_question::Column::TopicId, topic_question::Column::QuestionId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

/// Split a comma separated topic field into distinct, trimmed names.
pub fn parse_topic_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split([',', '，']).map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
