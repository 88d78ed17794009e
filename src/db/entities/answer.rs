//! Answer entity
//!
//! `content` is the raw Markdown the author wrote. The other three text
//! columns are derived from it and must only be written through
//! [`ActiveModel::set_content`], which keeps them in step.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::model::content::{self, DerivedContent};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub question_id: i32,
    pub author_id: i32,
    pub content: String,
    pub content_html: String,
    pub summary: String,
    pub summary_img_url: Option<String>,
    pub created_at: i64,
}

impl ActiveModel {
    /// Assign raw content and recompute every derived column from it.
    pub fn set_content(&mut self, raw: &str) -> DerivedContent {
        let derived = content::derive(raw);
        self.content = Set(raw.to_string());
        self.content_html = Set(derived.content_html.clone());
        self.summary = Set(derived.summary.clone());
        self.summary_img_url = Set(derived.summary_img_url.clone());
        derived
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::answer_comment::Entity")]
    Comments,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::answer_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
