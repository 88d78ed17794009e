//! Topic entity, a tag shared by many questions

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        super::topic_question::Relation::Question.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::topic_question::Relation::Topic.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
