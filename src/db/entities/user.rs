//! User entity

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::auth::password;
use crate::error::{self, ServerError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub fullname: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string, never the plaintext
    pub password_hash: String,
    pub role_id: Option<i32>,
    pub created_at: i64,
}

impl Model {
    /// The plaintext password is never kept, so reading it always fails.
    pub fn password(&self) -> error::Result<String> {
        Err(ServerError::PasswordNotReadable)
    }

    /// Check a candidate password against the stored hash.
    ///
    /// A wrong password is `Ok(false)`; only a corrupt stored hash is an error.
    pub fn verify_password(&self, candidate: &str) -> error::Result<bool> {
        Ok(password::verify_password(candidate, &self.password_hash)?)
    }
}

impl ActiveModel {
    /// Hash and store a new password.
    pub fn set_password(&mut self, plaintext: &str) -> error::Result<()> {
        self.password_hash = Set(password::hash_password(plaintext)?);
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
