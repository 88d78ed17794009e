//! Role lookups and the canonical role seeding.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::entities::role;
use crate::error::{Result, ServerError};
use crate::model::Permission;

pub const USER_ROLE: &str = "User";
pub const MODERATOR_ROLE: &str = "Moderator";
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// The canonical roles: name, permissions, default flag.
pub fn canonical_roles() -> [(&'static str, Permission, bool); 3] {
    let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE_ARTICLES;
    [
        (USER_ROLE, user, true),
        (MODERATOR_ROLE, user | Permission::MODERATE_COMMENTS, false),
        (ADMINISTRATOR_ROLE, Permission::ALL, false),
    ]
}

#[derive(Clone)]
pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create or overwrite the canonical roles. Safe to run on every start.
    pub async fn insert_roles(&self) -> Result<()> {
        let txn = self.db.begin().await?;

        for (name, permissions, is_default) in canonical_roles() {
            let existing = role::Entity::find()
                .filter(role::Column::Name.eq(name))
                .one(&txn)
                .await?;

            match existing {
                Some(found) => {
                    let mut active: role::ActiveModel = found.into();
                    active.permissions = Set(permissions.into());
                    active.is_default = Set(is_default);
                    active.update(&txn).await?;
                }
                None => {
                    role::ActiveModel {
                        name: Set(name.to_string()),
                        permissions: Set(permissions.into()),
                        is_default: Set(is_default),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    tracing::info!("Created role {}", name);
                }
            }
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<role::Model>> {
        Ok(role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<role::Model> {
        role::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("role {}", id)))
    }

    /// The role flagged as default for new accounts.
    pub async fn default_role(&self) -> Result<Option<role::Model>> {
        Ok(role::Entity::find()
            .filter(role::Column::IsDefault.eq(true))
            .order_by_asc(role::Column::Id)
            .one(&self.db)
            .await?)
    }

    /// The role holding the full permission set.
    pub async fn administrator_role(&self) -> Result<Option<role::Model>> {
        Ok(role::Entity::find()
            .filter(role::Column::Permissions.eq(i32::from(Permission::ALL)))
            .order_by_asc(role::Column::Id)
            .one(&self.db)
            .await?)
    }

    /// Admin edit of a role's name and bitmask.
    pub async fn update(&self, id: i32, name: &str, permissions: Permission) -> Result<role::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::InvalidRequest("Role name cannot be empty".to_string()));
        }

        let mut active: role::ActiveModel = self.get(id).await?.into();
        active.name = Set(name.to_string());
        active.permissions = Set(permissions.into());
        Ok(active.update(&self.db).await?)
    }
}
