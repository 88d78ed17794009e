//! User accounts and the follow graph.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::entities::{answer, answer_comment, follow, question, question_comment, role, session, user};
use super::roles::RoleRepository;
use crate::error::{Result, ServerError};

/// Fields collected at signup (or by the admin bootstrap).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password: String,
    /// Explicit role; when `None` the role is picked from the email.
    pub role_id: Option<i32>,
}

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
    admin_email: Option<String>,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection, admin_email: Option<String>) -> Self {
        Self { db, admin_email }
    }

    /// Create an account. The role is decided here, once.
    pub async fn create(&self, new_user: NewUser) -> Result<user::Model> {
        let fullname = new_user.fullname.trim();
        let email = new_user.email.trim();
        if fullname.is_empty() || email.is_empty() {
            return Err(ServerError::InvalidRequest(
                "Full name and email are required".to_string(),
            ));
        }

        let role_id = match new_user.role_id {
            Some(id) => Some(id),
            None => self.initial_role(email).await?.map(|r| r.id),
        };

        let mut active = user::ActiveModel {
            fullname: Set(fullname.to_string()),
            email: Set(email.to_string()),
            role_id: Set(role_id),
            created_at: Set(super::now()),
            ..Default::default()
        };
        active.set_password(&new_user.password)?;

        let created = active.insert(&self.db).await?;
        tracing::info!("Created user {} ({})", created.fullname, created.id);
        Ok(created)
    }

    async fn initial_role(&self, email: &str) -> Result<Option<role::Model>> {
        let roles = RoleRepository::new(self.db.clone());
        if self.admin_email.as_deref() == Some(email) {
            if let Some(admin) = roles.administrator_role().await? {
                return Ok(Some(admin));
            }
        }
        roles.default_role().await
    }

    pub async fn find(&self, id: i32) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> Result<user::Model> {
        self.find(id)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("user {}", id)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email.trim()))
            .one(&self.db)
            .await?)
    }

    /// Look up by email and check the password. `None` on any mismatch.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<user::Model>> {
        match self.find_by_email(email).await? {
            Some(found) if found.verify_password(password)? => Ok(Some(found)),
            _ => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<user::Model>> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn role_of(&self, account: &user::Model) -> Result<Option<role::Model>> {
        Ok(account.find_related(role::Entity).one(&self.db).await?)
    }

    /// Admin edit of profile fields and role.
    pub async fn update(
        &self,
        id: i32,
        fullname: &str,
        email: &str,
        role_id: Option<i32>,
    ) -> Result<user::Model> {
        let fullname = fullname.trim();
        let email = email.trim();
        if fullname.is_empty() || email.is_empty() {
            return Err(ServerError::InvalidRequest(
                "Full name and email are required".to_string(),
            ));
        }
        if let Some(role_id) = role_id {
            RoleRepository::new(self.db.clone()).get(role_id).await?;
        }

        let mut active: user::ActiveModel = self.get(id).await?.into();
        active.fullname = Set(fullname.to_string());
        active.email = Set(email.to_string());
        active.role_id = Set(role_id);
        Ok(active.update(&self.db).await?)
    }

    /// Delete an account that has authored nothing.
    ///
    /// Accounts with questions, answers or comments are kept (`Conflict`).
    /// Follow edges in both directions and sessions go with the account.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let txn = self.db.begin().await?;

        let account = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("user {}", id)))?;

        let authored = question::Entity::find()
            .filter(question::Column::AuthorId.eq(id))
            .count(&txn)
            .await?
            + answer::Entity::find()
                .filter(answer::Column::AuthorId.eq(id))
                .count(&txn)
                .await?
            + question_comment::Entity::find()
                .filter(question_comment::Column::AuthorId.eq(id))
                .count(&txn)
                .await?
            + answer_comment::Entity::find()
                .filter(answer_comment::Column::AuthorId.eq(id))
                .count(&txn)
                .await?;
        if authored > 0 {
            return Err(ServerError::Conflict(format!(
                "{} has authored {} posts and cannot be deleted",
                account.fullname, authored
            )));
        }

        follow::Entity::delete_many()
            .filter(
                follow::Column::FollowerId
                    .eq(id)
                    .or(follow::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await?;
        session::Entity::delete_many()
            .filter(session::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        account.delete(&txn).await?;

        txn.commit().await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Make `follower` follow `followed`. A no-op if the edge exists.
    ///
    /// The insert itself is conditional on the composite key, so two racing
    /// calls leave exactly one edge.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        if follower_id == followed_id {
            return Err(ServerError::InvalidRequest("You cannot follow yourself".to_string()));
        }

        let edge = follow::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(super::now()),
        };
        let inserted = follow::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted > 0 {
            tracing::debug!("User {} now follows {}", follower_id, followed_id);
        }
        Ok(())
    }

    /// Remove the edge if present.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Does `follower` follow `followed`?
    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        Ok(follow::Entity::find_by_id((follower_id, followed_id))
            .one(&self.db)
            .await?
            .is_some())
    }

    /// Is `user` followed by `other`?
    pub async fn is_followed_by(&self, user_id: i32, other_id: i32) -> Result<bool> {
        self.is_following(other_id, user_id).await
    }

    pub async fn follower_count(&self, user_id: i32) -> Result<u64> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn followed_count(&self, user_id: i32) -> Result<u64> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    /// Users following `user_id`, most recent first.
    pub async fn followers(&self, user_id: i32) -> Result<Vec<user::Model>> {
        let edges = follow::Entity::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(&self.db)
            .await?;
        self.users_by_ids(edges.iter().map(|e| e.follower_id).collect()).await
    }

    /// Users `user_id` follows, most recent first.
    pub async fn followed(&self, user_id: i32) -> Result<Vec<user::Model>> {
        let edges = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(&self.db)
            .await?;
        self.users_by_ids(edges.iter().map(|e| e.followed_id).collect()).await
    }

    async fn users_by_ids(&self, ids: Vec<i32>) -> Result<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.clone()))
            .all(&self.db)
            .await?;
        // Keep the edge order
        Ok(ids
            .into_iter()
            .filter_map(|id| found.iter().find(|u| u.id == id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::db::roles::{ADMINISTRATOR_ROLE, USER_ROLE};
    use crate::model::Permission;

    const ADMIN_EMAIL: &str = "admin@example.com";

    async fn setup() -> UserRepository {
        let db = connect_in_memory().await.unwrap();
        RoleRepository::new(db.clone()).insert_roles().await.unwrap();
        UserRepository::new(db, Some(ADMIN_EMAIL.to_string()))
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            fullname: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password: "hunter22".to_string(),
            role_id: None,
        }
    }

    #[tokio::test]
    async fn test_new_user_gets_default_role() {
        let users = setup().await;
        let alice = users.create(new_user("Alice")).await.unwrap();

        let role = users.role_of(&alice).await.unwrap().unwrap();
        assert_eq!(role.name, USER_ROLE);
        assert!(role.is_default);
    }

    #[tokio::test]
    async fn test_admin_email_gets_full_permissions() {
        let users = setup().await;
        let admin = users
            .create(NewUser {
                fullname: "Root".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: "hunter22".to_string(),
                role_id: None,
            })
            .await
            .unwrap();

        let role = users.role_of(&admin).await.unwrap().unwrap();
        assert_eq!(role.name, ADMINISTRATOR_ROLE);
        assert_eq!(role.permission(), Permission::ALL);
        assert_eq!(role.permissions, 0xff);
    }

    #[tokio::test]
    async fn test_password_is_write_only() {
        let users = setup().await;
        let alice = users.create(new_user("Alice")).await.unwrap();

        assert!(matches!(alice.password(), Err(ServerError::PasswordNotReadable)));
        assert!(!alice.password_hash.contains("hunter22"));
        assert!(alice.verify_password("hunter22").unwrap());
        assert!(!alice.verify_password("").unwrap());
        assert!(!alice.verify_password("HUNTER22").unwrap());
        assert!(!alice.verify_password("Hunter22").unwrap());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let users = setup().await;
        users.create(new_user("Alice")).await.unwrap();

        assert!(users.authenticate("alice@example.com", "hunter22").await.unwrap().is_some());
        assert!(users.authenticate("alice@example.com", "wrong").await.unwrap().is_none());
        assert!(users.authenticate("nobody@example.com", "hunter22").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_or_fullname_is_conflict() {
        let users = setup().await;
        users.create(new_user("Alice")).await.unwrap();

        let mut same_email = new_user("Alicia");
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(users.create(same_email).await, Err(ServerError::Conflict(_))));

        let mut same_name = new_user("Alice");
        same_name.email = "other@example.com".to_string();
        assert!(matches!(users.create(same_name).await, Err(ServerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let users = setup().await;
        let a = users.create(new_user("Alice")).await.unwrap();
        let b = users.create(new_user("Bob")).await.unwrap();

        users.follow(a.id, b.id).await.unwrap();
        users.follow(a.id, b.id).await.unwrap();

        assert_eq!(users.followed_count(a.id).await.unwrap(), 1);
        assert_eq!(users.follower_count(b.id).await.unwrap(), 1);
        assert!(users.is_following(a.id, b.id).await.unwrap());
        assert!(users.is_followed_by(b.id, a.id).await.unwrap());
        assert!(!users.is_following(b.id, a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow() {
        let users = setup().await;
        let a = users.create(new_user("Alice")).await.unwrap();
        let b = users.create(new_user("Bob")).await.unwrap();

        // Nothing to remove yet
        users.unfollow(a.id, b.id).await.unwrap();
        assert_eq!(users.followed_count(a.id).await.unwrap(), 0);

        users.follow(a.id, b.id).await.unwrap();
        users.unfollow(a.id, b.id).await.unwrap();
        assert_eq!(users.followed_count(a.id).await.unwrap(), 0);
        assert!(!users.is_following(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let users = setup().await;
        let a = users.create(new_user("Alice")).await.unwrap();
        assert!(matches!(
            users.follow(a.id, a.id).await,
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_followers_and_followed_lists() {
        let users = setup().await;
        let a = users.create(new_user("Alice")).await.unwrap();
        let b = users.create(new_user("Bob")).await.unwrap();
        let c = users.create(new_user("Carol")).await.unwrap();

        users.follow(a.id, c.id).await.unwrap();
        users.follow(b.id, c.id).await.unwrap();

        let mut followers: Vec<String> =
            users.followers(c.id).await.unwrap().into_iter().map(|u| u.fullname).collect();
        followers.sort();
        assert_eq!(followers, vec!["Alice", "Bob"]);
        let followed: Vec<String> =
            users.followed(a.id).await.unwrap().into_iter().map(|u| u.fullname).collect();
        assert_eq!(followed, vec!["Carol"]);
    }

    #[tokio::test]
    async fn test_delete_removes_edges() {
        let users = setup().await;
        let a = users.create(new_user("Alice")).await.unwrap();
        let b = users.create(new_user("Bob")).await.unwrap();
        users.follow(a.id, b.id).await.unwrap();
        users.follow(b.id, a.id).await.unwrap();

        users.delete(a.id).await.unwrap();

        assert!(users.find(a.id).await.unwrap().is_none());
        assert_eq!(users.follower_count(b.id).await.unwrap(), 0);
        assert_eq!(users.followed_count(b.id).await.unwrap(), 0);
        assert!(matches!(users.delete(a.id).await, Err(ServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_update_changes_role() {
        let users = setup().await;
        let roles = RoleRepository::new(users.db.clone());
        let a = users.create(new_user("Alice")).await.unwrap();
        let admin_role = roles.administrator_role().await.unwrap().unwrap();

        let updated = users
            .update(a.id, "Alice B", "alice.b@example.com", Some(admin_role.id))
            .await
            .unwrap();
        assert_eq!(updated.fullname, "Alice B");
        assert_eq!(updated.role_id, Some(admin_role.id));

        assert!(matches!(
            users.update(a.id, "Alice B", "alice.b@example.com", Some(9999)).await,
            Err(ServerError::NotFound(_))
        ));
    }
}
