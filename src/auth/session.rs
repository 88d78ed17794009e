//! Cookie sessions.
//!
//! A session token is 32 random bytes, URL-safe base64 encoded, handed to the
//! browser in the `session` cookie. Only its SHA-256 hash is persisted, so a
//! leaked database does not leak live sessions. Resolved sessions are cached
//! in memory until they expire or are revoked.

use std::collections::HashMap;
use std::time::Duration;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use parking_lot::RwLock;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};

use crate::db::entities::session;
use crate::error::Result;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

const TOKEN_BYTES: usize = 32;

#[derive(Clone, Copy, Debug)]
struct CachedSession {
    user_id: i32,
    expires_at: i64,
}

/// Issues, resolves and revokes login sessions.
pub struct SessionManager {
    db: DatabaseConnection,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedSession>>,
}

impl SessionManager {
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user_id`, returning the raw token for the cookie.
    pub async fn create(&self, user_id: i32) -> Result<String> {
        let token = generate_token();
        let token_hash = hash_token(&token);
        let now = crate::db::now();
        let expires_at = now + self.ttl.as_secs() as i64;

        session::ActiveModel {
            token_hash: Set(token_hash.clone()),
            user_id: Set(user_id),
            created_at: Set(now),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.cache
            .write()
            .insert(token_hash, CachedSession { user_id, expires_at });
        tracing::debug!("Session created for user {}", user_id);
        Ok(token)
    }

    /// The user a token belongs to, if the session exists and is live.
    pub async fn resolve(&self, token: &str) -> Result<Option<i32>> {
        let token_hash = hash_token(token);
        let now = crate::db::now();

        let cached = self.cache.read().get(&token_hash).copied();
        if let Some(cached) = cached {
            if cached.expires_at > now {
                return Ok(Some(cached.user_id));
            }
            self.revoke(token).await?;
            return Ok(None);
        }

        let stored = session::Entity::find()
            .filter(session::Column::TokenHash.eq(token_hash.as_str()))
            .one(&self.db)
            .await?;

        match stored {
            Some(s) if s.expires_at > now => {
                self.cache.write().insert(
                    token_hash,
                    CachedSession {
                        user_id: s.user_id,
                        expires_at: s.expires_at,
                    },
                );
                Ok(Some(s.user_id))
            }
            Some(_) => {
                self.revoke(token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Forget a session (logout).
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let token_hash = hash_token(token);
        self.cache.write().remove(&token_hash);
        session::Entity::delete_many()
            .filter(session::Column::TokenHash.eq(token_hash))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Drop every session of a user, e.g. when the account is deleted.
    pub async fn revoke_user(&self, user_id: i32) -> Result<()> {
        self.cache.write().retain(|_, s| s.user_id != user_id);
        session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Cleanup expired sessions
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now = crate::db::now();
        self.cache.write().retain(|_, s| s.expires_at > now);
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            tracing::info!("Removed {} expired sessions", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

/// Generate a secure random token
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extract the session token from a `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// `Set-Cookie` value that stores `token` for `ttl`.
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.as_secs()
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, NewUser, RoleRepository, UserRepository};

    async fn setup(ttl: Duration) -> (SessionManager, i32) {
        let db = connect_in_memory().await.unwrap();
        RoleRepository::new(db.clone()).insert_roles().await.unwrap();
        let user = UserRepository::new(db.clone(), None)
            .create(NewUser {
                fullname: "Sess".to_string(),
                email: "sess@example.com".to_string(),
                password: "secret".to_string(),
                role_id: None,
            })
            .await
            .unwrap();
        (SessionManager::new(db, ttl), user.id)
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(token_from_cookie_header("session=abc"), Some("abc"));
        assert_eq!(token_from_cookie_header("theme=dark; session=xyz; other=1"), Some("xyz"));
        assert_eq!(token_from_cookie_header("session="), None);
        assert_eq!(token_from_cookie_header("sessionx=abc"), None);
        assert!(session_cookie("t", Duration::from_secs(60)).contains("Max-Age=60"));
    }

    #[tokio::test]
    async fn test_create_resolve_revoke() {
        let (sessions, user_id) = setup(Duration::from_secs(3600)).await;

        let token = sessions.create(user_id).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), Some(user_id));
        assert_eq!(sessions.resolve("not-a-token").await.unwrap(), None);

        sessions.revoke(&token).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_survives_cache_loss() {
        let (sessions, user_id) = setup(Duration::from_secs(3600)).await;
        let token = sessions.create(user_id).await.unwrap();

        sessions.cache.write().clear();
        assert_eq!(sessions.resolve(&token).await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected_and_cleaned() {
        let (sessions, user_id) = setup(Duration::from_secs(0)).await;
        let token = sessions.create(user_id).await.unwrap();

        assert_eq!(sessions.resolve(&token).await.unwrap(), None);

        sessions.create(user_id).await.unwrap();
        assert_eq!(sessions.cleanup_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_user() {
        let (sessions, user_id) = setup(Duration::from_secs(3600)).await;
        let a = sessions.create(user_id).await.unwrap();
        let b = sessions.create(user_id).await.unwrap();

        sessions.revoke_user(user_id).await.unwrap();
        assert_eq!(sessions.resolve(&a).await.unwrap(), None);
        assert_eq!(sessions.resolve(&b).await.unwrap(), None);
    }
}
