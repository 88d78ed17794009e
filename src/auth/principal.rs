//! The requester behind a web request.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum::response::{IntoResponse, Redirect, Response};

use super::session::token_from_cookie_header;
use crate::db::entities::{role, user};
use crate::error::{Result, ServerError};
use crate::model::{permission, Permission};
use crate::state::AppState;

/// A signed-in account with its role loaded.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: user::Model,
    pub role: Option<role::Model>,
    /// Raw session token, needed to log out
    pub token: String,
}

impl CurrentUser {
    pub fn permissions(&self) -> Option<Permission> {
        self.role.as_ref().map(role::Model::permission)
    }

    pub fn can(&self, requested: Permission) -> bool {
        permission::can(self.permissions(), requested)
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMINISTER)
    }

    /// `PermissionDenied` unless every bit of `requested` is granted.
    pub fn require(&self, requested: Permission) -> Result<()> {
        if self.can(requested) {
            Ok(())
        } else {
            tracing::debug!(
                "User {} denied {} (has {:?})",
                self.user.id,
                requested,
                self.permissions().map(|p| p.to_string())
            );
            Err(ServerError::PermissionDenied)
        }
    }
}

/// Either a signed-in user or the anonymous visitor.
///
/// Anonymous visitors hold no permissions at all.
#[derive(Clone, Debug)]
pub enum Principal {
    Authenticated(CurrentUser),
    Anonymous,
}

impl Principal {
    pub fn can(&self, requested: Permission) -> bool {
        match self {
            Principal::Authenticated(current) => current.can(requested),
            Principal::Anonymous => false,
        }
    }

    pub fn is_administrator(&self) -> bool {
        match self {
            Principal::Authenticated(current) => current.is_administrator(),
            Principal::Anonymous => false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }

    pub fn current(&self) -> Option<&CurrentUser> {
        match self {
            Principal::Authenticated(current) => Some(current),
            Principal::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&user::Model> {
        self.current().map(|c| &c.user)
    }

    /// Resolve the session cookie in `parts`, if any.
    pub async fn resolve(state: &AppState, parts: &Parts) -> Result<Self> {
        let token = match parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_cookie_header)
        {
            Some(token) => token.to_string(),
            None => return Ok(Principal::Anonymous),
        };

        let Some(user_id) = state.sessions.resolve(&token).await? else {
            return Ok(Principal::Anonymous);
        };

        let users = state.users();
        let Some(account) = users.find(user_id).await? else {
            // Account deleted underneath a live session
            state.sessions.revoke(&token).await?;
            return Ok(Principal::Anonymous);
        };
        let role = users.role_of(&account).await?;

        Ok(Principal::Authenticated(CurrentUser {
            user: account,
            role,
            token,
        }))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self> {
        Principal::resolve(state, parts).await
    }
}

/// Extractor for login-only routes.
///
/// Anonymous requests are redirected to the sign-in page with the original
/// path and query in `next`.
pub struct RequireUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Response> {
        match Principal::resolve(state, parts).await {
            Ok(Principal::Authenticated(current)) => Ok(RequireUser(current)),
            Ok(Principal::Anonymous) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&signin_redirect(next)).into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Sign-in URL that returns to `next` afterwards.
pub fn signin_redirect(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/signin?{}", query),
        Err(_) => "/signin".to_string(),
    }
}

/// `next` if it is a path on this site, so sign-in cannot bounce elsewhere.
pub fn local_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
