//! Authentication route handlers for sign in, sign up, and logout.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use super::utils::{form_error, page_context, redirect_with_error, render_template};
use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::auth::principal::{local_next, signin_redirect};
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{Principal, RequireUser};
use crate::db::NewUser;
use crate::error::Result;
use crate::state::AppState;

/// Sign in form data
#[derive(serde::Deserialize)]
pub struct SigninForm {
    /// The account email
    pub account: String,
    pub password: String,
}

/// Sign up form data
#[derive(serde::Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub fullname: String,
    pub password: String,
}

/// Sign in page (GET)
pub async fn signin_page(
    principal: Principal,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if principal.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    let mut context = page_context(&principal, &query);
    if let Some(next) = local_next(query.get("next").map(String::as_str)) {
        context.insert("next", next);
    }
    render_template("signin.html", &context)
}

/// Sign in submit (POST)
pub async fn signin_submit(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<SigninForm>,
) -> Result<Response> {
    if principal.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let next = local_next(query.get("next").map(String::as_str));
    let Some(account) = state.users().authenticate(&form.account, &form.password).await? else {
        tracing::debug!("Failed sign in for {}", form.account);
        let back = match next {
            Some(next) => signin_redirect(next),
            None => "/signin".to_string(),
        };
        return Ok(redirect_with_error(&back, "Invalid email or password"));
    };

    let token = state.sessions.create(account.id).await?;
    tracing::info!("User {} signed in", account.id);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, next.unwrap_or("/").to_string()),
            (header::SET_COOKIE, session_cookie(&token, state.sessions.ttl())),
        ],
    )
        .into_response())
}

/// Sign up page (GET)
pub async fn signup_page(
    principal: Principal,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let context = page_context(&principal, &query);
    render_template("signup.html", &context)
}

/// Sign up submit (POST)
pub async fn signup_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Ok(redirect_with_error(
            "/signup",
            &format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    if !form.email.contains('@') {
        return Ok(redirect_with_error("/signup", "Please enter a valid email"));
    }

    let created = state
        .users()
        .create(NewUser {
            fullname: form.fullname,
            email: form.email,
            password: form.password,
            role_id: None,
        })
        .await;

    match created {
        Ok(_) => Ok(Redirect::to("/signin?message=Account+created%21+Please+sign+in.").into_response()),
        Err(e) => form_error("/signup", e),
    }
}

/// Logout (GET or POST)
pub async fn logout(State(state): State<Arc<AppState>>, RequireUser(current): RequireUser) -> Result<Response> {
    state.sessions.revoke(&current.token).await?;
    tracing::info!("User {} signed out", current.user.id);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie()),
        ],
    )
        .into_response())
}
