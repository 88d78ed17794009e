//! User profiles and following.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use super::utils::{
    answer_preview, form_error, format_relative_time, page_context, render_template,
    AuthorCache, IdPath, ProfileView,
};
use crate::auth::{Principal, RequireUser};
use crate::db::entities::user;
use crate::error::Result;
use crate::model::Permission;
use crate::state::AppState;

#[derive(Serialize)]
struct AskedQuestion {
    id: i32,
    title: String,
    created: String,
}

#[derive(Serialize)]
struct Person {
    id: i32,
    fullname: String,
}

fn people(accounts: Vec<user::Model>) -> Vec<Person> {
    accounts
        .into_iter()
        .map(|u| Person {
            id: u.id,
            fullname: u.fullname,
        })
        .collect()
}

/// Profile page
pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let users = state.users();
    let account = users.get(id).await?;
    let role = users.role_of(&account).await?;

    let mut context = page_context(&principal, &query);
    context.insert("profile", &ProfileView::new(&account, role.map(|r| r.name)));
    context.insert("follower_count", &users.follower_count(id).await?);
    context.insert("followed_count", &users.followed_count(id).await?);
    context.insert("followers", &people(users.followers(id).await?));
    context.insert("following", &people(users.followed(id).await?));

    let (is_following, follows_you) = match principal.user() {
        Some(me) if me.id != id => (
            users.is_following(me.id, id).await?,
            users.is_followed_by(me.id, id).await?,
        ),
        _ => (false, false),
    };
    let is_self = principal.user().is_some_and(|me| me.id == id);
    context.insert("is_following", &is_following);
    context.insert("follows_you", &follows_you);
    context.insert("can_follow", &(!is_self && principal.can(Permission::FOLLOW)));

    let repo = state.questions();
    let questions: Vec<AskedQuestion> = repo
        .list_by_author(id)
        .await?
        .into_iter()
        .map(|q| AskedQuestion {
            id: q.id,
            title: q.title,
            created: format_relative_time(q.created_at),
        })
        .collect();
    context.insert("questions", &questions);

    let mut authors = AuthorCache::new(&state);
    let mut answers = Vec::new();
    for a in repo.answers_by_author(id).await? {
        let q = repo.get(a.question_id).await?;
        answers.push(answer_preview(&mut authors, &a, &q).await?);
    }
    context.insert("answers", &answers);

    Ok(render_template("user.html", &context))
}

/// Follow a user
pub async fn follow(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
) -> Result<Response> {
    current.require(Permission::FOLLOW)?;

    let users = state.users();
    users.get(id).await?;
    let back = format!("/user/{}", id);
    match users.follow(current.user.id, id).await {
        Ok(()) => Ok(Redirect::to(&back).into_response()),
        Err(e) => form_error(&back, e),
    }
}

/// Unfollow a user
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
) -> Result<Response> {
    current.require(Permission::FOLLOW)?;

    let users = state.users();
    users.get(id).await?;
    users.unfollow(current.user.id, id).await?;
    Ok(Redirect::to(&format!("/user/{}", id)).into_response())
}
