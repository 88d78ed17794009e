//! Admin panel: questions, answers, users and roles.
//!
//! Every handler requires a signed-in administrator.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tera::Context;

use super::utils::{
    add_user_to_context, form_error, format_relative_time, redirect_with_error, render_template,
    AuthorCache, IdPath,
};
use crate::auth::{CurrentUser, Principal, RequireUser};
use crate::error::Result;
use crate::model::Permission;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuestionEditForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct AnswerEditForm {
    pub content: String,
}

#[derive(Deserialize)]
pub struct UserEditForm {
    pub fullname: String,
    pub email: String,
    /// Empty string clears the role
    #[serde(default)]
    pub role_id: String,
}

#[derive(Deserialize)]
pub struct RoleEditForm {
    pub name: String,
    pub permissions: String,
}

#[derive(Serialize)]
struct QuestionRow {
    id: i32,
    title: String,
    author_name: String,
    created: String,
}

#[derive(Serialize)]
struct AnswerRow {
    id: i32,
    question_id: i32,
    question_title: String,
    author_name: String,
    created: String,
}

#[derive(Serialize)]
struct UserRow {
    id: i32,
    fullname: String,
    email: String,
    role_name: Option<String>,
}

#[derive(Serialize)]
struct RoleRow {
    id: i32,
    name: String,
    permissions: String,
    permission_names: Vec<&'static str>,
    is_default: bool,
}

/// Check the administrator bit and start an admin page context.
fn admin_context(current: CurrentUser, section: &str, query: &HashMap<String, String>) -> Result<Context> {
    current.require(Permission::ADMINISTER)?;

    let mut context = Context::new();
    add_user_to_context(&mut context, &Principal::Authenticated(current));
    context.insert("section", section);
    if let Some(error) = query.get("error") {
        context.insert("error", error);
    }
    if let Some(msg) = query.get("message") {
        context.insert("message", msg);
    }
    Ok(context)
}

pub async fn admin_index(RequireUser(current): RequireUser) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    Ok(Redirect::to("/admin/questions").into_response())
}

// =============================================================================
// Questions
// =============================================================================

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "questions", &query)?;

    let mut authors = AuthorCache::new(&state);
    let mut rows = Vec::new();
    for q in state.questions().list_recent().await? {
        rows.push(QuestionRow {
            id: q.id,
            author_name: authors.name(q.author_id).await?,
            created: format_relative_time(q.created_at),
            title: q.title,
        });
    }
    context.insert("questions", &rows);

    Ok(render_template("admin/questions.html", &context))
}

pub async fn edit_question_page(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "questions", &query)?;
    let q = state.questions().get(id).await?;
    context.insert(
        "question",
        &serde_json::json!({ "id": q.id, "title": q.title, "description": q.description }),
    );
    Ok(render_template("admin/question_edit.html", &context))
}

pub async fn edit_question_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<QuestionEditForm>,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    match state.questions().update(id, &form.title, &form.description).await {
        Ok(_) => Ok(Redirect::to("/admin/questions?message=Question+saved").into_response()),
        Err(e) => form_error(&format!("/admin/questions/{}/edit", id), e),
    }
}

pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    state.questions().delete(id).await?;
    tracing::info!("Admin {} deleted question {}", current.user.id, id);
    Ok(Redirect::to("/admin/questions?message=Question+deleted").into_response())
}

// =============================================================================
// Answers
// =============================================================================

pub async fn list_answers(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "answers", &query)?;

    let repo = state.questions();
    let mut authors = AuthorCache::new(&state);
    let mut titles: HashMap<i32, String> = HashMap::new();
    let mut rows = Vec::new();
    for a in repo.list_answers().await? {
        let question_title = match titles.get(&a.question_id) {
            Some(title) => title.clone(),
            None => {
                let title = repo.get(a.question_id).await?.title;
                titles.insert(a.question_id, title.clone());
                title
            }
        };
        rows.push(AnswerRow {
            id: a.id,
            question_id: a.question_id,
            question_title,
            author_name: authors.name(a.author_id).await?,
            created: format_relative_time(a.created_at),
        });
    }
    context.insert("answers", &rows);

    Ok(render_template("admin/answers.html", &context))
}

pub async fn edit_answer_page(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "answers", &query)?;
    let a = state.questions().get_answer(id).await?;
    context.insert(
        "answer",
        &serde_json::json!({ "id": a.id, "question_id": a.question_id, "content": a.content }),
    );
    Ok(render_template("admin/answer_edit.html", &context))
}

pub async fn edit_answer_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<AnswerEditForm>,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    match state.questions().edit_answer(id, &form.content).await {
        Ok(_) => {
            tracing::info!("Admin {} edited answer {}", current.user.id, id);
            Ok(Redirect::to("/admin/answers?message=Answer+saved").into_response())
        }
        Err(e) => form_error(&format!("/admin/answers/{}/edit", id), e),
    }
}

// =============================================================================
// Users
// =============================================================================

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "users", &query)?;

    let role_names: HashMap<i32, String> = state
        .roles()
        .list()
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();
    let rows: Vec<UserRow> = state
        .users()
        .list()
        .await?
        .into_iter()
        .map(|u| UserRow {
            role_name: u.role_id.and_then(|id| role_names.get(&id).cloned()),
            id: u.id,
            fullname: u.fullname,
            email: u.email,
        })
        .collect();
    context.insert("users", &rows);

    Ok(render_template("admin/users.html", &context))
}

pub async fn edit_user_page(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "users", &query)?;
    let account = state.users().get(id).await?;
    context.insert(
        "account",
        &serde_json::json!({
            "id": account.id,
            "fullname": account.fullname,
            "email": account.email,
            "role_id": account.role_id,
        }),
    );
    let roles: Vec<serde_json::Value> = state
        .roles()
        .list()
        .await?
        .into_iter()
        .map(|r| serde_json::json!({ "id": r.id, "name": r.name }))
        .collect();
    context.insert("roles", &roles);
    Ok(render_template("admin/user_edit.html", &context))
}

pub async fn edit_user_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<UserEditForm>,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    let back = format!("/admin/users/{}/edit", id);

    let role_id = match form.role_id.trim() {
        "" => None,
        raw => match raw.parse::<i32>() {
            Ok(role_id) => Some(role_id),
            Err(_) => return Ok(redirect_with_error(&back, "Unknown role")),
        },
    };

    match state.users().update(id, &form.fullname, &form.email, role_id).await {
        Ok(_) => Ok(Redirect::to("/admin/users?message=User+saved").into_response()),
        Err(e) => form_error(&back, e),
    }
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    if id == current.user.id {
        return Ok(redirect_with_error("/admin/users", "You cannot delete your own account"));
    }

    match state.users().delete(id).await {
        Ok(()) => {
            state.sessions.revoke_user(id).await?;
            tracing::info!("Admin {} deleted user {}", current.user.id, id);
            Ok(Redirect::to("/admin/users?message=User+deleted").into_response())
        }
        Err(e) => form_error("/admin/users", e),
    }
}

// =============================================================================
// Roles
// =============================================================================

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "roles", &query)?;

    let rows: Vec<RoleRow> = state
        .roles()
        .list()
        .await?
        .into_iter()
        .map(|r| RoleRow {
            permissions: r.permission().to_string(),
            permission_names: r.permission().names(),
            id: r.id,
            name: r.name,
            is_default: r.is_default,
        })
        .collect();
    context.insert("roles", &rows);

    Ok(render_template("admin/roles.html", &context))
}

pub async fn edit_role_page(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = admin_context(current, "roles", &query)?;
    let r = state.roles().get(id).await?;
    context.insert(
        "role",
        &serde_json::json!({
            "id": r.id,
            "name": r.name,
            "permissions": r.permission().to_string(),
        }),
    );
    Ok(render_template("admin/role_edit.html", &context))
}

pub async fn edit_role_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<RoleEditForm>,
) -> Result<Response> {
    current.require(Permission::ADMINISTER)?;
    let back = format!("/admin/roles/{}/edit", id);

    let permissions: Permission = match form.permissions.parse() {
        Ok(p) => p,
        Err(msg) => return Ok(redirect_with_error(&back, &msg)),
    };

    match state.roles().update(id, &form.name, permissions).await {
        Ok(r) => {
            tracing::info!("Admin {} set role {} to {}", current.user.id, r.name, permissions);
            Ok(Redirect::to("/admin/roles?message=Role+saved").into_response())
        }
        Err(e) => form_error(&back, e),
    }
}
