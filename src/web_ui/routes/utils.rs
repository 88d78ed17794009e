//! Shared utilities and helper functions for web UI.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::{rejection::PathRejection, FromRequestParts, Path};
use axum::http::{request::Parts, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;
use tera::Context;

use crate::auth::Principal;
use crate::db::entities::{answer, question, topic, user};
use crate::error::{Result, ServerError};
use crate::model::Permission;
use crate::state::AppState;
use crate::web_ui::templates;

/// Helper to render a template
pub fn render_template(name: &str, context: &Context) -> Response {
    match templates::render(name, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Helper to render an error page with the error's status
pub fn render_error(status: StatusCode, message: &str) -> Response {
    let mut context = Context::new();
    context.insert("message", message);

    match templates::render("error.html", &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message.to_string()).into_response(),
    }
}

/// Numeric `:id` path segment. Anything that is not an integer is a 404.
pub struct IdPath(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        match Path::<i32>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(IdPath(id)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                Err(ServerError::NotFound(e.body_text()))
            }
            Err(e) => Err(ServerError::Internal(e.body_text())),
        }
    }
}

/// Redirect back to a form, carrying the message in `?error=`.
pub fn redirect_with_error(path: &str, message: &str) -> Response {
    let query = serde_urlencoded::to_string([("error", message)]).unwrap_or_default();
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{}{}{}", path, sep, query)).into_response()
}

/// Form posts: user-fixable errors go back to the form, the rest propagate.
pub fn form_error(path: &str, err: ServerError) -> Result<Response> {
    if err.is_user_error() {
        Ok(redirect_with_error(path, &user_message(&err)))
    } else {
        Err(err)
    }
}

fn user_message(err: &ServerError) -> String {
    match err {
        ServerError::Conflict(_) => "That name or email is already taken".to_string(),
        ServerError::InvalidRequest(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Navigation info about the signed-in user, as seen by `base.html`.
#[derive(Serialize)]
pub struct NavUser {
    pub id: i32,
    pub fullname: String,
    pub can_write: bool,
    pub is_admin: bool,
}

/// Add current user to context if logged in
pub fn add_user_to_context(context: &mut Context, principal: &Principal) {
    if let Some(current) = principal.current() {
        context.insert(
            "current_user",
            &NavUser {
                id: current.user.id,
                fullname: current.user.fullname.clone(),
                can_write: current.can(Permission::WRITE_ARTICLES),
                is_admin: current.is_administrator(),
            },
        );
    }
}

/// Context with the current user and any `error`/`message` query values.
pub fn page_context(principal: &Principal, query: &HashMap<String, String>) -> Context {
    let mut context = Context::new();
    add_user_to_context(&mut context, principal);
    if let Some(error) = query.get("error") {
        context.insert("error", error);
    }
    if let Some(msg) = query.get("message") {
        context.insert("message", msg);
    }
    context
}

/// Sanitize stored HTML before it is rendered unescaped.
pub fn clean_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("a", &["class"])
        .add_tag_attributes("div", &["class"])
        .add_tag_attributes("code", &["class"])
        .clean(html)
        .to_string()
}

/// Format seconds ago as human-readable string
pub fn format_time_ago(seconds: i64) -> String {
    if seconds < 0 {
        return "in the future".to_string();
    }
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" });
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" });
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{} day{} ago", days, if days == 1 { "" } else { "s" });
    }
    let months = days / 30;
    if months < 12 {
        return format!("{} month{} ago", months, if months == 1 { "" } else { "s" });
    }
    let years = months / 12;
    format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
}

/// Format a Unix timestamp as a relative time string
pub fn format_relative_time(timestamp: i64) -> String {
    format_time_ago(crate::db::now() - timestamp)
}

/// Looks up author names once per request.
pub struct AuthorCache<'a> {
    state: &'a AppState,
    names: HashMap<i32, String>,
}

impl<'a> AuthorCache<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            names: HashMap::new(),
        }
    }

    pub async fn name(&mut self, user_id: i32) -> Result<String> {
        if let Some(name) = self.names.get(&user_id) {
            return Ok(name.clone());
        }
        let name = match self.state.users().find(user_id).await? {
            Some(u) => u.fullname,
            None => "[deleted]".to_string(),
        };
        self.names.insert(user_id, name.clone());
        Ok(name)
    }
}

#[derive(Serialize)]
pub struct TopicLink {
    pub id: i32,
    pub name: String,
}

impl From<topic::Model> for TopicLink {
    fn from(t: topic::Model) -> Self {
        Self { id: t.id, name: t.name }
    }
}

/// An answer reduced to its summary, for lists.
#[derive(Serialize)]
pub struct AnswerPreview {
    pub id: i32,
    pub question_id: i32,
    pub question_title: String,
    pub author_name: String,
    pub summary: String,
    pub summary_img_url: Option<String>,
    pub created: String,
}

/// A question row in lists: home, search, topic and admin.
#[derive(Serialize)]
pub struct QuestionItem {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub author_name: String,
    pub created: String,
    pub answer_count: u64,
    pub topics: Vec<TopicLink>,
    pub latest_answer: Option<AnswerPreview>,
}

/// Build list rows for `questions`, keeping their order.
pub async fn question_items(
    state: &AppState,
    authors: &mut AuthorCache<'_>,
    questions: Vec<question::Model>,
) -> Result<Vec<QuestionItem>> {
    let repo = state.questions();
    let topics = state.topics();
    let mut items = Vec::with_capacity(questions.len());

    for q in questions {
        let answers = repo.answers(q.id).await?;
        let latest_answer = match answers.last() {
            Some(a) => Some(answer_preview(authors, a, &q).await?),
            None => None,
        };
        items.push(QuestionItem {
            id: q.id,
            author_name: authors.name(q.author_id).await?,
            author_id: q.author_id,
            created: format_relative_time(q.created_at),
            answer_count: answers.len() as u64,
            topics: topics
                .topics_for(q.id)
                .await?
                .into_iter()
                .map(TopicLink::from)
                .collect(),
            latest_answer,
            title: q.title,
        });
    }
    Ok(items)
}

pub async fn answer_preview(
    authors: &mut AuthorCache<'_>,
    a: &answer::Model,
    q: &question::Model,
) -> Result<AnswerPreview> {
    Ok(AnswerPreview {
        id: a.id,
        question_id: q.id,
        question_title: q.title.clone(),
        author_name: authors.name(a.author_id).await?,
        summary: clean_html(&a.summary),
        summary_img_url: a.summary_img_url.clone(),
        created: format_relative_time(a.created_at),
    })
}

/// Profile header fields.
#[derive(Serialize)]
pub struct ProfileView {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub role_name: Option<String>,
    pub created: String,
}

impl ProfileView {
    pub fn new(account: &user::Model, role_name: Option<String>) -> Self {
        Self {
            id: account.id,
            fullname: account.fullname.clone(),
            email: account.email.clone(),
            role_name,
            created: format_relative_time(account.created_at),
        }
    }
}
