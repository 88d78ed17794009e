//! Asking, viewing and answering questions, plus comments.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use super::utils::{
    clean_html, form_error, format_relative_time, page_context, render_template, AuthorCache,
    IdPath, TopicLink,
};
use crate::auth::{Principal, RequireUser};
use crate::db::entities::{answer_comment, question_comment};
use crate::db::topics::parse_topic_names;
use crate::db::NewAnswer;
use crate::error::Result;
use crate::model::Permission;
use crate::state::AppState;

/// Ask form data
#[derive(Deserialize)]
pub struct AskForm {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topics: String,
}

#[derive(Deserialize)]
pub struct AnswerForm {
    pub answer: String,
}

#[derive(Deserialize)]
pub struct CommentForm {
    pub content: String,
}

#[derive(Serialize)]
struct QuestionView {
    id: i32,
    title: String,
    description: String,
    author_id: i32,
    author_name: String,
    created: String,
    topics: Vec<TopicLink>,
}

#[derive(Serialize)]
struct CommentView {
    author_id: i32,
    author_name: String,
    content: String,
    created: String,
}

#[derive(Serialize)]
struct AnswerView {
    id: i32,
    author_id: i32,
    author_name: String,
    content_html: String,
    created: String,
    comments: Vec<CommentView>,
}

/// Ask page (GET)
pub async fn ask_page(
    RequireUser(current): RequireUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    current.require(Permission::WRITE_ARTICLES)?;
    let principal = Principal::Authenticated(current);
    Ok(render_template("ask.html", &page_context(&principal, &query)))
}

/// Ask submit (POST)
pub async fn ask_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    Form(form): Form<AskForm>,
) -> Result<Response> {
    current.require(Permission::WRITE_ARTICLES)?;

    let topics = parse_topic_names(&form.topics);
    match state
        .questions()
        .create(current.user.id, &form.title, &form.content, &topics)
        .await
    {
        Ok(q) => Ok(Redirect::to(&format!("/question/{}", q.id)).into_response()),
        Err(e) => form_error("/ask", e),
    }
}

/// Question page with its answers, oldest first
pub async fn question_detail(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    IdPath(id): IdPath,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let repo = state.questions();
    let q = repo.get(id).await?;
    let mut authors = AuthorCache::new(&state);
    let mut context = page_context(&principal, &query);

    let topics = state
        .topics()
        .topics_for(q.id)
        .await?
        .into_iter()
        .map(TopicLink::from)
        .collect();
    context.insert(
        "question",
        &QuestionView {
            id: q.id,
            author_name: authors.name(q.author_id).await?,
            author_id: q.author_id,
            created: format_relative_time(q.created_at),
            topics,
            title: q.title,
            description: q.description,
        },
    );

    let mut question_comments = Vec::new();
    for c in repo.question_comments(id).await? {
        question_comments.push(question_comment_view(&mut authors, c).await?);
    }
    context.insert("question_comments", &question_comments);

    let mut answers = Vec::new();
    for a in repo.answers(id).await? {
        let mut comments = Vec::new();
        for c in repo.answer_comments(a.id).await? {
            comments.push(answer_comment_view(&mut authors, c).await?);
        }
        answers.push(AnswerView {
            id: a.id,
            author_name: authors.name(a.author_id).await?,
            author_id: a.author_id,
            content_html: clean_html(&a.content_html),
            created: format_relative_time(a.created_at),
            comments,
        });
    }
    context.insert("answers", &answers);
    context.insert("can_answer", &principal.can(Permission::WRITE_ARTICLES));
    context.insert("can_comment", &principal.can(Permission::COMMENT));

    Ok(render_template("question.html", &context))
}

async fn question_comment_view(
    authors: &mut AuthorCache<'_>,
    c: question_comment::Model,
) -> Result<CommentView> {
    Ok(CommentView {
        author_name: authors.name(c.author_id).await?,
        author_id: c.author_id,
        content: c.content,
        created: format_relative_time(c.created_at),
    })
}

async fn answer_comment_view(
    authors: &mut AuthorCache<'_>,
    c: answer_comment::Model,
) -> Result<CommentView> {
    Ok(CommentView {
        author_name: authors.name(c.author_id).await?,
        author_id: c.author_id,
        content: c.content,
        created: format_relative_time(c.created_at),
    })
}

/// Answer submit (POST to the question page)
pub async fn answer_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<AnswerForm>,
) -> Result<Response> {
    current.require(Permission::WRITE_ARTICLES)?;

    let back = format!("/question/{}", id);
    let posted = state
        .questions()
        .add_answer(NewAnswer {
            question_id: id,
            author_id: current.user.id,
            content: form.answer,
        })
        .await;

    match posted {
        Ok(a) => Ok(Redirect::to(&format!("{}#answer-{}", back, a.id)).into_response()),
        Err(e) => form_error(&back, e),
    }
}

/// Comment on a question
pub async fn question_comment_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    current.require(Permission::COMMENT)?;

    let back = format!("/question/{}", id);
    match state
        .questions()
        .add_question_comment(id, current.user.id, &form.content)
        .await
    {
        Ok(_) => Ok(Redirect::to(&back).into_response()),
        Err(e) => form_error(&back, e),
    }
}

/// Comment on an answer
pub async fn answer_comment_submit(
    State(state): State<Arc<AppState>>,
    RequireUser(current): RequireUser,
    IdPath(id): IdPath,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    current.require(Permission::COMMENT)?;

    let repo = state.questions();
    let a = repo.get_answer(id).await?;
    let back = format!("/question/{}", a.question_id);
    match repo.add_answer_comment(id, current.user.id, &form.content).await {
        Ok(_) => Ok(Redirect::to(&format!("{}#answer-{}", back, id)).into_response()),
        Err(e) => form_error(&back, e),
    }
}
