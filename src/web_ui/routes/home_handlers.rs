//! Home page and topic overview.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Serialize;

use super::utils::{page_context, question_items, render_template, AuthorCache};
use crate::auth::Principal;
use crate::error::Result;
use crate::state::AppState;

/// Home page: every question, newest first
pub async fn index(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let mut context = page_context(&principal, &query);

    let questions = state.questions().list_recent().await?;
    let mut authors = AuthorCache::new(&state);
    let items = question_items(&state, &mut authors, questions).await?;
    context.insert("questions", &items);

    Ok(render_template("home.html", &context))
}

#[derive(Serialize)]
struct TopicSummary {
    id: i32,
    name: String,
    description: Option<String>,
    question_count: usize,
}

/// Topics with how many questions each holds
pub async fn explore(State(state): State<Arc<AppState>>, principal: Principal) -> Result<Response> {
    let mut context = page_context(&principal, &HashMap::new());

    let repo = state.topics();
    let mut topics = Vec::new();
    for t in repo.list().await? {
        let question_count = repo.questions(t.id).await?.len();
        topics.push(TopicSummary {
            id: t.id,
            name: t.name,
            description: t.description,
            question_count,
        });
    }
    context.insert("topics", &topics);

    Ok(render_template("explore.html", &context))
}
