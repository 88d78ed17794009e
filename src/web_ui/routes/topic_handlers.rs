//! Topic pages.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, response::Response};

use super::utils::{page_context, question_items, render_template, AuthorCache, IdPath};
use crate::auth::Principal;
use crate::error::Result;
use crate::state::AppState;

/// Questions tagged with a topic, newest first
pub async fn topic_detail(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    IdPath(id): IdPath,
) -> Result<Response> {
    let repo = state.topics();
    let topic = repo.get(id).await?;
    let questions = repo.questions(id).await?;

    let mut context = page_context(&principal, &HashMap::new());
    let mut authors = AuthorCache::new(&state);
    context.insert("questions", &question_items(&state, &mut authors, questions).await?);
    context.insert(
        "topic",
        &serde_json::json!({
            "id": topic.id,
            "name": topic.name,
            "description": topic.description,
        }),
    );

    Ok(render_template("topic.html", &context))
}
