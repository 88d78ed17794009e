//! Question search.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    response::Response,
};
use serde::Deserialize;

use super::utils::{page_context, question_items, render_template, AuthorCache};
use crate::auth::Principal;
use crate::error::Result;
use crate::state::AppState;

const MAX_RESULTS: usize = 50;

#[derive(Deserialize, Default)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

/// Search page (GET, `?q=` optional)
pub async fn search_page(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(form): Query<SearchForm>,
) -> Result<Response> {
    render_results(&state, &principal, &form.q).await
}

/// Search submit (POST)
pub async fn search_submit(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Form(form): Form<SearchForm>,
) -> Result<Response> {
    render_results(&state, &principal, &form.q).await
}

async fn render_results(state: &AppState, principal: &Principal, key_word: &str) -> Result<Response> {
    let key_word = key_word.trim();
    let mut context = page_context(principal, &HashMap::new());
    context.insert("key_word", key_word);

    let found = state.questions().search(key_word, MAX_RESULTS).await?;
    tracing::debug!("Search {:?} matched {} questions", key_word, found.len());

    let mut authors = AuthorCache::new(state);
    let results = question_items(state, &mut authors, found).await?;
    context.insert("results", &results);

    Ok(render_template("search.html", &context))
}
