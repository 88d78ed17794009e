//! Error page negotiation.
//!
//! Every 404, whether from an unmatched route or a missing entity, is
//! rewritten here: API-style clients (accept JSON, not HTML) get a JSON body,
//! browsers get the rendered not-found page. Plain-text 403 and 5xx
//! responses become the rendered error page for browsers.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use tera::Context;

use super::utils::render_error;
use crate::web_ui::templates;

/// Router fallback for unmatched paths.
pub async fn fallback() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware that replaces the body of error responses.
pub async fn negotiate_errors(request: Request, next: Next) -> Response {
    let wants_json = prefers_json(request.headers());
    let response = next.run(request).await;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return not_found(wants_json);
    }

    if (status == StatusCode::FORBIDDEN || status.is_server_error())
        && !wants_json
        && !is_html(&response)
    {
        return render_error(status, error_message(status));
    }

    response
}

fn not_found(wants_json: bool) -> Response {
    if wants_json {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "not found" })),
        )
            .into_response();
    }

    match templates::render("404.html", &Context::new()) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template error: {:?}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

fn error_message(status: StatusCode) -> &'static str {
    if status == StatusCode::FORBIDDEN {
        "You do not have permission to access this page."
    } else {
        "The server hit an error while handling this request."
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// True when the client accepts JSON but not HTML.
pub fn prefers_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mut json = false;
    let mut html = false;
    for range in accepted_ranges(accept) {
        match range {
            "*/*" => {
                json = true;
                html = true;
            }
            "application/*" | "application/json" => json = true,
            "text/*" | "text/html" | "application/xhtml+xml" => html = true,
            _ => {}
        }
    }
    json && !html
}

/// Media ranges in an Accept header, lowercased, skipping `q=0` entries.
fn accepted_ranges(accept: &str) -> impl Iterator<Item = &str> + '_ {
    accept.split(',').filter_map(|item| {
        let mut parts = item.split(';').map(str::trim);
        let range = parts.next().filter(|r| !r.is_empty())?;
        let refused = parts.any(|p| {
            p.strip_prefix("q=")
                .and_then(|q| q.parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        (!refused).then_some(range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_prefers_json() {
        assert!(prefers_json(&accept("application/json")));
        assert!(prefers_json(&accept("application/json, text/plain")));
        assert!(prefers_json(&accept("application/json, text/html;q=0")));
    }

    #[test]
    fn test_prefers_html() {
        assert!(!prefers_json(&HeaderMap::new()));
        assert!(!prefers_json(&accept("*/*")));
        assert!(!prefers_json(&accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")));
        assert!(!prefers_json(&accept("application/json, text/html")));
        assert!(!prefers_json(&accept("application/json, */*")));
        assert!(!prefers_json(&accept("text/plain")));
    }
}
