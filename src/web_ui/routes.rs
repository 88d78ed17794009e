//! Web UI route handlers.

mod admin_handlers;
mod auth_handlers;
mod error_pages;
mod home_handlers;
mod question_handlers;
mod search_handlers;
mod topic_handlers;
mod user_handlers;
pub(crate) mod utils;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// Create the web UI router
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_handlers::index))
        .route("/explore", get(home_handlers::explore))
        .route("/ask", get(question_handlers::ask_page).post(question_handlers::ask_submit))
        .route(
            "/question/:id",
            get(question_handlers::question_detail).post(question_handlers::answer_submit),
        )
        .route("/question/:id/comment", post(question_handlers::question_comment_submit))
        .route("/answer/:id/comment", post(question_handlers::answer_comment_submit))
        .route("/search", get(search_handlers::search_page).post(search_handlers::search_submit))
        .route("/topic/:id", get(topic_handlers::topic_detail))
        .route("/user/:id", get(user_handlers::user_profile))
        .route("/user/:id/follow", post(user_handlers::follow))
        .route("/user/:id/unfollow", post(user_handlers::unfollow))
        // Auth routes
        .route("/signin", get(auth_handlers::signin_page).post(auth_handlers::signin_submit))
        .route("/signup", get(auth_handlers::signup_page).post(auth_handlers::signup_submit))
        .route("/logout", get(auth_handlers::logout).post(auth_handlers::logout))
        // Admin panel
        .route("/admin", get(admin_handlers::admin_index))
        .route("/admin/questions", get(admin_handlers::list_questions))
        .route(
            "/admin/questions/:id/edit",
            get(admin_handlers::edit_question_page).post(admin_handlers::edit_question_submit),
        )
        .route("/admin/questions/:id/delete", post(admin_handlers::delete_question))
        .route("/admin/answers", get(admin_handlers::list_answers))
        .route(
            "/admin/answers/:id/edit",
            get(admin_handlers::edit_answer_page).post(admin_handlers::edit_answer_submit),
        )
        .route("/admin/users", get(admin_handlers::list_users))
        .route(
            "/admin/users/:id/edit",
            get(admin_handlers::edit_user_page).post(admin_handlers::edit_user_submit),
        )
        .route("/admin/users/:id/delete", post(admin_handlers::delete_user))
        .route("/admin/roles", get(admin_handlers::list_roles))
        .route(
            "/admin/roles/:id/edit",
            get(admin_handlers::edit_role_page).post(admin_handlers::edit_role_submit),
        )
        .fallback(error_pages::fallback)
        .layer(middleware::from_fn(error_pages::negotiate_errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewAnswer, NewUser};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        create_router().with_state(state)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    async fn sign_up(state: &AppState, email: &str, fullname: &str) -> i32 {
        state
            .users()
            .create(NewUser {
                fullname: fullname.to_string(),
                email: email.to_string(),
                password: "secret".to_string(),
                role_id: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn cookie_for(state: &AppState, user_id: i32) -> String {
        let token = state.sessions.create(user_id).await.unwrap();
        format!("session={}", token)
    }

    #[tokio::test]
    async fn test_unknown_route_renders_html_404() {
        let state = AppState::for_tests(None).await;
        let response = app(state)
            .oneshot(Request::get("/no/such/page").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(body_string(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_missing_question_negotiates_json() {
        let state = AppState::for_tests(None).await;
        let response = app(state)
            .oneshot(
                Request::get("/question/999")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_string(response).await, r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn test_ask_requires_login_with_next() {
        let state = AppState::for_tests(None).await;
        let response = app(state)
            .oneshot(Request::get("/ask?draft=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/signin?next=%2Fask%3Fdraft%3D1");
    }

    #[tokio::test]
    async fn test_signin_sets_cookie_and_honours_next() {
        let state = AppState::for_tests(None).await;
        sign_up(&state, "ann@example.com", "Ann").await;

        let response = app(state.clone())
            .oneshot(
                Request::post("/signin?next=%2Fask")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("account=ann%40example.com&password=secret"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/ask");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("session="));

        let response = app(state)
            .oneshot(
                Request::post("/signin?next=%2F%2Fevil.example")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("account=ann%40example.com&password=secret"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_wrong_password_goes_back_to_form() {
        let state = AppState::for_tests(None).await;
        sign_up(&state, "ann@example.com", "Ann").await;

        let response = app(state)
            .oneshot(
                Request::post("/signin")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("account=ann%40example.com&password=SECRET"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/signin?error="));
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_ask_and_answer_flow() {
        let state = AppState::for_tests(None).await;
        let user_id = sign_up(&state, "ann@example.com", "Ann").await;
        let cookie = cookie_for(&state, user_id).await;

        let response = app(state.clone())
            .oneshot(
                Request::post("/ask")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("title=Why+Rust%3F&content=Tell+me&topics=rust"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let question_path = location(&response).to_string();
        assert!(question_path.starts_with("/question/"));

        let response = app(state.clone())
            .oneshot(
                Request::post(question_path.as_str())
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("answer=Because+**speed**"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app(state)
            .oneshot(Request::get(question_path.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Why Rust?"));
        assert!(html.contains("<strong>speed</strong>"));
        assert!(html.contains(">rust</a>"));
    }

    #[tokio::test]
    async fn test_admin_panel_forbidden_for_regular_user() {
        let state = AppState::for_tests(Some("boss@example.com")).await;
        let user_id = sign_up(&state, "ann@example.com", "Ann").await;
        let cookie = cookie_for(&state, user_id).await;

        let response = app(state.clone())
            .oneshot(
                Request::get("/admin/users")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin_id = sign_up(&state, "boss@example.com", "Boss").await;
        let cookie = cookie_for(&state, admin_id).await;
        let response = app(state)
            .oneshot(
                Request::get("/admin/users")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("ann@example.com"));
        assert!(html.contains("Administrator"));
    }

    #[tokio::test]
    async fn test_forbidden_renders_error_page_for_browsers() {
        let state = AppState::for_tests(Some("boss@example.com")).await;
        let user_id = sign_up(&state, "ann@example.com", "Ann").await;
        let cookie = cookie_for(&state, user_id).await;

        let response = app(state.clone())
            .oneshot(
                Request::get("/admin")
                    .header(header::COOKIE, &cookie)
                    .header(header::ACCEPT, "text/html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        let html = body_string(response).await;
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("You do not have permission to access this page."));

        let response = app(state)
            .oneshot(
                Request::get("/admin")
                    .header(header::COOKIE, &cookie)
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(response).await, "Permission denied");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        let state = AppState::for_tests(None).await;

        let response = app(state.clone())
            .oneshot(Request::get("/question/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Page not found"));

        let response = app(state)
            .oneshot(
                Request::get("/user/abc")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn test_admin_edits_answer() {
        let state = AppState::for_tests(Some("boss@example.com")).await;
        let ann = sign_up(&state, "ann@example.com", "Ann").await;
        let admin_id = sign_up(&state, "boss@example.com", "Boss").await;
        let cookie = cookie_for(&state, admin_id).await;

        let q = state.questions().create(ann, "Tabs?", "", &[]).await.unwrap();
        let answer = state
            .questions()
            .add_answer(NewAnswer { question_id: q.id, author_id: ann, content: "spaces".to_string() })
            .await
            .unwrap();
        let edit_path = format!("/admin/answers/{}/edit", answer.id);

        let response = app(state.clone())
            .oneshot(
                Request::get(edit_path.as_str())
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains(">spaces</textarea>"));

        let response = app(state.clone())
            .oneshot(
                Request::post(edit_path.as_str())
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("content=**tabs**"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/answers?message=Answer+saved");
        let stored = state.questions().get_answer(answer.id).await.unwrap();
        assert_eq!(stored.content_html, "<p><strong>tabs</strong></p>\n");

        let response = app(state)
            .oneshot(
                Request::post(edit_path.as_str())
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("content=+"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with(&format!("{}?error=", edit_path)));
    }

    #[tokio::test]
    async fn test_follow_requires_permission_and_is_idempotent() {
        let state = AppState::for_tests(None).await;
        let ann = sign_up(&state, "ann@example.com", "Ann").await;
        let bob = sign_up(&state, "bob@example.com", "Bob").await;
        let cookie = cookie_for(&state, ann).await;

        for _ in 0..2 {
            let response = app(state.clone())
                .oneshot(
                    Request::post(format!("/user/{}/follow", bob))
                        .header(header::COOKIE, &cookie)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }
        assert!(state.users().is_following(ann, bob).await.unwrap());
        assert_eq!(state.users().follower_count(bob).await.unwrap(), 1);

        // Drop Ann's role: following is no longer allowed
        let account = state.users().get(ann).await.unwrap();
        state
            .users()
            .update(ann, &account.fullname, &account.email, None)
            .await
            .unwrap();
        let response = app(state)
            .oneshot(
                Request::post(format!("/user/{}/unfollow", bob))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = AppState::for_tests(None).await;
        let ann = sign_up(&state, "ann@example.com", "Ann").await;
        let cookie = cookie_for(&state, ann).await;

        let response = app(state.clone())
            .oneshot(
                Request::get("/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

        let token = cookie.trim_start_matches("session=");
        assert_eq!(state.sessions.resolve(token).await.unwrap(), None);
    }
}
