use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    moderation::MAX_IMAGE_BYTES,
    web::{AppState, admin, articles, auth, submit},
};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

/// Oversized covers must reach validation instead of being cut off by the body limit.
const SUBMISSION_BODY_LIMIT: usize = MAX_IMAGE_BYTES * 4;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(articles::home))
        .route("/article/:slug", get(articles::article_detail))
        .route(
            "/create",
            get(submit::create_page)
                .post(submit::process_submission)
                .layer(DefaultBodyLimit::max(SUBMISSION_BODY_LIMIT)),
        )
        .route(
            "/admin/login",
            get(auth::login_page).post(auth::process_login),
        )
        .route("/admin/logout", post(auth::logout))
        .route("/admin", get(admin::dashboard))
        .route("/admin/pending", get(admin::pending_queue))
        .route("/admin/pending/approve", post(admin::approve_article))
        .route("/admin/pending/reject", post(admin::reject_article))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
