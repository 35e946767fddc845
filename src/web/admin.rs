use std::borrow::Cow;

use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    articles::{Article, list_pending},
    format::format_date,
    moderation::{self, Confirmation, ModerationError, RejectOutcome},
    web::{
        AppState,
        articles::{FlashQuery, unavailable},
        gate::require_admin,
        templates::{PageLayout, compose_flash_message, escape_html, render_page},
    },
};

const PENDING_PAGE: &str = "/admin/pending";

#[derive(Deserialize)]
pub struct ModerationForm {
    pub id: String,
    #[serde(default)]
    pub confirmed: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Response> {
    let admin = require_admin(&state, &jar)
        .await
        .map_err(IntoResponse::into_response)?;

    let pending = list_pending(state.articles())
        .await
        .map_err(|err| {
            error!(?err, "failed to count pending articles");
            unavailable().into_response()
        })?
        .len();

    let body = format!(
        r#"        <div class="grid">
            <a class="card" href="/create"><div class="body"><h2>Create Post</h2><p class="excerpt">Write and submit a new article</p></div></a>
            <a class="card" href="{PENDING_PAGE}"><div class="body"><h2>Pending Posts</h2><p class="excerpt">Review and approve submitted articles ({pending} waiting)</p></div></a>
        </div>"#
    );

    let subtitle = format!("Signed in as {}", admin.email);
    Ok(Html(render_page(PageLayout {
        meta_title: "Admin dashboard",
        heading: "Admin Dashboard",
        subtitle: Some(subtitle.as_str()),
        admin_nav: true,
        flash_html: Cow::Owned(compose_flash_message(
            params.status.as_deref(),
            params.error.as_deref(),
        )),
        body_html: Cow::Owned(body),
    })))
}

pub async fn pending_queue(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Response> {
    require_admin(&state, &jar)
        .await
        .map_err(IntoResponse::into_response)?;

    let articles = list_pending(state.articles()).await.map_err(|err| {
        error!(?err, "failed to load pending articles");
        unavailable().into_response()
    })?;

    let body = if articles.is_empty() {
        r#"<p class="empty">No pending articles 🎉</p>"#.to_string()
    } else {
        articles.iter().map(render_queue_item).collect::<String>()
    };

    Ok(Html(render_page(PageLayout {
        meta_title: "Pending articles",
        heading: "Pending Articles",
        subtitle: None,
        admin_nav: true,
        flash_html: Cow::Owned(compose_flash_message(
            params.status.as_deref(),
            params.error.as_deref(),
        )),
        body_html: Cow::Owned(body),
    })))
}

pub async fn approve_article(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ModerationForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin(&state, &jar).await?;
    let id = parse_article_id(&form.id)?;

    let Some(_ticket) = state.reviews().try_begin(id) else {
        return Ok(queue_redirect("error", "busy"));
    };

    match moderation::approve(state.articles(), id, &admin.email).await {
        Ok(_) => Ok(queue_redirect("status", "approved")),
        Err(err) => Ok(moderation_failure(err)),
    }
}

pub async fn reject_article(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ModerationForm>,
) -> Result<Redirect, Redirect> {
    require_admin(&state, &jar).await?;
    let id = parse_article_id(&form.id)?;
    let confirmation = Confirmation::from_flag(form.confirmed.as_deref());

    let Some(_ticket) = state.reviews().try_begin(id) else {
        return Ok(queue_redirect("error", "busy"));
    };

    match moderation::reject(state.articles(), id, confirmation).await {
        Ok(RejectOutcome::Rejected) => Ok(queue_redirect("status", "rejected")),
        Ok(RejectOutcome::Cancelled) => Ok(queue_redirect("status", "cancelled")),
        Err(err) => Ok(moderation_failure(err)),
    }
}

fn parse_article_id(raw: &str) -> Result<Uuid, Redirect> {
    Uuid::parse_str(raw.trim()).map_err(|_| queue_redirect("error", "invalid_id"))
}

fn queue_redirect(key: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{PENDING_PAGE}?{key}={code}"))
}

fn moderation_failure(err: ModerationError) -> Redirect {
    match err {
        ModerationError::NotFound(_) => queue_redirect("error", "not_found"),
        ModerationError::Store(err) => {
            error!(?err, "moderation action failed");
            queue_redirect("error", "unknown")
        }
    }
}

fn render_queue_item(article: &Article) -> String {
    let id = article.id.to_string();
    format!(
        r#"<article class="panel queue-item">
    <img src="{cover}" alt="{title}" loading="lazy">
    <div>
        <div class="meta" style="justify-content:flex-start;margin-top:0"><span class="tag">{category}</span><span>{date}</span></div>
        <h2>{title}</h2>
        <p class="note">By <strong>{author}</strong></p>
        <p class="article-body">{content}</p>
        <p class="slug">Slug: {slug}</p>
        <div class="actions">
            <form method="post" action="{PENDING_PAGE}/approve">
                <input type="hidden" name="id" value="{id}">
                <button type="submit" class="approve">Approve</button>
            </form>
            <form method="post" action="{PENDING_PAGE}/reject" onsubmit="return confirm('Are you sure you want to reject and permanently delete this post?');">
                <input type="hidden" name="id" value="{id}">
                <input type="hidden" name="confirmed" value="yes">
                <button type="submit" class="reject">Reject</button>
            </form>
        </div>
    </div>
</article>"#,
        cover = escape_html(&article.cover_image),
        title = escape_html(&article.title),
        category = escape_html(article.category.as_str()),
        date = format_date(article.created_at),
        author = escape_html(&article.author),
        content = escape_html(&article.content),
        slug = escape_html(&article.slug),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;
    use axum_extra::extract::cookie::Cookie;

    use super::*;
    use crate::{
        articles::{ArticleStatus, ArticleStore, Category, NewArticle},
        web::{auth::SESSION_COOKIE, state::tests::memory_state},
    };

    async fn jar_for(state: &AppState, email: &str) -> CookieJar {
        let session = state.identity().sign_in(email, "pw").await.unwrap();
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, session.token.to_string()))
    }

    fn location(redirect: Redirect) -> String {
        let response = redirect.into_response();
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    async fn pending_article(state: &AppState) -> Article {
        state
            .articles()
            .create(NewArticle {
                title: "Queued".to_string(),
                slug: "queued-1".to_string(),
                content: "Body".to_string(),
                category: Category::Others,
                cover_image: "https://img.example/q.png".to_string(),
                author: "Ken".to_string(),
            })
            .await
            .unwrap()
    }

    fn form(id: Uuid, confirmed: Option<&str>) -> Form<ModerationForm> {
        Form(ModerationForm {
            id: id.to_string(),
            confirmed: confirmed.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn signed_out_visitors_are_sent_to_login() {
        let (state, _, _) = memory_state().await;
        let response = pending_queue(
            State(state),
            CookieJar::new(),
            Query(FlashQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(response.headers()[LOCATION], "/admin/login");
    }

    #[tokio::test]
    async fn unlisted_accounts_are_denied() {
        let (state, _, _) = memory_state().await;
        let jar = jar_for(&state, "reader@example.com").await;
        let response = dashboard(State(state), jar, Query(FlashQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(response.headers()[LOCATION], "/?error=not_authorized");
    }

    #[tokio::test]
    async fn admin_sees_pending_queue() {
        let (state, _, _) = memory_state().await;
        let article = pending_article(&state).await;
        let jar = jar_for(&state, "admin@example.com").await;

        let Html(body) = pending_queue(State(state), jar, Query(FlashQuery::default()))
            .await
            .unwrap();
        assert!(body.contains("Queued"));
        assert!(body.contains(&article.id.to_string()));
        assert!(body.contains("Slug: queued-1"));
    }

    #[tokio::test]
    async fn approve_stamps_signed_in_admin() {
        let (state, store, _) = memory_state().await;
        let article = pending_article(&state).await;
        let jar = jar_for(&state, "admin@example.com").await;

        let redirect = approve_article(State(state.clone()), jar, form(article.id, None))
            .await
            .unwrap();
        assert_eq!(location(redirect), "/admin/pending?status=approved");

        let stored = store.get(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Approved);
        assert_eq!(stored.approved_by.as_deref(), Some("admin@example.com"));
        assert!(!state.reviews().is_busy(&article.id));
    }

    #[tokio::test]
    async fn reject_honours_confirmation() {
        let (state, store, _) = memory_state().await;
        let article = pending_article(&state).await;
        let jar = jar_for(&state, "admin@example.com").await;

        let redirect = reject_article(State(state.clone()), jar.clone(), form(article.id, None))
            .await
            .unwrap();
        assert_eq!(location(redirect), "/admin/pending?status=cancelled");
        assert!(store.get(article.id).await.unwrap().is_some());

        let redirect = reject_article(State(state.clone()), jar, form(article.id, Some("yes")))
            .await
            .unwrap();
        assert_eq!(location(redirect), "/admin/pending?status=rejected");
        assert!(store.get(article.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn moderation_of_missing_or_malformed_ids_redirects_with_error() {
        let (state, _, _) = memory_state().await;
        let jar = jar_for(&state, "admin@example.com").await;

        let redirect =
            approve_article(State(state.clone()), jar.clone(), form(Uuid::new_v4(), None))
                .await
                .unwrap();
        assert_eq!(location(redirect), "/admin/pending?error=not_found");

        let bad = Form(ModerationForm {
            id: "not-a-uuid".to_string(),
            confirmed: None,
        });
        let redirect = reject_article(State(state), jar, bad).await.unwrap_err();
        assert_eq!(location(redirect), "/admin/pending?error=invalid_id");
    }

    #[tokio::test]
    async fn concurrent_review_of_same_article_is_refused() {
        let (state, store, _) = memory_state().await;
        let article = pending_article(&state).await;
        let jar = jar_for(&state, "admin@example.com").await;
        let _held = state.reviews().try_begin(article.id).unwrap();

        let redirect = approve_article(State(state.clone()), jar, form(article.id, None))
            .await
            .unwrap();
        assert_eq!(location(redirect), "/admin/pending?error=busy");
        let stored = store.get(article.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ArticleStatus::Pending);
    }
}
