use std::borrow::Cow;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    articles::{Article, SlugLookup, find_by_slug, list_approved},
    format::format_date,
    web::{
        AppState,
        templates::{PageLayout, compose_flash_message, escape_html, render_page},
    },
};

#[derive(Default, Deserialize)]
pub struct FlashQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let articles = list_approved(state.articles()).await.map_err(|err| {
        error!(?err, "failed to load approved articles");
        unavailable()
    })?;

    let body = if articles.is_empty() {
        r#"<p class="empty">No articles have been published yet.</p>"#.to_string()
    } else {
        let cards = articles.iter().map(render_card).collect::<String>();
        format!(r#"<div class="grid">{cards}</div>"#)
    };

    Ok(Html(render_page(PageLayout {
        meta_title: "Latest articles",
        heading: "Latest articles",
        subtitle: Some("Insights on SEO, AI, ads and marketing."),
        admin_nav: false,
        flash_html: Cow::Owned(compose_flash_message(
            params.status.as_deref(),
            params.error.as_deref(),
        )),
        body_html: Cow::Owned(body),
    })))
}

pub async fn article_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let lookup = find_by_slug(state.articles(), &slug).await.map_err(|err| {
        error!(?err, %slug, "failed to look up article");
        unavailable()
    })?;

    match lookup {
        SlugLookup::Found(article) => Ok(Html(render_detail(&article))),
        SlugLookup::NotFound => Err(not_found()),
    }
}

fn render_card(article: &Article) -> String {
    format!(
        r#"<a class="card" href="/article/{slug}"><img src="{cover}" alt="{title}" loading="lazy"><div class="body"><div class="meta" style="margin-top:0"><span class="tag">{category}</span><span>{views} views</span></div><h2>{title}</h2><p class="excerpt">{content}</p><div class="meta"><span>{author}</span><span>{date}</span></div></div></a>"#,
        slug = escape_html(&article.slug),
        cover = escape_html(&article.cover_image),
        title = escape_html(&article.title),
        category = escape_html(article.category.as_str()),
        views = article.views,
        content = escape_html(&article.content),
        author = escape_html(&article.author),
        date = format_date(article.created_at),
    )
}

fn render_detail(article: &Article) -> String {
    let body = format!(
        r#"        <span class="tag">{category}</span>
        <div class="meta" style="justify-content:flex-start;">
            <span>By {author}</span><span>{date}</span><span>{views} views</span>
        </div>
        <img class="cover" src="{cover}" alt="{title}">
        <div class="article-body">{content}</div>"#,
        category = escape_html(article.category.as_str()),
        author = escape_html(&article.author),
        date = format_date(article.created_at),
        views = article.views,
        cover = escape_html(&article.cover_image),
        title = escape_html(&article.title),
        content = escape_html(&article.content),
    );

    render_page(PageLayout {
        meta_title: &article.title,
        heading: &article.title,
        subtitle: None,
        admin_nav: false,
        flash_html: Cow::Borrowed(""),
        body_html: Cow::Owned(body),
    })
}

fn not_found() -> (StatusCode, Html<String>) {
    let html = render_page(PageLayout {
        meta_title: "Article not found",
        heading: "Article not found",
        subtitle: Some("The article you are looking for does not exist."),
        admin_nav: false,
        flash_html: Cow::Borrowed(""),
        body_html: Cow::Borrowed(r#"        <p><a href="/">Back to all articles</a></p>"#),
    });
    (StatusCode::NOT_FOUND, Html(html))
}

pub(crate) fn unavailable() -> (StatusCode, Html<String>) {
    let html = render_page(PageLayout {
        meta_title: "Temporarily unavailable",
        heading: "Temporarily unavailable",
        subtitle: Some("Please try again in a moment."),
        admin_nav: false,
        flash_html: Cow::Borrowed(""),
        body_html: Cow::Borrowed(""),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Html(html))
}
