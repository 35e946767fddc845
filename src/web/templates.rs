use std::borrow::Cow;

use chrono::{Datelike, Utc};

const SITE_NAME: &str = "SearchSphere";

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; max-width: 1100px; margin: 0 auto; }
        .brand { font-size: 1.5rem; font-weight: 700; color: #1d4ed8; text-decoration: none; }
        nav a, nav button { margin-left: 0.75rem; color: #0f172a; text-decoration: none; font-weight: 600; }
        nav form { display: inline; }
        nav button { background: none; border: none; cursor: pointer; font-size: 1rem; padding: 0; }
        main { padding: 2rem 1.5rem; max-width: 1100px; margin: 0 auto; box-sizing: border-box; }
        h1 { margin-top: 0; }
        .subtitle { color: #475569; margin-top: -0.5rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .grid { display: grid; gap: 1.5rem; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); }
        .card { display: block; background: #ffffff; border-radius: 14px; border: 1px solid #e2e8f0; overflow: hidden; text-decoration: none; color: inherit; box-shadow: 0 12px 30px rgba(15, 23, 42, 0.06); }
        .card img { width: 100%; height: 180px; object-fit: cover; background: #e2e8f0; }
        .card .body { padding: 1.1rem; }
        .card h2 { font-size: 1.15rem; margin: 0.5rem 0; }
        .excerpt { color: #475569; font-size: 0.95rem; display: -webkit-box; -webkit-line-clamp: 3; -webkit-box-orient: vertical; overflow: hidden; }
        .meta { display: flex; justify-content: space-between; gap: 0.75rem; color: #64748b; font-size: 0.85rem; margin-top: 0.75rem; }
        .tag { display: inline-block; background: #dbeafe; color: #1d4ed8; padding: 0.2rem 0.6rem; border-radius: 999px; font-size: 0.8rem; font-weight: 600; }
        .article-body { white-space: pre-wrap; line-height: 1.75; font-size: 1.05rem; }
        .cover { width: 100%; max-height: 420px; object-fit: cover; border-radius: 14px; margin: 1.5rem 0; }
        label { display: block; margin: 1rem 0 0.4rem; font-weight: 600; }
        input, select, textarea { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; font-size: 1rem; }
        button { padding: 0.8rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:hover { background: #1d4ed8; }
        button.secondary { background: #e2e8f0; color: #0f172a; }
        button.approve { background: #16a34a; }
        button.reject { background: #dc2626; }
        .actions { display: flex; gap: 0.75rem; margin-top: 1.25rem; flex-wrap: wrap; }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; margin-bottom: 1.5rem; font-weight: 600; border: 1px solid transparent; }
        .flash.success { background: #ecfdf3; border-color: #bbf7d0; color: #166534; }
        .flash.error { background: #fef2f2; border-color: #fecaca; color: #b91c1c; }
        .queue-item { display: flex; gap: 1.25rem; margin-bottom: 1.5rem; }
        .queue-item img { width: 180px; height: 140px; object-fit: cover; border-radius: 10px; background: #e2e8f0; }
        .slug { font-family: monospace; color: #94a3b8; font-size: 0.8rem; }
        .empty { color: #64748b; }
        .note { color: #475569; font-size: 0.95rem; line-height: 1.6; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
        @media (max-width: 768px) {
            main { padding: 1.5rem 1rem; }
            .queue-item { flex-direction: column; }
            .queue-item img { width: 100%; }
        }
"#;

pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub heading: &'a str,
    pub subtitle: Option<&'a str>,
    pub admin_nav: bool,
    pub flash_html: Cow<'a, str>,
    pub body_html: Cow<'a, str>,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        heading,
        subtitle,
        admin_nav,
        flash_html,
        body_html,
    } = layout;

    let nav = if admin_nav {
        r#"<a href="/admin">Dashboard</a><a href="/admin/pending">Pending</a><form method="post" action="/admin/logout"><button type="submit">Logout</button></form>"#
    } else {
        r#"<a href="/">Articles</a><a href="/create">Create Post</a>"#
    };

    let subtitle_html = subtitle
        .map(|text| format!(r#"<p class="subtitle">{}</p>"#, escape_html(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title} · {SITE_NAME}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{BASE_STYLES}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <a class="brand" href="/">{SITE_NAME}</a>
            <nav>{nav}</nav>
        </div>
    </header>
    <main>
        {flash_html}
        <h1>{heading}</h1>
        {subtitle_html}
{body_html}
        {footer}
    </main>
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        heading = escape_html(heading),
        footer = render_footer(),
    )
}

pub fn render_login_page(error: Option<&str>, email: &str) -> String {
    let flash = error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let body = format!(
        r#"        <section class="panel" style="max-width:420px;">
            <form method="post" action="/admin/login">
                <label for="email">Email</label>
                <input id="email" type="email" name="email" value="{email}" required>
                <label for="password">Password</label>
                <input id="password" type="password" name="password" required>
                <div class="actions"><button type="submit">Sign in</button></div>
            </form>
        </section>"#,
        email = escape_html(email),
    );

    render_page(PageLayout {
        meta_title: "Admin login",
        heading: "Admin login",
        subtitle: Some("Sign in with an administrator account."),
        admin_nav: false,
        flash_html: Cow::Owned(flash),
        body_html: Cow::Owned(body),
    })
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© {year} {SITE_NAME}. All rights reserved.</footer>"#,
        year = current_year
    )
}

/// Flash banner for the `status`/`error` codes carried in redirect query strings.
pub fn compose_flash_message(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "submitted" => "Your article has been submitted successfully and is under review.",
            "approved" => "Post approved.",
            "rejected" => "Post rejected and deleted.",
            "cancelled" => "Rejection cancelled; the post was kept.",
            "logged_in" => "Logged in successfully.",
            "logged_out" => "Logged out successfully.",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "not_authorized" => "That page requires an administrator account.",
            "not_found" => "That article no longer exists.",
            "busy" => "That article is already being processed.",
            "invalid_id" => "Unknown article identifier.",
            _ => "Something went wrong. Please try again.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
