use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    identity::{AuthError, login_error_message},
    web::{
        AppState,
        gate::{GateDecision, resolve_session},
        render_login_page,
    },
};

pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let session = resolve_session(&state, &jar).await;
    if let GateDecision::Admit(_) = state.gate().decide(&session) {
        return Err(Redirect::to("/admin"));
    }

    Ok(Html(render_login_page(None, "")))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, Html<String>)> {
    let session = match state.identity().sign_in(&form.email, &form.password).await {
        Ok(session) => session,
        Err(err) => return Err(login_failure(&err, &form.email)),
    };

    info!(email = %session.identity.email, "admin signed in");

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let remaining = (session.expires_at - Utc::now()).num_seconds().max(0);
    cookie.set_max_age(CookieDuration::seconds(remaining));

    let jar = jar.add(cookie);
    Ok((jar, Redirect::to("/admin?status=logged_in")))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let mut jar = jar;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(token) = Uuid::parse_str(cookie.value()) {
            if let Err(err) = state.identity().sign_out(token).await {
                error!(?err, "failed to remove session during logout");
            }
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));
    jar = jar.remove(removal);

    (jar, Redirect::to("/?status=logged_out"))
}

fn login_failure(err: &AuthError, email: &str) -> (StatusCode, Html<String>) {
    let status = match err {
        AuthError::Backend(_) => {
            error!(?err, "identity provider failed during login");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => {
            warn!(code = err.code(), "admin sign-in rejected");
            StatusCode::UNAUTHORIZED
        }
    };

    let message = login_error_message(err.code());
    (status, Html(render_login_page(Some(message), email)))
}
