//! Management login, logout and the session middleware
//!
//! The session token lives in the `medir_session` cookie. The middleware
//! only reads it; the token is never renewed here unless the gate is
//! configured to renew on use.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use medir_common::session::SessionToken;
use serde::Deserialize;
use tera::Context;
use tracing::debug;

use crate::{AppState, WebResult};

/// Cookie carrying the management session token
pub const SESSION_COOKIE: &str = "medir_session";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Session token from the request cookies, if well-formed
pub fn session_token(jar: &CookieJar) -> Option<SessionToken> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| SessionToken::parse(cookie.value()))
}

/// Redirects to `/login` unless the request carries a live session
///
/// On success the token is added to the request extensions for the
/// handlers that queue flash messages. A stale token's undelivered
/// messages are dropped.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match session_token(&jar) {
        Some(token) if state.sessions.is_authenticated(&token).await => {
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        stale => {
            if let Some(token) = stale {
                state.flashes.discard(&token).await;
            }
            debug!("No valid session for {}, redirecting to login", request.uri().path());
            Redirect::to("/login").into_response()
        }
    }
}

/// GET /login
pub async fn login_page(State(state): State<AppState>) -> WebResult<Response> {
    let mut context = Context::new();
    context.insert("page", "login");
    Ok(state.templates.render("login.html", &context)?.into_response())
}

/// POST /login
///
/// Correct password: start a session and go to the management page.
/// Wrong password: show the form again with an error.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    // Sessions that expired without returning to /management leave messages behind
    let expired = state.sessions.purge_expired().await;
    state.flashes.discard_all(&expired).await;

    let Some(token) = state.sessions.authenticate(&form.password).await else {
        let mut context = Context::new();
        context.insert("page", "login");
        context.insert("error", "Incorrect password");
        let page = state.templates.render("login.html", &context)?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    };

    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Redirect::to("/management")).into_response())
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = session_token(&jar) {
        state.sessions.revoke(&token).await;
        state.flashes.discard(&token).await;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
