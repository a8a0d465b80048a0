//! Landing page

use axum::{extract::State, response::Html};
use tera::Context;

use crate::{AppState, WebResult};

/// GET /
pub async fn serve_index(State(state): State<AppState>) -> WebResult<Html<String>> {
    let mut context = Context::new();
    context.insert("page", "home");
    state.templates.render("index.html", &context)
}
