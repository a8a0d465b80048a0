//! Public directory pages: specialty listing and snapshot search

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use medir_common::db::SpecialtyDoctor;
use medir_common::query::{self, SearchQuery};
use medir_common::registry;
use tera::Context;
use tracing::debug;

use crate::{AppState, WebResult};

/// GET /specialties
pub async fn specialties_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let specialties: Vec<String> = registry::list_specialties(&state.db)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();

    let mut context = Context::new();
    context.insert("page", "specialties");
    context.insert("specialties", &specialties);
    state.templates.render("specialties.html", &context)
}

/// GET /specialty/:name
///
/// Doctors holding the specialty in the Entity Store, each with their
/// insurances. An unknown specialty yields an empty list.
pub async fn specialty_doctors(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> WebResult<Json<Vec<SpecialtyDoctor>>> {
    Ok(Json(registry::specialty_directory(&state.db, &name).await?))
}

/// GET /query_page
pub async fn query_page(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> WebResult<Html<String>> {
    render_search(&state, "query.html", "query", &search).await
}

/// GET /standalone_verify
///
/// Same search as `/query_page` in a self-contained page.
pub async fn standalone_verify(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> WebResult<Html<String>> {
    render_search(&state, "standalone.html", "standalone", &search).await
}

async fn render_search(
    state: &AppState,
    template: &str,
    page: &str,
    search: &SearchQuery,
) -> WebResult<Html<String>> {
    let document = state.snapshot.load().await;
    let matching_doctors = query::run_query(&document, search);

    if let Some((kind, value)) = search.resolve() {
        debug!("Search {:?} '{}': {} match(es)", kind, value, matching_doctors.len());
    }

    let mut context = Context::new();
    context.insert("page", page);
    context.insert("doctors", &query::doctor_names(&document));
    context.insert("insurances", &query::insurance_names(&document));
    context.insert("specialties", &query::specialty_names(&document));
    context.insert("known_specialties", state.known_specialties.as_slice());
    context.insert("insurance_query", search.insurance_query.as_deref().unwrap_or(""));
    context.insert("doctor_query", search.doctor_query.as_deref().unwrap_or(""));
    context.insert("specialty_query", search.specialty_query.as_deref().unwrap_or(""));
    context.insert("searched", &search.resolve().is_some());
    context.insert("matching_doctors", &matching_doctors);

    state.templates.render(template, &context)
}
