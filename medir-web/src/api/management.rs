//! Management page and Entity Store mutations
//!
//! Every mutation redirects back to `/management` and queues a flash
//! message describing what happened, including no-ops such as unknown
//! names or existing links.

use axum::{
    extract::State,
    response::{Html, Redirect},
    Extension, Form,
};
use medir_common::db::NamedEntity;
use medir_common::query;
use medir_common::registry::{
    self, AddOutcome, DeleteOutcome, EntityKind, LinkKind, LinkOutcome, MassLinkReport,
    UnlinkOutcome,
};
use medir_common::session::SessionToken;
use serde::Deserialize;
use std::collections::BTreeSet;
use tera::Context;
use tracing::error;

use crate::flash::Flash;
use crate::{AppState, WebResult};

#[derive(Debug, Deserialize)]
pub struct DoctorForm {
    pub doctor_name: String,
}

#[derive(Debug, Deserialize)]
pub struct InsuranceForm {
    pub insurance_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpecialtyForm {
    pub specialty_name: String,
}

#[derive(Debug, Deserialize)]
pub struct InsuranceLinkForm {
    pub doctor: String,
    pub insurance: String,
}

#[derive(Debug, Deserialize)]
pub struct SpecialtyLinkForm {
    pub doctor: String,
    pub specialty: String,
}

#[derive(Debug, Deserialize)]
pub struct MassLinkForm {
    pub insurance_name: String,
    #[serde(default)]
    pub selected_doctors: Vec<String>,
}

/// GET|POST /management
///
/// Lists both stores side by side: the Entity Store's entities and links,
/// and the Directory Snapshot's doctors and relationships.
pub async fn management_page(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> WebResult<Html<String>> {
    let doctors = registry::list_doctors(&state.db).await?;
    let insurances = registry::list_insurances(&state.db).await?;
    let specialties = registry::list_specialties(&state.db).await?;
    let insurance_links = registry::list_links(&state.db, LinkKind::Insurance).await?;
    let specialty_links = registry::list_links(&state.db, LinkKind::Specialty).await?;

    let document = state.snapshot.load().await;
    let snapshot_doctors = query::doctor_names(&document);
    let snapshot_insurances = query::insurance_names(&document);

    // `/link` also appends to the snapshot, so imported names are offered too
    let link_doctors = merged_names(&doctors, &snapshot_doctors);
    let link_insurances = merged_names(&insurances, &snapshot_insurances);

    let mut context = Context::new();
    context.insert("page", "management");
    context.insert("flashes", &state.flashes.take(&token).await);
    context.insert("doctors", &doctors);
    context.insert("insurances", &insurances);
    context.insert("specialties", &specialties);
    context.insert("insurance_links", &insurance_links);
    context.insert("specialty_links", &specialty_links);
    context.insert("snapshot_path", &state.snapshot.path().display().to_string());
    context.insert("link_doctors", &link_doctors);
    context.insert("link_insurances", &link_insurances);
    context.insert("snapshot_doctors", &snapshot_doctors);
    context.insert("snapshot_insurances", &snapshot_insurances);
    context.insert("snapshot_specialties", &query::specialty_names(&document));
    context.insert("snapshot_relationships", &document.insurance_relationships());
    context.insert(
        "snapshot_specialty_relationships",
        &document.specialty_relationships(),
    );

    state.templates.render("management.html", &context)
}

/// POST /add_doctor
pub async fn add_doctor(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<DoctorForm>,
) -> Redirect {
    add_entity(&state, token, EntityKind::Doctor, &form.doctor_name).await
}

/// POST /add_insurance
pub async fn add_insurance(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<InsuranceForm>,
) -> Redirect {
    add_entity(&state, token, EntityKind::Insurance, &form.insurance_name).await
}

/// POST /add_specialty
pub async fn add_specialty(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<SpecialtyForm>,
) -> Redirect {
    add_entity(&state, token, EntityKind::Specialty, &form.specialty_name).await
}

/// POST /delete_doctor
pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<DoctorForm>,
) -> Redirect {
    delete_entity(&state, token, EntityKind::Doctor, &form.doctor_name).await
}

/// POST /delete_insurance
pub async fn delete_insurance(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<InsuranceForm>,
) -> Redirect {
    delete_entity(&state, token, EntityKind::Insurance, &form.insurance_name).await
}

/// POST /delete_specialty
pub async fn delete_specialty(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<SpecialtyForm>,
) -> Redirect {
    delete_entity(&state, token, EntityKind::Specialty, &form.specialty_name).await
}

/// POST /link
///
/// Links the pair in the Entity Store and appends the insurance to the
/// doctor's Directory Snapshot records. Each store reports separately.
pub async fn link_insurance(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<InsuranceLinkForm>,
) -> Redirect {
    let flash = flash_for(
        registry::link_doctor_insurance(&state.db, &form.doctor, &form.insurance)
            .await
            .map(|outcome| link_flash(LinkKind::Insurance, outcome, &form.doctor, &form.insurance)),
        "link insurance",
    );
    state.flashes.push(token, flash).await;

    let flash = flash_for(
        state
            .snapshot
            .append_insurance(&form.doctor, &form.insurance)
            .await
            .map(|changed| snapshot_flash(changed, &form.doctor, &form.insurance)),
        "update the directory snapshot",
    );
    state.flashes.push(token, flash).await;

    Redirect::to("/management")
}

/// POST /unlink
pub async fn unlink_insurance(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<InsuranceLinkForm>,
) -> Redirect {
    let flash = flash_for(
        registry::unlink_doctor_insurance(&state.db, &form.doctor, &form.insurance)
            .await
            .map(|outcome| unlink_flash(LinkKind::Insurance, outcome, &form.doctor, &form.insurance)),
        "unlink insurance",
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

/// POST /link_specialty
pub async fn link_specialty(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<SpecialtyLinkForm>,
) -> Redirect {
    let flash = flash_for(
        registry::link_doctor_specialty(&state.db, &form.doctor, &form.specialty)
            .await
            .map(|outcome| link_flash(LinkKind::Specialty, outcome, &form.doctor, &form.specialty)),
        "link specialty",
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

/// POST /unlink_specialty
pub async fn unlink_specialty(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<SpecialtyLinkForm>,
) -> Redirect {
    let flash = flash_for(
        registry::unlink_doctor_specialty(&state.db, &form.doctor, &form.specialty)
            .await
            .map(|outcome| unlink_flash(LinkKind::Specialty, outcome, &form.doctor, &form.specialty)),
        "unlink specialty",
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

/// POST /mass_link
///
/// `selected_doctors` repeats once per checked doctor.
pub async fn mass_link(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    axum_extra::extract::Form(form): axum_extra::extract::Form<MassLinkForm>,
) -> Redirect {
    let flash = flash_for(
        registry::mass_link_insurance(&state.db, &form.insurance_name, &form.selected_doctors)
            .await
            .map(|report| mass_link_flash(&form.insurance_name, &report)),
        "mass link",
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

async fn add_entity(state: &AppState, token: SessionToken, kind: EntityKind, name: &str) -> Redirect {
    let flash = flash_for(
        registry::add_entity(&state.db, kind, name)
            .await
            .map(|outcome| match outcome {
                AddOutcome::Created(_) => {
                    Flash::success(format!("Added {} '{}'", kind.table(), name))
                }
                AddOutcome::AlreadyExists(_) => {
                    Flash::info(format!("{} '{}' already exists", kind.label(), name))
                }
            }),
        &format!("add {}", kind.table()),
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

async fn delete_entity(state: &AppState, token: SessionToken, kind: EntityKind, name: &str) -> Redirect {
    let flash = flash_for(
        registry::delete_entity(&state.db, kind, name)
            .await
            .map(|outcome| match outcome {
                DeleteOutcome::Deleted { links_removed } => Flash::success(format!(
                    "Deleted {} '{}' and {} link(s)",
                    kind.table(),
                    name,
                    links_removed
                )),
                DeleteOutcome::NotFound => {
                    Flash::info(format!("{} '{}' not found", kind.label(), name))
                }
            }),
        &format!("delete {}", kind.table()),
    );
    state.flashes.push(token, flash).await;
    Redirect::to("/management")
}

/// Sorted union of Entity Store and snapshot names
fn merged_names<'a>(entities: &'a [NamedEntity], snapshot: &'a [String]) -> BTreeSet<&'a str> {
    entities
        .iter()
        .map(|e| e.name.as_str())
        .chain(snapshot.iter().map(String::as_str))
        .collect()
}

/// Turn an operation result into a flash message, logging unexpected failures
fn flash_for(result: medir_common::Result<Flash>, action: &str) -> Flash {
    match result {
        Ok(flash) => flash,
        Err(medir_common::Error::InvalidInput(message)) => Flash::error(message),
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            Flash::error(format!("Could not {}: {}", action, e))
        }
    }
}

fn link_flash(kind: LinkKind, outcome: LinkOutcome, doctor: &str, target: &str) -> Flash {
    let target_label = kind.target().table();
    match outcome {
        LinkOutcome::Linked => Flash::success(format!("Linked '{}' to {} '{}'", doctor, target_label, target)),
        LinkOutcome::AlreadyLinked => {
            Flash::info(format!("'{}' is already linked to {} '{}'", doctor, target_label, target))
        }
        LinkOutcome::DoctorNotFound => Flash::info(format!("Doctor '{}' not found", doctor)),
        LinkOutcome::TargetNotFound => {
            Flash::info(format!("{} '{}' not found", kind.target().label(), target))
        }
    }
}

fn unlink_flash(kind: LinkKind, outcome: UnlinkOutcome, doctor: &str, target: &str) -> Flash {
    let target_label = kind.target().table();
    match outcome {
        UnlinkOutcome::Unlinked => {
            Flash::success(format!("Unlinked '{}' from {} '{}'", doctor, target_label, target))
        }
        UnlinkOutcome::NotLinked => {
            Flash::info(format!("'{}' was not linked to {} '{}'", doctor, target_label, target))
        }
        UnlinkOutcome::DoctorNotFound => Flash::info(format!("Doctor '{}' not found", doctor)),
        UnlinkOutcome::TargetNotFound => {
            Flash::info(format!("{} '{}' not found", kind.target().label(), target))
        }
    }
}

fn snapshot_flash(changed: usize, doctor: &str, insurance: &str) -> Flash {
    if changed > 0 {
        Flash::success(format!(
            "Directory snapshot: added '{}' to {} record(s) of '{}'",
            insurance, changed, doctor
        ))
    } else {
        Flash::info(format!(
            "Directory snapshot: no record of '{}' was missing '{}'",
            doctor, insurance
        ))
    }
}

fn mass_link_flash(insurance: &str, report: &MassLinkReport) -> Flash {
    let mut message = format!(
        "Linked {} doctor(s) to '{}'",
        report.linked.len(),
        insurance
    );
    if report.insurance_created {
        message.push_str(" (insurance created)");
    }
    if !report.already_linked.is_empty() {
        message.push_str(&format!("; already linked: {}", report.already_linked.join(", ")));
    }
    if !report.unknown_doctors.is_empty() {
        message.push_str(&format!("; unknown: {}", report.unknown_doctors.join(", ")));
    }

    if report.unknown_doctors.is_empty() {
        Flash::success(message)
    } else {
        Flash::info(message)
    }
}
