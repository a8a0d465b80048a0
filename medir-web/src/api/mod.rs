//! HTTP handlers for medir-web

pub mod auth;
pub mod directory;
pub mod health;
pub mod management;
pub mod ui;

pub use auth::{login, login_page, logout, require_session};
pub use directory::{query_page, specialties_page, specialty_doctors, standalone_verify};
pub use health::health_routes;
pub use management::{
    add_doctor, add_insurance, add_specialty, delete_doctor, delete_insurance, delete_specialty,
    link_insurance, link_specialty, management_page, mass_link, unlink_insurance,
    unlink_specialty,
};
pub use ui::serve_index;
