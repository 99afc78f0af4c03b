//! Presentation of a finished [`DashboardReport`](crate::domain::report::DashboardReport):
//! plain-text tables, JSON, and the downloadable ZIP bundle.

pub mod bundle;
pub mod render;

pub use bundle::build_bundle;
pub use render::render_report;
