//! Marketing-readiness survey for food-service businesses: a step-by-step
//! questionnaire, a marketing health score, report mailing and storage, and
//! an admin dashboard with CSV export.

pub mod admin;
pub mod config;
pub mod error;
pub mod survey;
pub mod telemetry;
