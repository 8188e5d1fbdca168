//! Operator-facing view over persisted surveys: the password gate, the
//! dashboard state with its refresh timer, and CSV export.

pub mod auth;
pub mod dashboard;
pub mod export;

pub use auth::{AdminGate, AdminSession, AuthError};
pub use dashboard::{
    filter_results, summarize, AdminDashboard, DashboardError, DashboardStats, ExportScope,
};
pub use export::{export_csv, export_file_name, CsvExport, ExportError, CSV_HEADERS};
