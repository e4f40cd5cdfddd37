//! Core library for the attendance report: API access, aggregation and rendering.

pub mod aggregate;
pub mod api;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod roster;
pub mod runtime;
pub mod secret_store;
pub mod window;

pub use aggregate::{ParticipationMatrix, fetch_participation};
pub use api::{AttendanceApi, HttpApi, Session};
pub use credentials::{Credentials, load_credentials, resolve_credentials_path};
pub use error::{Error, Result};
pub use model::{Event, EventMember, Mark, Member, ParticipationRecord};
pub use report::{ReportOptions, Row, render_report, write_report};
pub use runtime::{ReportRequest, ReportSummary, run_cli, run_report};
pub use window::{EventWindow, fetch_window, select_events};
