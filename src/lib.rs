//! Client core for the community project funding platform.
//!
//! The session store, API client, route guard and collaboration aggregator
//! are usable on their own; the dashboards combine them into role views.

pub mod aggregate;
pub mod api;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod metadata;
pub mod session;
pub mod types;
pub mod validation;

pub use aggregate::{CollaborationGroups, GroupedCollaboration, group_by_counterparty};
pub use api::{ApiClient, ApiConfig, create_api_client};
pub use error::{ServiceError, ServiceResult};
pub use guard::{GuardOutcome, RouteGuard};
pub use session::{FileBackend, MemoryBackend, Session, SessionBackend, SessionStore};
pub use types::Role;
