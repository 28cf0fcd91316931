//! Role dashboards and the load plumbing they share.
//!
//! A dashboard owns one [`Loadable`] per independent fetch. Fetches issued
//! together run concurrently and each one only writes its own field, so a
//! failure in one never cancels or corrupts the others.

pub mod admin;
pub mod association;
pub mod entrepreneur;
pub mod investor;
pub mod profile;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::{ServiceError, ServiceResult};

pub use admin::AdminDashboard;
pub use association::AssociationDashboard;
pub use entrepreneur::EntrepreneurDashboard;
pub use investor::InvestorDashboard;
pub use profile::ProfileView;

/// What the surrounding navigation should do after a load or an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Login,
}

impl Navigation {
    pub fn merge(self, other: Navigation) -> Navigation {
        if self == Navigation::Login || other == Navigation::Login {
            Navigation::Login
        } else {
            Navigation::Stay
        }
    }

    pub fn after_error(err: &ServiceError) -> Navigation {
        if err.is_auth_expired() {
            Navigation::Login
        } else {
            Navigation::Stay
        }
    }
}

/// State of one fetch: in flight, loaded, or failed with a message.
#[derive(Clone, Debug, PartialEq)]
pub struct Loadable<T> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    failure: Option<(u16, Value)>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
            failure: None,
        }
    }
}

impl<T> Loadable<T> {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.failure = None;
    }

    /// Folds a finished fetch into the state. A cancelled fetch changes
    /// nothing: the view it belonged to is gone.
    pub fn apply(&mut self, result: ServiceResult<T>) -> Navigation {
        match result {
            Ok(data) => {
                self.loading = false;
                self.data = Some(data);
                self.error = None;
                self.failure = None;
                Navigation::Stay
            }
            Err(ServiceError::Cancelled) => {
                self.loading = false;
                Navigation::Stay
            }
            Err(err) => {
                self.loading = false;
                let nav = Navigation::after_error(&err);
                if nav == Navigation::Stay {
                    tracing::warn!("load failed: {err}");
                    self.error = Some(err.user_message());
                    if let ServiceError::Api { status, payload } = err {
                        self.failure = Some((status, payload));
                    }
                }
                nav
            }
        }
    }

    /// The loaded data, or the error that kept it from loading. Actions that
    /// work on a loaded list go through here so a failed load is reported
    /// as itself.
    pub fn require(&self, what: &str) -> ServiceResult<&T> {
        if let Some(data) = &self.data {
            return Ok(data);
        }
        if let Some((status, payload)) = &self.failure {
            return Err(ServiceError::Api {
                status: *status,
                payload: payload.clone(),
            });
        }
        match &self.error {
            Some(message) => Err(ServiceError::Other(message.clone())),
            None => Err(ServiceError::Other(format!("{what} are not loaded"))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }
}

/// Lifetime of a mounted view. Unmounting cancels every pending fetch; the
/// HTTP call itself may still finish but its result is dropped.
#[derive(Clone)]
pub struct ViewScope {
    client: ApiClient,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            token: CancellationToken::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Runs a blocking client call off the async runtime, racing it against
    /// the unmount signal.
    pub async fn fetch<T, F>(&self, call: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ApiClient) -> ServiceResult<T> + Send + 'static,
    {
        if self.token.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        let client = self.client.clone();
        let task = tokio::task::spawn_blocking(move || call(&client));
        tokio::select! {
            _ = self.token.cancelled() => Err(ServiceError::Cancelled),
            joined = task => joined
                .map_err(|e| ServiceError::Other(format!("load task failed: {e}")))?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loadable_transitions() {
        let mut state: Loadable<u32> = Loadable::default();
        state.begin();
        assert!(state.loading);

        assert_eq!(
            state.apply(Err(ServiceError::Api {
                status: 500,
                payload: json!({"detail": "down"}),
            })),
            Navigation::Stay
        );
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("HTTP 500: down"));

        state.begin();
        assert_eq!(state.apply(Ok(3)), Navigation::Stay);
        assert_eq!(state.data, Some(3));
        assert!(state.error.is_none());
    }

    #[test]
    fn auth_expiry_asks_for_login() {
        let mut state: Loadable<u32> = Loadable::default();
        state.begin();
        assert_eq!(
            state.apply(Err(ServiceError::AuthExpired { status: 401 })),
            Navigation::Login
        );
        assert!(state.error.is_none());
    }

    #[test]
    fn cancelled_result_is_ignored() {
        let mut state: Loadable<u32> = Loadable::default();
        state.begin();
        assert_eq!(state.apply(Err(ServiceError::Cancelled)), Navigation::Stay);
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn require_reports_the_failed_load() {
        let mut state: Loadable<Vec<u32>> = Loadable::default();
        assert!(matches!(state.require("Items"), Err(ServiceError::Other(m)) if m == "Items are not loaded"));

        state.begin();
        state.apply(Err(ServiceError::Api {
            status: 500,
            payload: json!({"detail": "db down"}),
        }));
        match state.require("Items") {
            Err(ServiceError::Api { status, payload }) => {
                assert_eq!(status, 500);
                assert_eq!(payload, json!({"detail": "db down"}));
            }
            other => panic!("unexpected: {other:?}"),
        }

        state.begin();
        state.apply(Err(ServiceError::Network("refused".into())));
        assert!(matches!(state.require("Items"), Err(ServiceError::Other(m)) if m.contains("refused")));

        state.begin();
        state.apply(Ok(vec![1]));
        assert_eq!(state.require("Items").unwrap(), &vec![1]);
    }
}
