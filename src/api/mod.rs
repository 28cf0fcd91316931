pub mod admin;
pub mod announcements;
pub mod client;
pub mod collaborations;
pub mod events;
pub mod help_requests;
pub mod multipart;
pub mod profile;
pub mod projects;
pub mod proposals;

pub use client::{ApiClient, ApiConfig, Body, Method, create_api_client, decode_list};
pub use multipart::Multipart;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::api::{ApiClient, create_api_client};
    use crate::session::{Session, SessionStore};
    use crate::types::Role;

    pub fn client_for(uri: &str, role: Role) -> (ApiClient, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::in_memory());
        store
            .set_session(Session::new("secret", role, 7i64))
            .expect("memory session");
        (create_api_client(uri, store.clone()), store)
    }

    pub async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        tokio::task::spawn_blocking(f).await.expect("blocking task")
    }
}
