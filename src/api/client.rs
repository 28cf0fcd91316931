//! Backend API client
//!
//! Single entry point for every call to the platform backend:
//! - attaches the bearer token held by the session store
//! - turns 401/403 into a forced logout
//! - keeps error payloads verbatim for display
//!
//! Nothing is cached and nothing is retried.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;

use crate::api::multipart::Multipart;
use crate::error::{ServiceError, ServiceResult};
use crate::metadata::USER_AGENT;
use crate::session::SessionStore;
use crate::types::Blob;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

pub enum Body {
    Json(Value),
    Multipart(Multipart),
}

impl Body {
    pub fn json<T: Serialize>(value: &T) -> ServiceResult<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn send(&self, method: Method, path: &str, body: Option<Body>) -> ServiceResult<ureq::Response> {
        let url = self.url(path);
        let mut request = self.agent.request(method.as_str(), &url);

        if let Some(token) = self.session.token() {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        let result = match body {
            None => request.call(),
            Some(Body::Json(value)) => request.send_json(value),
            Some(Body::Multipart(form)) => request
                .set("Content-Type", &form.content_type())
                .send_bytes(&form.to_bytes()),
        };

        match result {
            Ok(response) => {
                tracing::debug!(method = method.as_str(), path, status = response.status(), "request ok");
                Ok(response)
            }
            Err(ureq::Error::Status(status, response)) => {
                tracing::debug!(method = method.as_str(), path, status, "request failed");
                Err(self.status_error(status, response))
            }
            Err(ureq::Error::Transport(transport)) => {
                tracing::warn!(method = method.as_str(), path, "transport error: {transport}");
                Err(ServiceError::Network(format!(
                    "Failed to reach {}: {}",
                    url, transport
                )))
            }
        }
    }

    fn status_error(&self, status: u16, response: ureq::Response) -> ServiceError {
        if status == 401 || status == 403 {
            if let Err(e) = self.session.clear() {
                tracing::error!("failed to clear session after HTTP {status}: {e}");
            }
            tracing::info!("backend answered {status}, session cleared");
            return ServiceError::AuthExpired { status };
        }
        let payload = match response.into_string() {
            Ok(text) if text.trim().is_empty() => Value::Null,
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(e) => Value::String(format!("unreadable error body: {e}")),
        };
        ServiceError::Api { status, payload }
    }

    /// Issues a request and returns the decoded JSON body (`null` when empty).
    pub fn request(&self, method: Method, path: &str, body: Option<Body>) -> ServiceResult<Value> {
        let response = self.send(method, path, body)?;
        let text = response
            .into_string()
            .map_err(|e| ServiceError::Network(format!("Failed to read response: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
    ) -> ServiceResult<T> {
        let value = self.request(method, path, body)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Lists may come back bare or wrapped in a paginated `results` envelope.
    pub fn get_list<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<Vec<T>> {
        let value = self.request(Method::Get, path, None)?;
        decode_list(value)
    }

    pub fn get_blob(&self, path: &str) -> ServiceResult<Blob> {
        let response = self.send(Method::Get, path, None)?;
        let content_type = response.content_type().to_string();
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(Blob {
            content_type,
            bytes,
        })
    }
}

pub fn decode_list<T: DeserializeOwned>(value: Value) -> ServiceResult<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) if map.contains_key("results") => {
            let results = map.remove("results").unwrap_or(Value::Null);
            Ok(serde_json::from_value(results)?)
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Accepts "localhost:8000/api" as well as full URLs.
pub fn create_api_client(connection_string: &str, session: Arc<SessionStore>) -> ApiClient {
    let base_url = if connection_string.starts_with("http") {
        connection_string.to_string()
    } else {
        format!("http://{}", connection_string)
    };

    ApiClient::new(ApiConfig { base_url }, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::types::Role;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn logged_in(role: Role) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::in_memory());
        store.set_session(Session::new("secret", role, 1i64)).unwrap();
        store
    }

    async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[test]
    fn test_connection_string_parsing() {
        let store = Arc::new(SessionStore::in_memory());
        let client = create_api_client("localhost:8000/api/", store.clone());
        assert_eq!(client.base_url(), "http://localhost:8000/api");

        let client2 = create_api_client("https://fund.example.org/api", store);
        assert_eq!(client2.url("/projects/"), "https://fund.example.org/api/projects/");
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_api_client(&server.uri(), logged_in(Role::Admin));
        let value = blocking(move || client.request(Method::Get, "/projects/", None)).await;
        assert_eq!(value.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn unauthorized_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&server)
            .await;

        let store = logged_in(Role::Admin);
        let client = create_api_client(&server.uri(), store.clone());
        let err = blocking(move || client.request(Method::Get, "/admin/users", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AuthExpired { status: 401 }));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn forbidden_is_treated_like_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = logged_in(Role::Investor);
        let client = create_api_client(&server.uri(), store.clone());
        let err = blocking(move || client.request(Method::Delete, "/events/3/", None))
            .await
            .unwrap_err();
        assert!(err.is_auth_expired());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn api_errors_keep_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"title": ["This field is required."]})),
            )
            .mount(&server)
            .await;

        let store = logged_in(Role::Association);
        let client = create_api_client(&server.uri(), store.clone());
        let err = blocking(move || {
            client.request(Method::Post, "/events/", Some(Body::Json(json!({}))))
        })
        .await
        .unwrap_err();
        match err {
            ServiceError::Api { status, payload } => {
                assert_eq!(status, 400);
                assert_eq!(payload, json!({"title": ["This field is required."]}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn plain_text_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = create_api_client(&server.uri(), logged_in(Role::Admin));
        let err = blocking(move || client.request(Method::Get, "/contracts/", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 500, payload: Value::String(ref s) } if s == "boom"));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/events/4/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = create_api_client(&server.uri(), logged_in(Role::Association));
        let value = blocking(move || client.request(Method::Delete, "/events/4/", None)).await;
        assert_eq!(value.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn no_session_sends_no_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [1, 2]})))
            .mount(&server)
            .await;

        let client = create_api_client(&server.uri(), Arc::new(SessionStore::in_memory()));
        let list: Vec<i64> = blocking(move || client.get_list("/events/")).await.unwrap();
        assert_eq!(list, vec![1, 2]);
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let client = create_api_client("http://127.0.0.1:1", Arc::new(SessionStore::in_memory()));
        let err = blocking(move || client.request(Method::Get, "/projects/", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Network(_)));
    }
}
