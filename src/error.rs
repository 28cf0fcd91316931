use serde_json::Value;
use thiserror::Error;
use tokio::io;

use crate::validation::ValidationErrors;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend rejected the credentials (401/403). The session has
    /// already been cleared when this is returned.
    #[error("session expired or not authorized (HTTP {status})")]
    AuthExpired { status: u16 },
    /// Any other 4xx/5xx response, carrying the backend payload verbatim.
    #[error("{}", describe_payload(*status, payload))]
    Api { status: u16, payload: Value },
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("network error: {0}")]
    Network(String),
    #[error("load cancelled")]
    Cancelled,
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ServiceError::AuthExpired { .. })
    }

    /// Message suitable for showing to the user next to the failed view.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

/// Flattens the usual backend error shapes (`detail`, `message`, `error`,
/// or a field -> messages map) into one line.
pub fn describe_payload(status: u16, payload: &Value) -> String {
    match payload {
        Value::Null => format!("HTTP {status}"),
        Value::String(s) if s.trim().is_empty() => format!("HTTP {status}"),
        Value::String(s) => format!("HTTP {status}: {s}"),
        Value::Object(map) => {
            for key in ["detail", "message", "error"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return format!("HTTP {status}: {s}");
                }
            }
            let mut parts = Vec::new();
            for (field, value) in map {
                let text = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join(", "),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                parts.push(format!("{field}: {text}"));
            }
            if parts.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", parts.join("; "))
            }
        }
        other => format!("HTTP {status}: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_is_preferred() {
        let payload = json!({"detail": "Not found.", "code": "missing"});
        assert_eq!(describe_payload(404, &payload), "HTTP 404: Not found.");
    }

    #[test]
    fn field_errors_are_joined() {
        let payload = json!({"email": ["This field is required."], "role": "invalid"});
        let text = describe_payload(400, &payload);
        assert!(text.contains("email: This field is required."));
        assert!(text.contains("role: invalid"));
    }

    #[test]
    fn empty_payload_keeps_status() {
        assert_eq!(describe_payload(500, &Value::Null), "HTTP 500");
        let err = ServiceError::Api {
            status: 502,
            payload: json!(""),
        };
        assert_eq!(err.user_message(), "HTTP 502");
    }
}
