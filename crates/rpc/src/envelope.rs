//! Request and response envelopes.
//!
//! Envelopes travel as the transport header; arguments, return values and
//! error messages travel as the transport payload.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(Ulid);

impl CallId {
    /// Create a new random call id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client to server: run `endpoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub id: CallId,
    pub endpoint: String,
    /// Arguments follow as the transport payload.
    #[serde(default)]
    pub has_arguments: bool,
    /// Caller's timeout in seconds.
    pub timeout: f64,
}

impl RequestEnvelope {
    pub fn new(id: CallId, endpoint: impl Into<String>, has_arguments: bool, timeout: Duration) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            has_arguments,
            timeout: timeout.as_secs_f64(),
        }
    }

    /// Caller's timeout, if it is a usable duration.
    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.timeout)
            .ok()
            .filter(|timeout| !timeout.is_zero())
    }
}

/// Server to client: outcome of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub id: CallId,
    pub endpoint: String,
    pub is_error: bool,
    /// A return value follows as the transport payload.
    #[serde(alias = "hasValue")]
    pub has_return: bool,
}

impl ResponseEnvelope {
    /// Successful outcome; `has_return` is false only for "no value".
    #[must_use]
    pub fn success(request: &RequestEnvelope, has_return: bool) -> Self {
        Self {
            id: request.id,
            endpoint: request.endpoint.clone(),
            is_error: false,
            has_return,
        }
    }

    /// Failed outcome; the message follows as the payload.
    #[must_use]
    pub fn error(request: &RequestEnvelope) -> Self {
        Self {
            id: request.id,
            endpoint: request.endpoint.clone(),
            is_error: true,
            has_return: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_serialize_request_in_camel_case() {
        let id = CallId::new();
        let request = RequestEnvelope::new(id, "stuff", true, Duration::from_secs(60));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({ "id": id.to_string(), "endpoint": "stuff", "hasArguments": true, "timeout": 60.0 })
        );
    }

    #[test]
    fn should_read_timeout_in_seconds() {
        let request = RequestEnvelope::new(CallId::new(), "e", false, Duration::from_millis(1500));
        assert_eq!(request.timeout_duration(), Some(Duration::from_millis(1500)));

        let mut bad = request;
        bad.timeout = -1.0;
        assert_eq!(bad.timeout_duration(), None);
        bad.timeout = 0.0;
        assert_eq!(bad.timeout_duration(), None);
        bad.timeout = f64::NAN;
        assert_eq!(bad.timeout_duration(), None);
    }

    #[test]
    fn should_accept_has_value_alias() {
        let id = CallId::new();
        let response: ResponseEnvelope = serde_json::from_value(json!({
            "id": id.to_string(),
            "endpoint": "stuff",
            "isError": false,
            "hasValue": true
        }))
        .unwrap();

        assert!(response.has_return);
        assert_eq!(response.id, id);
    }

    #[test]
    fn should_never_mark_errors_as_returning() {
        let request = RequestEnvelope::new(CallId::new(), "stuff", false, Duration::from_secs(1));
        let response = ResponseEnvelope::error(&request);

        assert!(response.is_error);
        assert!(!response.has_return);
        assert!(ResponseEnvelope::success(&request, true).has_return);
    }
}
