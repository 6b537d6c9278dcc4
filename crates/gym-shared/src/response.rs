//! RFC 7807 problem details, the body of every error response.
//!
//! Bodies describe the class of failure only. Which credential check failed,
//! and why a store lookup broke, stay in the server logs.

use serde::{Deserialize, Serialize};

/// Problem details object (`application/problem+json` shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Correlates the response with server logs (`X-Request-ID`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            request_id: None,
        }
    }

    /// A problem whose title is the standard reason phrase for `status`.
    pub fn for_status(status: u16) -> Self {
        let title = match status {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Error",
        };
        Self::new(status, title)
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    pub fn with_instance(self, instance: impl Into<String>) -> Self {
        Self {
            instance: Some(instance.into()),
            ..self
        }
    }

    pub fn with_request_id(self, request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..self
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::for_status(400).with_detail(detail)
    }

    /// Any credential failure, without saying which.
    pub fn unauthorized() -> Self {
        Self::for_status(401)
    }

    pub fn forbidden() -> Self {
        Self::for_status(403).with_detail("Your role does not grant access to this resource.")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::for_status(404).with_detail(detail)
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self::for_status(429).with_detail(format!(
            "Too many login attempts. Try again in {retry_after_secs} seconds."
        ))
    }

    pub fn internal_error() -> Self {
        Self::for_status(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_shape() {
        let body = serde_json::to_value(ErrorResponse::unauthorized().with_request_id("r-1")).unwrap();

        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Unauthorized");
        assert_eq!(body["status"], 401);
        assert_eq!(body["request_id"], "r-1");
        assert!(body.get("detail").is_none());
        assert!(body.get("instance").is_none());
    }

    #[test]
    fn test_titles_follow_status() {
        assert_eq!(ErrorResponse::internal_error().title, "Internal Server Error");
        assert_eq!(ErrorResponse::for_status(418).title, "Error");
    }

    #[test]
    fn test_parses_minimal_problem() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"type":"about:blank","title":"Forbidden","status":403}"#)
                .unwrap();
        assert_eq!(parsed.status, 403);
        assert_eq!(parsed.detail, None);
    }
}
