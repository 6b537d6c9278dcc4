//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Credentials submitted to the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Response containing a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// The principal bound to the current request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub subject: String,
    pub role: String,
    pub active: bool,
}

/// Administrative status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Envelope returned by the administrative report endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report: String,
    pub requested_by: String,
    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_hides_secret() {
        let req = LoginRequest {
            identifier: "12345678".into(),
            secret: "123tamarindo".into(),
        };
        assert!(!format!("{req:?}").contains("123tamarindo"));
    }

    #[test]
    fn test_login_request_wire_shape() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"identifier":"12345678","secret":"123tamarindo"}"#).unwrap();
        assert_eq!(req.identifier, "12345678");
        assert_eq!(req.secret, "123tamarindo");
    }
}
