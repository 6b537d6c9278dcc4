//! Request correlation IDs.

use actix_web::{
    Error, HttpMessage,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_INBOUND_LEN: usize = 128;

/// Correlation ID of the current request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Honour an upstream ID (proxy, client) if it is printable and short,
    /// otherwise mint one.
    fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_INBOUND_LEN)
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware function: tag the request, run everything downstream inside a
/// `request_id` span and echo the ID back in the response.
///
/// Install with `App::wrap(actix_web::middleware::from_fn(assign_request_id))`.
pub async fn assign_request_id<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error> {
    let id = RequestId::from_header(req.headers().get(REQUEST_ID_HEADER));
    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!("request_id", id = %id.as_str());
    let mut res = next.call(req).instrument(span).await?;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_is_kept() {
        let value = HeaderValue::from_static("lb-7f3a");
        assert_eq!(RequestId::from_header(Some(&value)).as_str(), "lb-7f3a");
    }

    #[test]
    fn test_oversized_or_blank_id_is_replaced() {
        let long = HeaderValue::from_str(&"x".repeat(MAX_INBOUND_LEN + 1)).unwrap();
        let minted = RequestId::from_header(Some(&long));
        assert!(Uuid::parse_str(minted.as_str()).is_ok());

        let blank = HeaderValue::from_static("  ");
        assert_ne!(RequestId::from_header(Some(&blank)).as_str(), "");
    }
}
