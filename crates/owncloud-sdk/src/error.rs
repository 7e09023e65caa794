// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · error
// ──────────────────────────────────────────────────────────────────────────────
// Error taxonomy shared by every operation in the crate:
//  • pre-flight errors (missing authorization / argument / bad config)
//  • transport errors (unexpected HTTP status, network failure)
//  • service errors (OCS envelope with a failing embedded status code)
//  • parse errors (malformed XML or unexpected document shape)
// ──────────────────────────────────────────────────────────────────────────────

use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;

/// Status codes every WebDAV-style operation treats as success.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 204, 207];

/// Message of the pre-flight rejection raised when no credential is set.
pub const AUTHORIZATION_REQUIRED: &str = "Please specify an authorization first.";

/// Convenience alias.
pub type OcResult<T> = Result<T, OcError>;

/// Whether `status` is in the success allow-list.
pub fn is_success(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

// ── HttpError ────────────────────────────────────────────────────────────────

/// A non-allow-listed HTTP response, with the raw body preserved unparsed.
///
/// Only [`HttpError::from_response`] builds one; feature modules never
/// assemble it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpError {
    status_code: u16,
    message: String,
    body: String,
}

impl HttpError {
    /// Map a status code and raw body into an `HttpError`.
    ///
    /// The message is the `<s:message>` of a Sabre/DAV error document when
    /// the body happens to be one, otherwise the canonical reason phrase.
    pub fn from_response(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = dav_error_message(&body)
            .or_else(|| {
                StatusCode::from_u16(status_code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", status_code));

        Self {
            status_code,
            message,
            body,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status_code, self.message)
    }
}

impl std::error::Error for HttpError {}

/// Pull `<s:message>` out of a `<d:error>` body. Anything else yields `None`.
fn dav_error_message(body: &str) -> Option<String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    if !body.trim_start().starts_with('<') {
        return None;
    }

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut saw_error_root = false;
    let mut in_message = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"error" => saw_error_root = true,
                    b"message" if saw_error_root => in_message = true,
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if in_message => {
                return t.unescape().ok().map(|m| m.into_owned());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"message" => in_message = false,
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

// ── OcError ──────────────────────────────────────────────────────────────────

/// Coarse classification of an [`OcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Rejected before any request was issued.
    PreFlight,
    /// The transport failed or answered with a non-allow-listed status.
    Transport,
    /// OCS answered HTTP success but embedded a failing status code.
    Service,
    /// The response body could not be understood.
    Parse,
}

/// Every public operation resolves with a value or one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OcError {
    #[error("Please specify an authorization first.")]
    MissingAuthorization,

    #[error("No {name} given for {operation}")]
    MissingArgument {
        name: &'static str,
        operation: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Http(HttpError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Service { status_code: u32, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl OcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAuthorization | Self::MissingArgument { .. } | Self::InvalidConfig(_) => {
                ErrorKind::PreFlight
            }
            Self::Http(_) | Self::Network(_) => ErrorKind::Transport,
            Self::Service { .. } => ErrorKind::Service,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }

    /// HTTP status of a mapped transport error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => Some(e.status_code()),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn missing(name: &'static str, operation: &'static str) -> Self {
        Self::MissingArgument { name, operation }
    }
}

impl From<HttpError> for OcError {
    fn from(err: HttpError) -> Self {
        Self::Http(err)
    }
}

impl From<reqwest::Error> for OcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {}", err))
        } else if err.is_builder() {
            Self::InvalidConfig(format!("cannot build request: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<quick_xml::Error> for OcError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<url::ParseError> for OcError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(format!("invalid URL: {}", err))
    }
}

impl From<serde_json::Error> for OcError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(format!("JSON error: {}", err))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_allow_list() {
        for code in [200, 201, 204, 207] {
            assert!(is_success(code));
        }
        for code in [202, 301, 400, 401, 404, 412, 500] {
            assert!(!is_success(code));
        }
    }

    #[test]
    fn from_response_keeps_plain_body() {
        let err = HttpError::from_response(404, "not here");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.body(), "not here");
    }

    #[test]
    fn from_response_reads_sabre_message() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns">
  <s:exception>Sabre\DAV\Exception\NotFound</s:exception>
  <s:message>File with name foo could not be located</s:message>
</d:error>"#;
        let err = HttpError::from_response(404, body);
        assert_eq!(err.message(), "File with name foo could not be located");
        assert_eq!(err.body(), body);
    }

    #[test]
    fn from_response_unknown_code() {
        let err = HttpError::from_response(599, "");
        assert_eq!(err.message(), "HTTP 599");
    }

    #[test]
    fn from_response_ignores_non_dav_xml() {
        let err = HttpError::from_response(500, "<html><body>boom</body></html>");
        assert_eq!(err.message(), "Internal Server Error");
    }

    #[test]
    fn missing_authorization_literal_message() {
        assert_eq!(OcError::MissingAuthorization.to_string(), AUTHORIZATION_REQUIRED);
    }

    #[test]
    fn missing_argument_message() {
        let err = OcError::missing("fileId", "restore");
        assert_eq!(err.to_string(), "No fileId given for restore");
        assert_eq!(err.kind(), ErrorKind::PreFlight);
    }

    #[test]
    fn kinds() {
        assert_eq!(
            OcError::Http(HttpError::from_response(500, "")).kind(),
            ErrorKind::Transport
        );
        assert_eq!(OcError::Network("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(
            OcError::Service {
                status_code: 999,
                message: "x".into()
            }
            .kind(),
            ErrorKind::Service
        );
        assert_eq!(OcError::Parse("x".into()).kind(), ErrorKind::Parse);
    }

    #[test]
    fn http_status_accessor() {
        let err: OcError = HttpError::from_response(403, "denied").into();
        assert_eq!(err.http_status(), Some(403));
        assert_eq!(err.as_http().map(HttpError::body), Some("denied"));
        assert_eq!(OcError::MissingAuthorization.http_status(), None);
    }
}
