// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · session
// ──────────────────────────────────────────────────────────────────────────────
// Per-client mutable state:
//  • the Authorization header value and user-supplied extra headers
//  • current-user descriptor
//  • capability cache with its uninitialized → fetched → invalidated cycle
// Every setter replaces a whole value under one lock; readers never see a
// half-updated session.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{OcError, OcResult};
use crate::types::{Capabilities, UserInfo};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const OCS_API_REQUEST: HeaderName = HeaderName::from_static("ocs-apirequest");

/// `"Bearer <token>"`.
pub fn bearer_authorization(token: &str) -> String {
    format!("Bearer {}", token)
}

/// `"Basic base64(<username>:<password>)"`.
pub fn basic_authorization(username: &str, password: &str) -> String {
    let raw = format!("{}:{}", username, password);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
    )
}

/// Convert a plain name → value map into a validated `HeaderMap`.
pub fn header_map(headers: &BTreeMap<String, String>) -> OcResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| OcError::InvalidConfig(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| OcError::InvalidConfig(format!("header {}: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

// ── CacheState ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CacheState {
    #[default]
    Uninitialized,
    Fetched,
    Invalidated,
}

// ── Session ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SessionState {
    authorization: Option<HeaderValue>,
    headers: HeaderMap,
    current_user: Option<UserInfo>,
    capabilities: Option<Arc<Capabilities>>,
    cache: CacheState,
}

/// Credentials, extra headers, current user and cached capabilities of
/// one client. Independent sessions never share state.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Authorization ────────────────────────────────────────────────────

    /// Store a pre-encoded `Authorization` value verbatim.
    pub fn set_authorization(&self, value: &str) -> OcResult<()> {
        let mut header = HeaderValue::from_str(value)
            .map_err(|e| OcError::InvalidConfig(format!("authorization value: {}", e)))?;
        header.set_sensitive(true);
        self.write().authorization = Some(header);
        Ok(())
    }

    pub fn authorization(&self) -> Option<String> {
        self.read()
            .authorization
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn has_authorization(&self) -> bool {
        self.read().authorization.is_some()
    }

    pub fn clear_authorization(&self) {
        self.write().authorization = None;
    }

    // ── Headers ──────────────────────────────────────────────────────────

    /// Replace the extra headers sent with every request.
    pub fn set_headers(&self, headers: HeaderMap) {
        self.write().headers = headers;
    }

    pub fn headers(&self) -> HeaderMap {
        self.read().headers.clone()
    }

    /// Default headers, then user headers (winning on conflicts), then the
    /// credential when `include_auth` is set and one is stored.
    pub fn build_headers(&self, include_auth: bool) -> HeaderMap {
        let state = self.read();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
        headers.insert(OCS_API_REQUEST, HeaderValue::from_static("true"));
        for (name, value) in state.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if include_auth {
            if let Some(auth) = &state.authorization {
                headers.insert(AUTHORIZATION, auth.clone());
            }
        }
        headers
    }

    // ── Current user ─────────────────────────────────────────────────────

    pub fn set_current_user(&self, user: Option<UserInfo>) {
        self.write().current_user = user;
    }

    /// Store a user returned by the server; moves the cache to `Fetched`.
    pub fn store_fetched_user(&self, user: UserInfo) {
        let mut state = self.write();
        state.current_user = Some(user);
        state.cache = CacheState::Fetched;
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.read().current_user.clone()
    }

    // ── Capabilities ─────────────────────────────────────────────────────

    /// Last writer wins; moves the cache to `Fetched`.
    pub fn store_capabilities(&self, caps: Capabilities) -> Arc<Capabilities> {
        let caps = Arc::new(caps);
        let mut state = self.write();
        state.capabilities = Some(Arc::clone(&caps));
        state.cache = CacheState::Fetched;
        caps
    }

    pub fn capabilities(&self) -> Option<Arc<Capabilities>> {
        self.read().capabilities.clone()
    }

    pub fn cache_state(&self) -> CacheState {
        self.read().cache
    }

    /// Logout: drop the credential, current user and capabilities.
    pub fn invalidate(&self) {
        let mut state = self.write();
        state.authorization = None;
        state.current_user = None;
        state.capabilities = None;
        state.cache = CacheState::Invalidated;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_set_and_built() {
        let session = Session::new();
        session.set_authorization("Bearer abc").unwrap();
        let headers = session.build_headers(true);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(session.authorization().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn no_credential_no_authorization_header() {
        let session = Session::new();
        assert!(session.authorization().is_none());
        let headers = session.build_headers(true);
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), XML_CONTENT_TYPE);
        assert_eq!(headers.get(OCS_API_REQUEST).unwrap(), "true");
    }

    #[test]
    fn include_auth_false_omits_credential() {
        let session = Session::new();
        session.set_authorization("Bearer abc").unwrap();
        assert!(session.build_headers(false).get(AUTHORIZATION).is_none());
    }

    #[test]
    fn user_headers_override_defaults() {
        let session = Session::new();
        let mut extra = BTreeMap::new();
        extra.insert("Content-Type".to_string(), "text/plain".to_string());
        extra.insert("X-Trace".to_string(), "1".to_string());
        session.set_headers(header_map(&extra).unwrap());

        let headers = session.build_headers(true);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let session = Session::new();
        assert!(session.set_authorization("Bearer a\nb").is_err());
        assert!(session.authorization().is_none());

        let mut extra = BTreeMap::new();
        extra.insert("bad header".to_string(), "x".to_string());
        assert!(header_map(&extra).is_err());
    }

    #[test]
    fn basic_encoding() {
        assert_eq!(basic_authorization("public", "secret"), "Basic cHVibGljOnNlY3JldA==");
        assert_eq!(bearer_authorization("t"), "Bearer t");
    }

    #[test]
    fn cache_lifecycle() {
        let session = Session::new();
        assert_eq!(session.cache_state(), CacheState::Uninitialized);

        let first = session.store_capabilities(Capabilities::default());
        assert_eq!(session.cache_state(), CacheState::Fetched);
        assert!(Arc::ptr_eq(&first, &session.capabilities().unwrap()));

        let second = session.store_capabilities(Capabilities::default());
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &session.capabilities().unwrap()));

        session.set_authorization("Bearer abc").unwrap();
        session.set_current_user(Some(UserInfo::new("alice")));
        session.invalidate();
        assert_eq!(session.cache_state(), CacheState::Invalidated);
        assert!(session.capabilities().is_none());
        assert!(session.current_user().is_none());
        assert!(session.authorization().is_none());

        session.store_capabilities(Capabilities::default());
        assert_eq!(session.cache_state(), CacheState::Fetched);
    }

    #[test]
    fn fetched_user_marks_cache_fetched() {
        let session = Session::new();
        session.set_current_user(Some(UserInfo::new("alice")));
        assert_eq!(session.cache_state(), CacheState::Uninitialized);

        session.store_fetched_user(UserInfo::new("bob"));
        assert_eq!(session.cache_state(), CacheState::Fetched);
        assert_eq!(session.current_user().unwrap().id, "bob");
    }

    #[test]
    fn sessions_are_independent() {
        let a = Session::new();
        let b = Session::new();
        a.set_authorization("Bearer a").unwrap();
        assert!(b.authorization().is_none());
    }
}
