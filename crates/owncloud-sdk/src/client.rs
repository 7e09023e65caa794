// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · client
// ──────────────────────────────────────────────────────────────────────────────
// Shared request context used by every feature module:
//  • pre-flight authorization check
//  • execute-and-classify (the single success allow-list check)
//  • WebDAV helpers (PROPFIND with a property list, generic DAV request)
//  • OCS helper (form-encoded request, envelope parsing, status policy)
//  • current-user and capability fetches backed by the session cache
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{is_success, HttpError, OcError, OcResult};
use crate::session::Session;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::types::{Capabilities, DavProperty, PropfindDepth, UserInfo, NS_DAV, NS_OWNCLOUD};
use crate::urls::{UrlBuilder, OCS_SERVICE_CLOUD};
use crate::xml::{parse_multistatus, parse_ocs, NormalizedNode, OcsDocument};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Session, URL builder and transport of one client, shared by reference
/// between the feature modules.
#[derive(Debug)]
pub struct Context {
    session: Session,
    urls: UrlBuilder,
    transport: Arc<dyn HttpTransport>,
}

impl Context {
    pub fn new(urls: UrlBuilder, session: Session, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            session,
            urls,
            transport,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Fail fast when no credential is stored.
    pub fn require_authorization(&self) -> OcResult<()> {
        if self.session.has_authorization() {
            Ok(())
        } else {
            Err(OcError::MissingAuthorization)
        }
    }

    // ── Execution ────────────────────────────────────────────────────────

    /// Send a request and return the response whatever its status.
    pub async fn execute(&self, request: TransportRequest) -> OcResult<TransportResponse> {
        debug!("{} {}", request.method, request.url);
        self.transport.execute(request).await
    }

    /// Send a request; statuses outside 200/201/204/207 become `HttpError`.
    pub async fn execute_and_classify(
        &self,
        request: TransportRequest,
    ) -> OcResult<TransportResponse> {
        let method = request.method.clone();
        let resp = self.execute(request).await?;
        if is_success(resp.status) {
            Ok(resp)
        } else {
            debug!("{} answered {}", method, resp.status);
            Err(HttpError::from_response(resp.status, resp.text()).into())
        }
    }

    // ── WebDAV ───────────────────────────────────────────────────────────

    /// PROPFIND `url` for `properties`, returning one node per response.
    pub async fn propfind(
        &self,
        url: &str,
        properties: &[DavProperty],
        depth: PropfindDepth,
        mut headers: HeaderMap,
    ) -> OcResult<Vec<NormalizedNode>> {
        headers.insert("depth", HeaderValue::from_static(depth.as_str()));
        let request = TransportRequest::new(propfind_method()?, url)
            .with_headers(headers)
            .with_body(propfind_body(properties));
        let resp = self.execute_and_classify(request).await?;
        parse_multistatus(&resp.text(), depth)
    }

    pub async fn dav_request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<bytes::Bytes>,
    ) -> OcResult<TransportResponse> {
        let mut request = TransportRequest::new(method, url).with_headers(headers);
        request.body = body;
        self.execute_and_classify(request).await
    }

    // ── OCS ──────────────────────────────────────────────────────────────

    /// Authorised OCS call. `data` is sent form-encoded when non-empty.
    pub async fn ocs_request(
        &self,
        method: Method,
        service: &str,
        action: &str,
        data: &[(String, String)],
    ) -> OcResult<OcsDocument> {
        self.require_authorization()?;

        let url = self.urls.build_ocs_path(service, action);
        let mut headers = self.session.build_headers(true);
        let mut request = TransportRequest::new(method, url);
        if !data.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            request = request.with_body(form_encode(data));
        }
        request.headers = headers;

        let resp = self.execute_and_classify(request).await?;
        let doc = parse_ocs(&resp.text())?;
        doc.into_checked().map_err(|e| {
            warn!("OCS {}/{} rejected: {}", service, action, e);
            e
        })
    }

    // ── Cached lookups ───────────────────────────────────────────────────

    /// The current user from the session, fetched from `cloud/user` once.
    pub async fn current_user(&self) -> OcResult<UserInfo> {
        if let Some(user) = self.session.current_user() {
            return Ok(user);
        }
        let user = self.fetch_current_user().await?;
        self.session.store_fetched_user(user.clone());
        Ok(user)
    }

    pub async fn fetch_current_user(&self) -> OcResult<UserInfo> {
        let doc = self
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, "user", &[])
            .await?;
        UserInfo::from_ocs_data(&doc.data)
            .ok_or_else(|| OcError::Parse("cloud/user response without an id".into()))
    }

    /// Fetch capabilities and replace the cached copy.
    pub async fn fetch_capabilities(&self) -> OcResult<Arc<Capabilities>> {
        let doc = self
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, "capabilities", &[])
            .await?;
        Ok(self
            .session
            .store_capabilities(Capabilities::from_ocs_data(&doc.data)))
    }
}

// ── Free-standing helpers ────────────────────────────────────────────────────

const PROPFIND: &[u8] = b"PROPFIND";
const MKCOL: &[u8] = b"MKCOL";
const MOVE: &[u8] = b"MOVE";
const COPY: &[u8] = b"COPY";

/// WebDAV verbs are extension methods; a rejected token is an error, never
/// a different verb.
fn extension_method(token: &'static [u8]) -> OcResult<Method> {
    Method::from_bytes(token).map_err(|e| {
        OcError::InvalidConfig(format!("HTTP method {}: {}", String::from_utf8_lossy(token), e))
    })
}

pub fn propfind_method() -> OcResult<Method> {
    extension_method(PROPFIND)
}

pub fn mkcol_method() -> OcResult<Method> {
    extension_method(MKCOL)
}

pub fn move_method() -> OcResult<Method> {
    extension_method(MOVE)
}

pub fn copy_method() -> OcResult<Method> {
    extension_method(COPY)
}

/// `<d:propfind>` body requesting `properties` (or `<d:allprop/>` when empty).
pub fn propfind_body(properties: &[DavProperty]) -> String {
    if properties.is_empty() {
        return "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                <d:propfind xmlns:d=\"DAV:\"><d:allprop/></d:propfind>"
            .to_string();
    }

    let mut namespaces: Vec<&str> = Vec::new();
    for p in properties {
        if p.namespace != NS_DAV && !namespaces.contains(&p.namespace) {
            namespaces.push(p.namespace);
        }
    }
    let prefix_of = |ns: &str| -> String {
        if ns == NS_DAV {
            "d".to_string()
        } else if ns == NS_OWNCLOUD {
            "oc".to_string()
        } else {
            let idx = namespaces.iter().position(|n| *n == ns).unwrap_or(0);
            format!("x{}", idx)
        }
    };

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<d:propfind xmlns:d=\"DAV:\"");
    for ns in &namespaces {
        xml.push_str(&format!(" xmlns:{}=\"{}\"", prefix_of(ns), ns));
    }
    xml.push_str(">\n  <d:prop>\n");
    for p in properties {
        xml.push_str(&format!("    <{}:{}/>\n", prefix_of(p.namespace), p.name));
    }
    xml.push_str("  </d:prop>\n</d:propfind>");
    xml
}

pub fn form_encode(data: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(data)
        .finish()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
