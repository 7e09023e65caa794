// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · urls
// ──────────────────────────────────────────────────────────────────────────────
// Endpoint URL construction for WebDAV (`remote.php/dav/…`) and OCS
// (`ocs/v1.php/<service>/<action>`) from one validated instance base URL.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{OcError, OcResult};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

pub const WEBDAV_ROOT: &str = "remote.php/dav/";
pub const OCS_ROOT: &str = "ocs/v1.php/";

pub const OCS_SERVICE_CLOUD: &str = "cloud";
pub const OCS_SERVICE_SHARE: &str = "apps/files_sharing/api/v1";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one path segment (also encodes `/`).
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, COMPONENT).to_string()
}

/// Encode every `/`-separated segment. Existing escapes are decoded first so
/// `a%20b` and `a b` both become `a%20b`.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| encode_segment(&decode_path(seg)))
        .collect::<Vec<_>>()
        .join("/")
}

pub fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

// ── UrlBuilder ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: Url,
}

impl UrlBuilder {
    /// Validate `base_url`; the stored base always ends in `/`.
    pub fn new(base_url: &str) -> OcResult<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(OcError::InvalidConfig("baseUrl is required".into()));
        }
        let mut base = Url::parse(trimmed)?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(OcError::InvalidConfig(format!(
                "baseUrl must be an http(s) URL: {}",
                trimmed
            )));
        }
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `…/remote.php/dav/`
    pub fn webdav_url(&self) -> String {
        format!("{}{}", self.base, WEBDAV_ROOT)
    }

    /// Path component of [`Self::webdav_url`], as it shows up in `<d:href>`.
    pub fn webdav_root_path(&self) -> String {
        format!("{}{}", self.base.path(), WEBDAV_ROOT)
    }

    /// Absolute URL of a DAV resource, e.g. `files/alice/docs/a b.txt`.
    pub fn build_webdav_path(&self, relative: &str) -> String {
        format!(
            "{}{}",
            self.webdav_url(),
            encode_path(relative.trim_start_matches('/'))
        )
    }

    /// Absolute URL of an OCS endpoint. `action` is used as given and may
    /// carry a query string; callers encode user-supplied segments.
    pub fn build_ocs_path(&self, service: &str, action: &str) -> String {
        let service = service.trim_matches('/');
        let action = action.trim_start_matches('/');
        if service.is_empty() {
            format!("{}{}{}", self.base, OCS_ROOT, action)
        } else {
            format!("{}{}{}/{}", self.base, OCS_ROOT, service, action)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let urls = UrlBuilder::new("https://cloud.example.com/owncloud").unwrap();
        assert_eq!(urls.base_url(), "https://cloud.example.com/owncloud/");
        assert_eq!(
            urls.webdav_url(),
            "https://cloud.example.com/owncloud/remote.php/dav/"
        );
        assert_eq!(urls.webdav_root_path(), "/owncloud/remote.php/dav/");
    }

    #[test]
    fn rejects_bad_bases() {
        assert!(UrlBuilder::new("").is_err());
        assert!(UrlBuilder::new("not a url").is_err());
        assert!(UrlBuilder::new("mailto:a@b").is_err());
        assert!(UrlBuilder::new("ftp://host/").is_err());
    }

    #[test]
    fn webdav_paths_are_encoded() {
        let urls = UrlBuilder::new("https://h/").unwrap();
        assert_eq!(
            urls.build_webdav_path("/files/alice/my docs/ä#1.txt"),
            "https://h/remote.php/dav/files/alice/my%20docs/%C3%A4%231.txt"
        );
    }

    #[test]
    fn already_encoded_is_not_double_encoded() {
        let urls = UrlBuilder::new("https://h/").unwrap();
        assert_eq!(
            urls.build_webdav_path("files/alice/a%20b"),
            urls.build_webdav_path("files/alice/a b")
        );
    }

    #[test]
    fn ocs_paths() {
        let urls = UrlBuilder::new("https://h/oc/").unwrap();
        assert_eq!(
            urls.build_ocs_path(OCS_SERVICE_CLOUD, "groups"),
            "https://h/oc/ocs/v1.php/cloud/groups"
        );
        assert_eq!(urls.build_ocs_path("", "config"), "https://h/oc/ocs/v1.php/config");
        assert_eq!(
            urls.build_ocs_path(OCS_SERVICE_SHARE, "shares"),
            "https://h/oc/ocs/v1.php/apps/files_sharing/api/v1/shares"
        );
    }

    #[test]
    fn segment_encoding_matches_uri_component() {
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_segment("it's(1)!~*-_."), "it's(1)!~*-_.");
        assert_eq!(decode_path("a%2Fb%20c"), "a/b c");
    }
}
