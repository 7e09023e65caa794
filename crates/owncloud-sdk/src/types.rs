// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · types
// ──────────────────────────────────────────────────────────────────────────────
// Shared value types:
//  • PROPFIND depth & DAV property sets
//  • Current-user descriptor & capabilities
//  • Typed view over a normalised WebDAV `<d:response>`
//  • Upload options / results and the generic OCS request
// ──────────────────────────────────────────────────────────────────────────────

use crate::xml::{successful_props, NormalizedNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── PROPFIND ─────────────────────────────────────────────────────────────────

/// PROPFIND depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropfindDepth {
    #[serde(rename = "0")]
    Zero,
    #[default]
    #[serde(rename = "1")]
    One,
    Infinity,
}

impl PropfindDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Infinity => "infinity",
        }
    }
}

pub const NS_DAV: &str = "DAV:";
pub const NS_OWNCLOUD: &str = "http://owncloud.org/ns";

/// A WebDAV property name qualified by its namespace URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DavProperty {
    pub namespace: &'static str,
    pub name: &'static str,
}

impl DavProperty {
    pub const fn dav(name: &'static str) -> Self {
        Self {
            namespace: NS_DAV,
            name,
        }
    }

    pub const fn oc(name: &'static str) -> Self {
        Self {
            namespace: NS_OWNCLOUD,
            name,
        }
    }
}

/// Properties requested for a regular file listing.
pub const BASIC_FILE_PROPERTIES: &[DavProperty] = &[
    DavProperty::dav("getlastmodified"),
    DavProperty::dav("getcontentlength"),
    DavProperty::dav("getcontenttype"),
    DavProperty::dav("resourcetype"),
    DavProperty::dav("getetag"),
    DavProperty::oc("fileid"),
    DavProperty::oc("id"),
    DavProperty::oc("size"),
    DavProperty::oc("permissions"),
    DavProperty::oc("favorite"),
    DavProperty::oc("owner-id"),
    DavProperty::oc("owner-display-name"),
    DavProperty::oc("share-types"),
];

/// Properties of a trash-bin entry.
pub const TRASH_PROPERTIES: &[DavProperty] = &[
    DavProperty::oc("trashbin-original-filename"),
    DavProperty::oc("trashbin-original-location"),
    DavProperty::oc("trashbin-delete-datetime"),
    DavProperty::oc("trashbin-delete-timestamp"),
    DavProperty::dav("getcontentlength"),
    DavProperty::dav("resourcetype"),
];

/// Extra properties exposed on a public-link root.
pub const PUBLIC_LINK_PROPERTIES: &[DavProperty] = &[
    DavProperty::oc("public-link-item-type"),
    DavProperty::oc("public-link-permission"),
    DavProperty::oc("public-link-expiration"),
    DavProperty::oc("public-link-share-datetime"),
    DavProperty::oc("public-link-share-owner"),
];

// ── Current user & capabilities ──────────────────────────────────────────────

/// The authenticated user as reported by `cloud/user` or supplied up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    #[serde(default, alias = "display-name", alias = "displayname")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Build from the `<data>` node of a `cloud/user` response.
    pub fn from_ocs_data(data: &NormalizedNode) -> Option<Self> {
        let text = |key: &str| {
            data.get(key)
                .and_then(NormalizedNode::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            id: text("id")?,
            display_name: text("display-name").or_else(|| text("displayname")),
            email: text("email"),
        })
    }
}

/// Capabilities of the server, as returned by `cloud/capabilities`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub version: NormalizedNode,
    pub capabilities: NormalizedNode,
}

impl Capabilities {
    pub fn from_ocs_data(data: &NormalizedNode) -> Self {
        Self {
            version: data.get("version").cloned().unwrap_or_default(),
            capabilities: data.get("capabilities").cloned().unwrap_or_default(),
        }
    }

    /// `true` when a dotted capability path exists, e.g. `"files.bigfilechunking"`.
    pub fn has_capability(&self, dotted: &str) -> bool {
        self.capabilities.path(dotted).is_some()
    }

    pub fn capability_str(&self, dotted: &str) -> Option<&str> {
        self.capabilities.path(dotted).and_then(NormalizedNode::as_str)
    }

    /// Server version string, e.g. `"10.8.0"`.
    pub fn version_string(&self) -> Option<&str> {
        self.version.get("string").and_then(NormalizedNode::as_str)
    }
}

// ── FileInfo ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Dir,
}

/// One entry of a PROPFIND listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Raw `<d:href>` as sent by the server.
    pub href: String,
    /// Decoded path relative to the listed collection root, always `/`-prefixed.
    pub name: String,
    pub kind: ResourceType,
    /// Properties from every `200` propstat.
    pub properties: BTreeMap<String, NormalizedNode>,
}

impl FileInfo {
    /// Build from a normalised `<d:response>`, trimming `root_path` off the href.
    pub fn from_response(response: &NormalizedNode, root_path: &str) -> Self {
        let href = response
            .get("href")
            .and_then(NormalizedNode::as_str)
            .unwrap_or_default()
            .to_string();
        let properties = successful_props(response);
        let kind = match properties.get("resourcetype").and_then(|r| r.get("collection")) {
            Some(_) => ResourceType::Dir,
            None => ResourceType::File,
        };
        let name = relative_name(&href, root_path);

        Self {
            href,
            name,
            kind,
            properties,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ResourceType::Dir
    }

    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(NormalizedNode::as_str)
    }

    pub fn size(&self) -> Option<u64> {
        self.property_str("getcontentlength")
            .or_else(|| self.property_str("size"))
            .and_then(|s| s.parse().ok())
    }

    pub fn etag(&self) -> Option<&str> {
        self.property_str("getetag").filter(|s| !s.is_empty())
    }

    pub fn file_id(&self) -> Option<&str> {
        self.property_str("fileid").filter(|s| !s.is_empty())
    }
}

fn relative_name(href: &str, root_path: &str) -> String {
    let decoded = crate::urls::decode_path(href);
    let root = crate::urls::decode_path(root_path);
    let root = root.trim_end_matches('/');
    let rest = decoded.strip_prefix(root).unwrap_or(&decoded);
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

// ── Uploads ──────────────────────────────────────────────────────────────────

/// Conditional-write options for `PUT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Extra request headers, applied last.
    pub headers: BTreeMap<String, String>,
    /// Overwrite an existing file when no `previous_entity_tag` is given.
    pub overwrite: bool,
    /// Sent as `If-Match` to detect concurrent modification.
    pub previous_entity_tag: Option<String>,
}

/// Identifiers reported by the server after a successful `PUT`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PutResult {
    pub etag: Option<String>,
    pub file_id: Option<String>,
}

// ── Generic OCS request ──────────────────────────────────────────────────────

/// A raw OCS call, e.g. `OcsRequest::get("cloud", "users")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcsRequest {
    pub method: reqwest::Method,
    pub service: String,
    pub action: String,
    pub data: Vec<(String, String)>,
}

impl OcsRequest {
    pub fn new(method: reqwest::Method, service: &str, action: &str) -> Self {
        Self {
            method,
            service: service.to_string(),
            action: action.to_string(),
            data: Vec::new(),
        }
    }

    pub fn get(service: &str, action: &str) -> Self {
        Self::new(reqwest::Method::GET, service, action)
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.data.push((key.to_string(), value.to_string()));
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
