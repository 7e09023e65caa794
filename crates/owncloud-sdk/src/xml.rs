// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · xml
// ──────────────────────────────────────────────────────────────────────────────
// Response normalisation:
//  • generic XML → `NormalizedNode` tree (namespace prefixes dropped)
//  • WebDAV multistatus → one node per `<d:response>`, depth-filtered
//  • OCS envelope → meta + data, with `<element>` lists always sequences
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{OcError, OcResult};
use crate::types::PropfindDepth;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tags that always normalise to a sequence, even with a single occurrence.
pub const COLLECTION_TAGS: &[&str] = &["response", "propstat", "element", "share-type"];

/// OCS embedded status codes meaning success (v1 and v2 APIs).
pub const OCS_OK_CODES: [u32; 2] = [100, 200];

/// OCS embedded status code returned when the provisioning API is disabled.
pub const OCS_PROVISIONING_DISABLED: u32 = 999;

// ── NormalizedNode ───────────────────────────────────────────────────────────

/// A parsed XML value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NormalizedNode {
    /// Text content of an element without child elements.
    Scalar(String),
    /// Child elements keyed by local name.
    Node(BTreeMap<String, NormalizedNode>),
    /// A repeated (or collection) tag, in document order.
    Sequence(Vec<NormalizedNode>),
}

impl Default for NormalizedNode {
    fn default() -> Self {
        Self::Node(BTreeMap::new())
    }
}

impl NormalizedNode {
    /// Child lookup on a `Node`. Scalars and sequences have no keys.
    pub fn get(&self, key: &str) -> Option<&NormalizedNode> {
        match self {
            Self::Node(map) => map.get(key),
            _ => None,
        }
    }

    /// Dotted lookup, e.g. `"ocs.data.groups"`.
    pub fn path(&self, dotted: &str) -> Option<&NormalizedNode> {
        dotted
            .split('.')
            .filter(|k| !k.is_empty())
            .try_fold(self, |node, key| node.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, NormalizedNode>> {
        match self {
            Self::Node(map) => Some(map),
            _ => None,
        }
    }

    /// View any value as a sequence; a non-sequence is a sequence of one.
    pub fn as_sequence(&self) -> &[NormalizedNode] {
        match self {
            Self::Sequence(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Items under `key`, or an empty slice when the key is absent.
    pub fn sequence(&self, key: &str) -> &[NormalizedNode] {
        self.get(key).map(Self::as_sequence).unwrap_or(&[])
    }

    /// Scalar items under `key` (e.g. `<element>` lists of names).
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.sequence(key)
            .iter()
            .filter_map(|n| n.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// `true` for an empty scalar, an empty node or an empty sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_empty(),
            Self::Node(map) => map.is_empty(),
            Self::Sequence(items) => items.is_empty(),
        }
    }
}

// ── Generic parser ───────────────────────────────────────────────────────────

struct Frame {
    name: String,
    children: Vec<(String, NormalizedNode)>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, NormalizedNode) {
        if self.children.is_empty() {
            return (self.name, NormalizedNode::Scalar(self.text.trim().to_string()));
        }

        let mut grouped: BTreeMap<String, Vec<NormalizedNode>> = BTreeMap::new();
        for (key, value) in self.children {
            grouped.entry(key).or_default().push(value);
        }

        let map = grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() > 1 || COLLECTION_TAGS.contains(&key.as_str()) {
                    NormalizedNode::Sequence(values)
                } else {
                    values.pop().unwrap_or_default()
                };
                (key, value)
            })
            .collect();

        (self.name, NormalizedNode::Node(map))
    }
}

/// Parse an XML document into `Node { <root-local-name>: <root value> }`.
pub fn parse_xml(xml: &str) -> OcResult<NormalizedNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, NormalizedNode)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(OcError::Parse("content after document root".into()));
                }
                stack.push(Frame::new(local_name(e.local_name().as_ref())));
            }
            Event::Empty(e) => {
                let entry = (
                    local_name(e.local_name().as_ref()),
                    NormalizedNode::Scalar(String::new()),
                );
                match stack.last_mut() {
                    Some(parent) => parent.children.push(entry),
                    None if root.is_none() => root = Some(entry),
                    None => return Err(OcError::Parse("content after document root".into())),
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape()?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| OcError::Parse("unbalanced end tag".into()))?;
                let entry = frame.finish();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(entry),
                    None => root = Some(entry),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(OcError::Parse("unexpected end of document".into()));
    }

    let (name, value) = root.ok_or_else(|| OcError::Parse("document has no root element".into()))?;
    let mut map = BTreeMap::new();
    map.insert(name, value);
    Ok(NormalizedNode::Node(map))
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

// ── WebDAV multistatus ───────────────────────────────────────────────────────

/// Parse a multistatus body into one node per `<d:response>`, in document
/// order, filtered by `depth` relative to the first response (the target).
pub fn parse_multistatus(xml: &str, depth: PropfindDepth) -> OcResult<Vec<NormalizedNode>> {
    if xml.trim().is_empty() {
        return Ok(Vec::new());
    }

    let doc = parse_xml(xml)?;
    let multistatus = doc
        .get("multistatus")
        .ok_or_else(|| OcError::Parse("expected a multistatus document".into()))?;

    let responses = multistatus.sequence("response");
    let Some(first) = responses.first() else {
        return Ok(Vec::new());
    };

    let selected = match depth {
        PropfindDepth::Zero => vec![first.clone()],
        PropfindDepth::One => {
            let base = href_depth(first);
            responses
                .iter()
                .filter(|r| href_depth(r) <= base + 1)
                .cloned()
                .collect()
        }
        PropfindDepth::Infinity => responses.to_vec(),
    };
    Ok(selected)
}

fn href_depth(response: &NormalizedNode) -> usize {
    response
        .get("href")
        .and_then(NormalizedNode::as_str)
        .map(|href| href.split('/').filter(|s| !s.is_empty()).count())
        .unwrap_or(0)
}

/// Merge the `<d:prop>` children of every `200` propstat of a response.
pub fn successful_props(response: &NormalizedNode) -> BTreeMap<String, NormalizedNode> {
    let mut props = BTreeMap::new();
    for propstat in response.sequence("propstat") {
        let ok = propstat
            .get("status")
            .and_then(NormalizedNode::as_str)
            .map(|s| s.split_whitespace().nth(1) == Some("200"))
            .unwrap_or(true);
        if !ok {
            continue;
        }
        if let Some(map) = propstat.get("prop").and_then(NormalizedNode::as_map) {
            for (k, v) in map {
                props.insert(k.clone(), v.clone());
            }
        }
    }
    props
}

// ── OCS envelope ─────────────────────────────────────────────────────────────

/// `<ocs><meta>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcsMeta {
    pub status: String,
    pub status_code: u32,
    pub message: Option<String>,
}

/// A parsed OCS response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcsDocument {
    pub meta: OcsMeta,
    /// The `<data>` subtree (empty node when the server sent none).
    pub data: NormalizedNode,
}

impl OcsDocument {
    /// Apply the embedded-status policy shared by all OCS operations.
    pub fn into_checked(self) -> OcResult<Self> {
        let code = self.meta.status_code;
        if OCS_OK_CODES.contains(&code) {
            return Ok(self);
        }
        if code == OCS_PROVISIONING_DISABLED {
            return Err(OcError::Service {
                status_code: code,
                message: "Provisioning API has been disabled at your instance".into(),
            });
        }
        let message = self
            .meta
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("OCS request failed with status {}", code));
        Err(OcError::Service {
            status_code: code,
            message,
        })
    }
}

/// Parse an OCS XML envelope. Does not judge the embedded status.
pub fn parse_ocs(xml: &str) -> OcResult<OcsDocument> {
    let doc = parse_xml(xml)?;
    let ocs = doc
        .get("ocs")
        .ok_or_else(|| OcError::Parse("expected an <ocs> document".into()))?;
    let meta = ocs
        .get("meta")
        .ok_or_else(|| OcError::Parse("OCS document without <meta>".into()))?;

    let status_code = meta
        .get("statuscode")
        .and_then(NormalizedNode::as_str)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| OcError::Parse("OCS <meta> without a numeric statuscode".into()))?;

    let meta = OcsMeta {
        status: meta
            .get("status")
            .and_then(NormalizedNode::as_str)
            .unwrap_or_default()
            .to_string(),
        status_code,
        message: meta
            .get("message")
            .and_then(NormalizedNode::as_str)
            .map(str::to_string),
    };

    Ok(OcsDocument {
        meta,
        data: ocs.get("data").cloned().unwrap_or_default(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
