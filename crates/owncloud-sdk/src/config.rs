// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · config
// ──────────────────────────────────────────────────────────────────────────────
// Client initialisation options. The JSON shape mirrors the option object
// accepted by the JavaScript SDK (camelCase keys), plus a `transport` block.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::OcResult;
use crate::types::UserInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Options ──────────────────────────────────────────────────────────────────

/// Options accepted by [`crate::OwnCloud::new`] and [`crate::OwnCloud::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// Root of the instance, e.g. `https://cloud.example.com/owncloud/`.
    pub base_url: String,
    pub auth: Option<AuthOptions>,
    pub user_info: Option<UserInfo>,
    pub headers: BTreeMap<String, String>,
    pub connector: ConnectorOptions,
    pub transport: TransportOptions,
}

/// Either key may be absent. An empty object means no credential, and
/// `basic` wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicCredentials>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// File backend selector. Any unknown `type` falls back to WebDAV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Grpc,
    #[default]
    #[serde(other)]
    Webdav,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorOptions {
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
}

/// Settings for the default reqwest transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportOptions {
    pub timeout_secs: u64,
    /// Retries for 429 / 5xx / connect failures. Off unless set.
    pub max_retries: u32,
    pub user_agent: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            user_agent: None,
        }
    }
}

// ── Builder helpers ──────────────────────────────────────────────────────────

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> OcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthOptions {
            bearer: Some(token.into()),
            basic: None,
        });
        self
    }

    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthOptions {
            bearer: None,
            basic: Some(BasicCredentials {
                username: username.into(),
                password: password.into(),
            }),
        });
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_user_info(mut self, user: UserInfo) -> Self {
        self.user_info = Some(user);
        self
    }

    pub fn with_connector(mut self, kind: ConnectorKind) -> Self {
        self.connector.kind = kind;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// The `Authorization` header value these options ask for, if any.
    pub fn authorization(&self) -> Option<String> {
        let auth = self.auth.as_ref()?;
        if let Some(c) = &auth.basic {
            return Some(crate::session::basic_authorization(&c.username, &c.password));
        }
        auth.bearer
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(crate::session::bearer_authorization)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
