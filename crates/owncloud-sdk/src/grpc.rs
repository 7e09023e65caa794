// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · grpc
// ──────────────────────────────────────────────────────────────────────────────
// File backend over a Reva-style gateway:
//  • `RevaGateway`: the service-stub seam (metadata RPCs + transfer
//    negotiation), supplied by the caller
//  • `GrpcFiles`: `FileBackend` on top of it; RPC failures are translated to
//    HTTP-equivalent codes and go through the same error mapper as WebDAV,
//    payload bytes move over the HTTP transport with `X-Access-Token`
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::Context;
use crate::error::{HttpError, OcError, OcResult};
use crate::files::{apply_put_options, value, FileBackend};
use crate::transport::TransportRequest;
use crate::types::{FileInfo, PropfindDepth, PutOptions, PutResult, ResourceType};
use crate::xml::NormalizedNode;
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Root of the user's namespace on the gateway.
pub const HOME: &str = "/home";

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

// ── RPC envelope ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RpcCode {
    Ok,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    Unimplemented,
    Unavailable,
    Internal,
}

impl RpcCode {
    /// HTTP status a WebDAV server would have answered with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::PermissionDenied => 403,
            Self::Unauthenticated => 401,
            Self::InvalidArgument => 400,
            Self::FailedPrecondition => 412,
            Self::Unimplemented => 501,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    pub fn ok() -> Self {
        Self {
            code: RpcCode::Ok,
            message: String::new(),
        }
    }

    pub fn error(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Status plus payload of one gateway call. `payload` may be absent on error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply<T> {
    pub status: RpcStatus,
    pub payload: Option<T>,
}

impl<T> RpcReply<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: RpcStatus::ok(),
            payload: Some(payload),
        }
    }

    pub fn error(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            status: RpcStatus::error(code, message),
            payload: None,
        }
    }

    /// The payload, or the failure routed through the HTTP error mapper.
    pub fn into_result(self, rpc: &str) -> OcResult<T> {
        if self.status.code != RpcCode::Ok {
            debug!("{} failed: {:?} {}", rpc, self.status.code, self.status.message);
            let status = self.status.code.http_status();
            return Err(HttpError::from_response(status, self.status.message).into());
        }
        self.payload
            .ok_or_else(|| OcError::Parse(format!("{} returned no payload", rpc)))
    }
}

// ── Gateway payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    /// Absolute gateway path, e.g. `/home/docs/a.txt`.
    pub path: String,
    pub kind: ResourceType,
    pub id: String,
    pub etag: String,
    pub size: u64,
    pub mime_type: Option<String>,
    /// Seconds since the epoch.
    pub mtime: Option<u64>,
}

/// Where (and with which token) payload bytes are transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEndpoint {
    pub endpoint: String,
    pub token: String,
}

/// Service-stub seam for the gRPC gateway. `access` is the session's
/// `Authorization` value; implementations decide how to present it.
#[async_trait]
pub trait RevaGateway: Send + Sync + std::fmt::Debug {
    async fn stat(&self, access: &str, path: &str) -> OcResult<RpcReply<ResourceInfo>>;

    async fn list_container(&self, access: &str, path: &str)
        -> OcResult<RpcReply<Vec<ResourceInfo>>>;

    async fn create_container(&self, access: &str, path: &str) -> OcResult<RpcReply<()>>;

    async fn delete(&self, access: &str, path: &str) -> OcResult<RpcReply<()>>;

    async fn move_resource(&self, access: &str, source: &str, target: &str)
        -> OcResult<RpcReply<()>>;

    async fn initiate_file_download(
        &self,
        access: &str,
        path: &str,
    ) -> OcResult<RpcReply<TransferEndpoint>>;

    async fn initiate_file_upload(
        &self,
        access: &str,
        path: &str,
    ) -> OcResult<RpcReply<TransferEndpoint>>;
}

// ── GrpcFiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GrpcFiles {
    ctx: Arc<Context>,
    gateway: Arc<dyn RevaGateway>,
}

/// `/home/<path>` without a trailing slash (except for the root itself).
fn home_path(path: &str) -> String {
    let rel = path.trim_matches('/');
    if rel.is_empty() {
        HOME.to_string()
    } else {
        format!("{}/{}", HOME, rel)
    }
}

impl GrpcFiles {
    pub fn new(ctx: Arc<Context>, gateway: Arc<dyn RevaGateway>) -> Self {
        Self { ctx, gateway }
    }

    fn access(&self) -> OcResult<String> {
        self.ctx
            .session()
            .authorization()
            .ok_or(OcError::MissingAuthorization)
    }

    fn transfer_request(method: Method, endpoint: &TransferEndpoint) -> OcResult<TransportRequest> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, value(&endpoint.token)?);
        Ok(TransportRequest::new(method, endpoint.endpoint.clone()).with_headers(headers))
    }
}

/// Present a gateway resource like a PROPFIND entry.
pub fn file_info_from_resource(info: &ResourceInfo) -> FileInfo {
    let mut properties = BTreeMap::new();
    let mut put = |k: &str, v: String| {
        properties.insert(k.to_string(), NormalizedNode::Scalar(v));
    };
    put("fileid", info.id.clone());
    put("getetag", info.etag.clone());
    put("getcontentlength", info.size.to_string());
    if let Some(mime) = &info.mime_type {
        put("getcontenttype", mime.clone());
    }
    if let Some(mtime) = info.mtime {
        put("getlastmodified", mtime.to_string());
    }

    let name = info
        .path
        .strip_prefix(HOME)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .map(|rest| if rest.is_empty() { "/" } else { rest })
        .unwrap_or(info.path.as_str())
        .to_string();

    FileInfo {
        href: info.path.clone(),
        name,
        kind: info.kind,
        properties,
    }
}

#[async_trait]
impl FileBackend for GrpcFiles {
    async fn list(&self, path: &str, depth: PropfindDepth) -> OcResult<Vec<FileInfo>> {
        let access = self.access()?;
        let target = home_path(path);

        let root = self
            .gateway
            .stat(&access, &target)
            .await?
            .into_result("Stat")?;
        let mut items = vec![file_info_from_resource(&root)];
        if depth == PropfindDepth::Zero || root.kind == ResourceType::File {
            return Ok(items);
        }

        let mut pending = vec![target];
        while let Some(dir) = pending.pop() {
            let children = self
                .gateway
                .list_container(&access, &dir)
                .await?
                .into_result("ListContainer")?;
            for child in children {
                if depth == PropfindDepth::Infinity && child.kind == ResourceType::Dir {
                    pending.push(child.path.clone());
                }
                items.push(file_info_from_resource(&child));
            }
        }
        Ok(items)
    }

    async fn get_file_contents(&self, path: &str) -> OcResult<Bytes> {
        let access = self.access()?;
        let endpoint = self
            .gateway
            .initiate_file_download(&access, &home_path(path))
            .await?
            .into_result("InitiateFileDownload")?;
        let resp = self
            .ctx
            .execute_and_classify(Self::transfer_request(Method::GET, &endpoint)?)
            .await?;
        Ok(resp.body)
    }

    async fn put_file_contents(
        &self,
        path: &str,
        content: Bytes,
        options: &PutOptions,
    ) -> OcResult<PutResult> {
        let access = self.access()?;
        let endpoint = self
            .gateway
            .initiate_file_upload(&access, &home_path(path))
            .await?
            .into_result("InitiateFileUpload")?;

        let mut request = Self::transfer_request(Method::PUT, &endpoint)?.with_body(content);
        apply_put_options(&mut request.headers, options)?;
        let resp = self.ctx.execute_and_classify(request).await?;
        Ok(PutResult {
            etag: resp.header("etag").map(str::to_string),
            file_id: resp.header("oc-fileid").map(str::to_string),
        })
    }

    async fn create_folder(&self, path: &str) -> OcResult<()> {
        let access = self.access()?;
        self.gateway
            .create_container(&access, &home_path(path))
            .await?
            .into_result("CreateContainer")
    }

    async fn delete(&self, path: &str) -> OcResult<()> {
        let access = self.access()?;
        self.gateway
            .delete(&access, &home_path(path))
            .await?
            .into_result("Delete")
    }

    async fn move_file(&self, source: &str, target: &str) -> OcResult<()> {
        let access = self.access()?;
        self.gateway
            .move_resource(&access, &home_path(source), &home_path(target))
            .await?
            .into_result("Move")
    }

    /// The gateway has no copy RPC; the file is streamed down and up again.
    async fn copy(&self, source: &str, target: &str) -> OcResult<()> {
        let data = self.get_file_contents(source).await?;
        let overwrite = PutOptions {
            overwrite: true,
            ..Default::default()
        };
        self.put_file_contents(target, data, &overwrite).await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
