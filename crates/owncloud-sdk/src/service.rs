// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · service
// ──────────────────────────────────────────────────────────────────────────────
// `OwnCloud`, the entry point aggregating every sub-module over one shared
// `Context`. The file backend (WebDAV or gRPC gateway) is picked once, when
// the client is built.
// ──────────────────────────────────────────────────────────────────────────────

use crate::apps::Apps;
use crate::client::Context;
use crate::config::{ClientOptions, ConnectorKind};
use crate::error::{OcError, OcResult};
use crate::files::{FileBackend, WebdavFiles};
use crate::groups::Groups;
use crate::grpc::{GrpcFiles, RevaGateway};
use crate::public_files::PublicFiles;
use crate::session::{header_map, Session};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::trash::FilesTrash;
use crate::types::{Capabilities, OcsRequest, UserInfo};
use crate::urls::UrlBuilder;
use crate::users::Users;
use crate::xml::{NormalizedNode, OcsDocument};
use log::info;
use reqwest::Method;
use std::sync::Arc;

// ── Builder ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct OwnCloudBuilder {
    options: ClientOptions,
    transport: Option<Arc<dyn HttpTransport>>,
    gateway: Option<Arc<dyn RevaGateway>>,
}

impl OwnCloudBuilder {
    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Gateway stub used when `connector.type` is `grpc`.
    pub fn grpc_gateway(mut self, gateway: Arc<dyn RevaGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn build(self) -> OcResult<OwnCloud> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(&self.options.transport)?),
        };
        OwnCloud::assemble(self.options, transport, self.gateway)
    }
}

// ── OwnCloud ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OwnCloud {
    ctx: Arc<Context>,
    gateway: Option<Arc<dyn RevaGateway>>,
    files: Arc<dyn FileBackend>,
    trash: FilesTrash,
    groups: Groups,
    users: Users,
    apps: Apps,
    public_files: PublicFiles,
}

impl OwnCloud {
    pub fn builder(options: ClientOptions) -> OwnCloudBuilder {
        OwnCloudBuilder {
            options,
            transport: None,
            gateway: None,
        }
    }

    /// Client with the default reqwest transport.
    pub fn new(options: ClientOptions) -> OcResult<Self> {
        Self::builder(options).build()
    }

    fn assemble(
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
        gateway: Option<Arc<dyn RevaGateway>>,
    ) -> OcResult<Self> {
        let urls = UrlBuilder::new(&options.base_url)?;

        let session = Session::new();
        if let Some(auth) = options.authorization() {
            session.set_authorization(&auth)?;
        }
        session.set_current_user(options.user_info.clone());
        session.set_headers(header_map(&options.headers)?);

        let ctx = Arc::new(Context::new(urls, session, transport));
        let files: Arc<dyn FileBackend> = match options.connector.kind {
            ConnectorKind::Grpc => {
                let gw = gateway.clone().ok_or_else(|| {
                    OcError::InvalidConfig("grpc connector selected but no gateway supplied".into())
                })?;
                Arc::new(GrpcFiles::new(Arc::clone(&ctx), gw))
            }
            ConnectorKind::Webdav => Arc::new(WebdavFiles::new(Arc::clone(&ctx))),
        };

        Ok(Self {
            trash: FilesTrash::new(Arc::clone(&ctx)),
            groups: Groups::new(Arc::clone(&ctx)),
            users: Users::new(Arc::clone(&ctx)),
            apps: Apps::new(Arc::clone(&ctx)),
            public_files: PublicFiles::new(Arc::clone(&ctx)),
            files,
            gateway,
            ctx,
        })
    }

    /// Re-initialise from scratch, keeping the transport and gateway.
    /// On error the client is left unchanged.
    pub fn init(&mut self, options: ClientOptions) -> OcResult<()> {
        *self = Self::assemble(options, self.ctx.transport(), self.gateway.clone())?;
        Ok(())
    }

    // ━━━━━━━━━━━━━━  Session  ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Refresh capabilities, then resolve the current user.
    pub async fn login(&self) -> OcResult<UserInfo> {
        self.refresh_capabilities().await?;
        let user = self.ctx.current_user().await?;
        info!("logged in to {} as {}", self.ctx.urls().base_url(), user.id);
        Ok(user)
    }

    /// Drop credential, current user and cached capabilities.
    pub fn logout(&self) {
        self.ctx.session().invalidate();
        info!("logged out of {}", self.ctx.urls().base_url());
    }

    // ━━━━━━━━━━━━━━  Server info  ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `ocs/v1.php/config` data (version, website, host, …).
    pub async fn get_config(&self) -> OcResult<NormalizedNode> {
        let doc = self.ctx.ocs_request(Method::GET, "", "config", &[]).await?;
        Ok(doc.data)
    }

    /// Cached capabilities; fetched when nothing is cached yet.
    pub async fn get_capabilities(&self) -> OcResult<Arc<Capabilities>> {
        match self.ctx.session().capabilities() {
            Some(caps) => Ok(caps),
            None => self.ctx.fetch_capabilities().await,
        }
    }

    pub async fn refresh_capabilities(&self) -> OcResult<Arc<Capabilities>> {
        self.ctx.fetch_capabilities().await
    }

    pub async fn get_current_user(&self) -> OcResult<UserInfo> {
        self.ctx.current_user().await
    }

    /// Raw OCS passthrough, under the same status policy as every module.
    pub async fn ocs(&self, request: OcsRequest) -> OcResult<OcsDocument> {
        self.ctx
            .ocs_request(request.method, &request.service, &request.action, &request.data)
            .await
    }

    // ━━━━━━━━━━━━━━  Modules  ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn files(&self) -> &dyn FileBackend {
        self.files.as_ref()
    }

    pub fn trash(&self) -> &FilesTrash {
        &self.trash
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn apps(&self) -> &Apps {
        &self.apps
    }

    pub fn public_files(&self) -> &PublicFiles {
        &self.public_files
    }

    pub fn session(&self) -> &Session {
        self.ctx.session()
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
