// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · trash
// ──────────────────────────────────────────────────────────────────────────────
// Trash-bin management over `remote.php/dav/trash-bin/<user>/…`:
//  • list deleted items
//  • clear the whole trash-bin or a single item
//  • restore an item to its original (or another) location
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{move_method, Context};
use crate::error::{OcError, OcResult};
use crate::types::{FileInfo, PropfindDepth, TRASH_PROPERTIES};
use crate::urls::encode_segment;
use log::info;
use reqwest::header::HeaderValue;
use reqwest::Method;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FilesTrash {
    ctx: Arc<Context>,
}

impl FilesTrash {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// List the trash-bin (or a folder inside it).
    pub async fn list(&self, path: &str, depth: PropfindDepth) -> OcResult<Vec<FileInfo>> {
        self.ctx.require_authorization()?;
        let user = self.ctx.current_user().await?;

        let url = self
            .ctx
            .urls()
            .build_webdav_path(&format!("trash-bin/{}/{}", user.id, path.trim_start_matches('/')));
        let root = format!(
            "{}trash-bin/{}",
            self.ctx.urls().webdav_root_path(),
            encode_segment(&user.id)
        );

        let nodes = self
            .ctx
            .propfind(&url, TRASH_PROPERTIES, depth, self.ctx.session().build_headers(true))
            .await?;
        Ok(nodes
            .iter()
            .map(|n| FileInfo::from_response(n, &root))
            .collect())
    }

    /// Delete one trash-bin item, or everything when `item` is `None`.
    pub async fn clear_trash_bin(&self, item: Option<&str>) -> OcResult<()> {
        self.ctx.require_authorization()?;
        let user = self.ctx.current_user().await?;

        let target = format!("trash-bin/{}/{}", user.id, item.unwrap_or_default());
        let url = self.ctx.urls().build_webdav_path(&target);
        self.ctx
            .dav_request(Method::DELETE, &url, self.ctx.session().build_headers(true), None)
            .await?;
        info!("trash-bin of {} cleared ({})", user.id, item.unwrap_or("all"));
        Ok(())
    }

    /// Move trash item `file_id` back to `original_location`.
    pub async fn restore(
        &self,
        file_id: Option<&str>,
        original_location: &str,
        overwrite: bool,
    ) -> OcResult<()> {
        let file_id = file_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| OcError::missing("fileId", "restore"))?;
        self.ctx.require_authorization()?;
        let user = self.ctx.current_user().await?;

        let urls = self.ctx.urls();
        let source = urls.build_webdav_path(&format!("trash-bin/{}/{}", user.id, file_id));
        let destination = urls.build_webdav_path(&format!(
            "files/{}/{}",
            user.id,
            original_location.trim_start_matches('/')
        ));

        let mut headers = self.ctx.session().build_headers(true);
        headers.insert(
            "destination",
            HeaderValue::from_str(&destination)
                .map_err(|e| OcError::InvalidConfig(format!("destination header: {}", e)))?,
        );
        headers.insert(
            "overwrite",
            HeaderValue::from_static(if overwrite { "T" } else { "F" }),
        );

        self.ctx
            .dav_request(move_method()?, &source, headers, None)
            .await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
