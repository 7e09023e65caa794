// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · files
// ──────────────────────────────────────────────────────────────────────────────
// File management surface shared by both backends, and its WebDAV
// implementation over `remote.php/dav/files/<user>/…`:
//  • list / stat
//  • download / upload (conditional writes)
//  • mkcol / delete / move / copy
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{copy_method, mkcol_method, move_method, Context};
use crate::error::{OcError, OcResult};
use crate::types::{FileInfo, PropfindDepth, PutOptions, PutResult, BASIC_FILE_PROPERTIES};
use crate::urls::encode_segment;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::sync::Arc;

// ── FileBackend ──────────────────────────────────────────────────────────────

/// File operations of the authenticated user, independent of the wire.
#[async_trait]
pub trait FileBackend: Send + Sync + std::fmt::Debug {
    async fn list(&self, path: &str, depth: PropfindDepth) -> OcResult<Vec<FileInfo>>;

    async fn get_file_contents(&self, path: &str) -> OcResult<Bytes>;

    async fn put_file_contents(
        &self,
        path: &str,
        content: Bytes,
        options: &PutOptions,
    ) -> OcResult<PutResult>;

    async fn create_folder(&self, path: &str) -> OcResult<()>;

    async fn delete(&self, path: &str) -> OcResult<()>;

    async fn move_file(&self, source: &str, target: &str) -> OcResult<()>;

    async fn copy(&self, source: &str, target: &str) -> OcResult<()>;

    /// Metadata of a single resource.
    async fn file_info(&self, path: &str) -> OcResult<FileInfo> {
        self.list(path, PropfindDepth::Zero)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OcError::Parse(format!("no entry returned for {}", path)))
    }
}

/// Headers for a conditional `PUT`.
pub(crate) fn apply_put_options(headers: &mut HeaderMap, options: &PutOptions) -> OcResult<()> {
    if let Some(etag) = options.previous_entity_tag.as_deref().filter(|t| !t.is_empty()) {
        headers.insert("if-match", value(etag)?);
    } else if !options.overwrite {
        headers.insert("if-none-match", HeaderValue::from_static("*"));
    }
    for (name, v) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| OcError::InvalidConfig(format!("header name {:?}: {}", name, e)))?;
        headers.insert(name, value(v)?);
    }
    Ok(())
}

pub(crate) fn value(v: &str) -> OcResult<HeaderValue> {
    HeaderValue::from_str(v).map_err(|e| OcError::InvalidConfig(format!("header value: {}", e)))
}

// ── WebdavFiles ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebdavFiles {
    ctx: Arc<Context>,
}

impl WebdavFiles {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Authorise, resolve the user and build the URL of `path`.
    async fn target(&self, path: &str) -> OcResult<(String, String)> {
        self.ctx.require_authorization()?;
        let user = self.ctx.current_user().await?;
        let url = self.ctx.urls().build_webdav_path(&format!(
            "files/{}/{}",
            user.id,
            path.trim_start_matches('/')
        ));
        Ok((user.id, url))
    }

    /// Absolute URL of a file of the current user.
    pub async fn get_file_url(&self, path: &str) -> OcResult<String> {
        Ok(self.target(path).await?.1)
    }

    async fn transfer(&self, method: Method, source: &str, target: &str) -> OcResult<()> {
        let (_, source_url) = self.target(source).await?;
        let (_, target_url) = self.target(target).await?;
        let mut headers = self.ctx.session().build_headers(true);
        headers.insert("destination", value(&target_url)?);
        self.ctx
            .dav_request(method, &source_url, headers, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileBackend for WebdavFiles {
    async fn list(&self, path: &str, depth: PropfindDepth) -> OcResult<Vec<FileInfo>> {
        let (user, url) = self.target(path).await?;
        let root = format!(
            "{}files/{}",
            self.ctx.urls().webdav_root_path(),
            encode_segment(&user)
        );
        let nodes = self
            .ctx
            .propfind(&url, BASIC_FILE_PROPERTIES, depth, self.ctx.session().build_headers(true))
            .await?;
        Ok(nodes
            .iter()
            .map(|n| FileInfo::from_response(n, &root))
            .collect())
    }

    async fn get_file_contents(&self, path: &str) -> OcResult<Bytes> {
        let (_, url) = self.target(path).await?;
        let resp = self
            .ctx
            .dav_request(Method::GET, &url, self.ctx.session().build_headers(true), None)
            .await?;
        Ok(resp.body)
    }

    async fn put_file_contents(
        &self,
        path: &str,
        content: Bytes,
        options: &PutOptions,
    ) -> OcResult<PutResult> {
        let (_, url) = self.target(path).await?;
        let mut headers = self.ctx.session().build_headers(true);
        apply_put_options(&mut headers, options)?;
        let resp = self
            .ctx
            .dav_request(Method::PUT, &url, headers, Some(content))
            .await?;
        Ok(PutResult {
            etag: resp.header("etag").map(str::to_string),
            file_id: resp.header("oc-fileid").map(str::to_string),
        })
    }

    async fn create_folder(&self, path: &str) -> OcResult<()> {
        let (_, url) = self.target(path).await?;
        self.ctx
            .dav_request(mkcol_method()?, &url, self.ctx.session().build_headers(true), None)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> OcResult<()> {
        let (_, url) = self.target(path).await?;
        self.ctx
            .dav_request(Method::DELETE, &url, self.ctx.session().build_headers(true), None)
            .await?;
        Ok(())
    }

    async fn move_file(&self, source: &str, target: &str) -> OcResult<()> {
        self.transfer(move_method()?, source, target).await
    }

    async fn copy(&self, source: &str, target: &str) -> OcResult<()> {
        self.transfer(copy_method()?, source, target).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anonymous_context, authed_context};

    const LISTING: &str = r#"<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:response><d:href>/remote.php/dav/files/alice/docs/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype>
      <oc:fileid>10</oc:fileid><d:getetag>"d1"</d:getetag></d:prop>
    <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
  <d:response><d:href>/remote.php/dav/files/alice/docs/report%202020.pdf</d:href>
    <d:propstat><d:prop><d:resourcetype/><d:getcontentlength>1024</d:getcontentlength>
      <oc:fileid>11</oc:fileid></d:prop>
    <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
</d:multistatus>"#;

    #[tokio::test]
    async fn list_user_folder() {
        let (ctx, fake) = authed_context();
        fake.push(207, LISTING);
        let items = WebdavFiles::new(ctx).list("docs", PropfindDepth::One).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "/docs/");
        assert_eq!(items[0].file_id(), Some("10"));
        assert_eq!(items[0].etag(), Some("\"d1\""));
        assert_eq!(items[1].name, "/docs/report 2020.pdf");
        assert_eq!(items[1].size(), Some(1024));
        assert_eq!(
            fake.last_request().url,
            "https://cloud.example.com/remote.php/dav/files/alice/docs"
        );
    }

    #[tokio::test]
    async fn file_info_is_depth_zero() {
        let (ctx, fake) = authed_context();
        fake.push(207, LISTING);
        let info = WebdavFiles::new(ctx).file_info("docs").await.unwrap();
        assert!(info.is_dir());
        assert_eq!(fake.last_request().header("depth"), Some("0"));
    }

    #[tokio::test]
    async fn unauthenticated_calls_send_nothing() {
        let (ctx, fake) = anonymous_context();
        let files = WebdavFiles::new(ctx);
        assert!(files.get_file_contents("a").await.is_err());
        assert!(files.delete("a").await.is_err());
        assert!(files.create_folder("a").await.is_err());
        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn put_and_get() {
        let (ctx, fake) = authed_context();
        let files = WebdavFiles::new(ctx);
        fake.push_with_header(201, "", "oc-fileid", "00000012oc");
        let result = files
            .put_file_contents("a.txt", Bytes::from_static(b"abc"), &PutOptions::default())
            .await
            .unwrap();
        assert_eq!(result.file_id.as_deref(), Some("00000012oc"));
        assert_eq!(result.etag, None);
        let req = fake.last_request();
        assert_eq!(req.header("if-none-match"), Some("*"));
        assert_eq!(req.header("authorization"), Some("Bearer token"));

        fake.push(200, "abc");
        let data = files.get_file_contents("a.txt").await.unwrap();
        assert_eq!(&data[..], b"abc");
    }

    #[tokio::test]
    async fn move_copy_destination() {
        let (ctx, fake) = authed_context();
        let files = WebdavFiles::new(ctx);
        fake.push(201, "");
        fake.push(204, "");
        files.move_file("a.txt", "b/a.txt").await.unwrap();
        files.copy("b/a.txt", "c.txt").await.unwrap();

        let reqs = fake.requests();
        assert_eq!(reqs[0].method.as_str(), "MOVE");
        assert_eq!(
            reqs[0].header("destination"),
            Some("https://cloud.example.com/remote.php/dav/files/alice/b/a.txt")
        );
        assert_eq!(reqs[1].method.as_str(), "COPY");
    }

    #[tokio::test]
    async fn mkcol_conflict() {
        let (ctx, fake) = authed_context();
        fake.push(405, "");
        let err = WebdavFiles::new(ctx).create_folder("docs").await.unwrap_err();
        assert_eq!(err.http_status(), Some(405));
    }
}
