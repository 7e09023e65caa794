// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · public_files
// ──────────────────────────────────────────────────────────────────────────────
// Anonymous access to public links over `remote.php/dav/public-files/<token>`.
// The session credential is never sent; a link password travels as
// `Basic base64("public:<password>")`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{copy_method, mkcol_method, move_method, Context};
use crate::error::OcResult;
use crate::files::{apply_put_options, value};
use crate::session::basic_authorization;
use crate::types::{
    FileInfo, PropfindDepth, PutOptions, PutResult, BASIC_FILE_PROPERTIES,
    PUBLIC_LINK_PROPERTIES,
};
use bytes::Bytes;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Method;
use std::sync::Arc;

const PUBLIC_USER: &str = "public";

#[derive(Debug, Clone)]
pub struct PublicFiles {
    ctx: Arc<Context>,
}

impl PublicFiles {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// URL of a public link (or of `path` inside it).
    pub fn get_file_url(&self, token: &str, path: Option<&str>) -> String {
        let token = token.trim_matches('/');
        match path.map(|p| p.trim_start_matches('/')).filter(|p| !p.is_empty()) {
            Some(p) => self
                .ctx
                .urls()
                .build_webdav_path(&format!("public-files/{}/{}", token, p)),
            None => self.ctx.urls().build_webdav_path(&format!("public-files/{}", token)),
        }
    }

    fn headers(&self, password: Option<&str>) -> OcResult<HeaderMap> {
        let mut headers = self.ctx.session().build_headers(false);
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            headers.insert(AUTHORIZATION, value(&basic_authorization(PUBLIC_USER, pw))?);
        }
        Ok(headers)
    }

    // ── Listing ──────────────────────────────────────────────────────────

    pub async fn list(
        &self,
        token_and_path: &str,
        password: Option<&str>,
        depth: PropfindDepth,
    ) -> OcResult<Vec<FileInfo>> {
        self.list_with(token_and_path, password, BASIC_FILE_PROPERTIES.to_vec(), depth)
            .await
    }

    /// Like [`Self::list`], also requesting the public-link properties.
    pub async fn list_extended(
        &self,
        token_and_path: &str,
        password: Option<&str>,
        depth: PropfindDepth,
    ) -> OcResult<Vec<FileInfo>> {
        let mut properties = BASIC_FILE_PROPERTIES.to_vec();
        properties.extend_from_slice(PUBLIC_LINK_PROPERTIES);
        self.list_with(token_and_path, password, properties, depth)
            .await
    }

    async fn list_with(
        &self,
        token_and_path: &str,
        password: Option<&str>,
        properties: Vec<crate::types::DavProperty>,
        depth: PropfindDepth,
    ) -> OcResult<Vec<FileInfo>> {
        let url = self.get_file_url(token_and_path, None);
        let token = token_and_path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        let root = format!("{}public-files/{}", self.ctx.urls().webdav_root_path(), token);

        let nodes = self
            .ctx
            .propfind(&url, &properties, depth, self.headers(password)?)
            .await?;
        Ok(nodes
            .iter()
            .map(|n| FileInfo::from_response(n, &root))
            .collect())
    }

    // ── Content ──────────────────────────────────────────────────────────

    pub async fn download(
        &self,
        token: &str,
        path: Option<&str>,
        password: Option<&str>,
    ) -> OcResult<Bytes> {
        let url = self.get_file_url(token, path);
        let resp = self
            .ctx
            .dav_request(Method::GET, &url, self.headers(password)?, None)
            .await?;
        Ok(resp.body)
    }

    /// Upload `content`. Without `previous_entity_tag` or `overwrite` the
    /// request carries `If-None-Match: *`, so an existing file yields 412.
    pub async fn put_file_contents(
        &self,
        token: &str,
        path: Option<&str>,
        password: Option<&str>,
        content: impl Into<Bytes>,
        options: &PutOptions,
    ) -> OcResult<PutResult> {
        let url = self.get_file_url(token, path);
        let mut headers = self.headers(password)?;
        apply_put_options(&mut headers, options)?;
        let resp = self
            .ctx
            .dav_request(Method::PUT, &url, headers, Some(content.into()))
            .await?;
        Ok(PutResult {
            etag: resp.header("etag").map(str::to_string),
            file_id: resp.header("oc-fileid").map(str::to_string),
        })
    }

    // ── Collections ──────────────────────────────────────────────────────

    pub async fn create_folder(
        &self,
        token: &str,
        path: Option<&str>,
        password: Option<&str>,
    ) -> OcResult<()> {
        let url = self.get_file_url(token, path);
        self.ctx
            .dav_request(mkcol_method()?, &url, self.headers(password)?, None)
            .await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        token: &str,
        path: Option<&str>,
        password: Option<&str>,
    ) -> OcResult<()> {
        let url = self.get_file_url(token, path);
        self.ctx
            .dav_request(Method::DELETE, &url, self.headers(password)?, None)
            .await?;
        Ok(())
    }

    /// Move within public links; `source` and `target` include the token.
    pub async fn move_file(&self, source: &str, target: &str, password: Option<&str>) -> OcResult<()> {
        self.transfer(move_method()?, source, target, password).await
    }

    pub async fn copy(&self, source: &str, target: &str, password: Option<&str>) -> OcResult<()> {
        self.transfer(copy_method()?, source, target, password).await
    }

    async fn transfer(
        &self,
        method: Method,
        source: &str,
        target: &str,
        password: Option<&str>,
    ) -> OcResult<()> {
        let source_url = self.get_file_url(source, None);
        let target_url = self.get_file_url(target, None);
        let mut headers = self.headers(password)?;
        headers.insert("destination", value(&target_url)?);
        self.ctx
            .dav_request(method, &source_url, headers, None)
            .await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anonymous_context, authed_context};
    use reqwest::header::HeaderValue;

    #[test]
    fn file_urls() {
        let (ctx, _) = anonymous_context();
        let public = PublicFiles::new(ctx);
        assert_eq!(
            public.get_file_url("tok123", None),
            "https://cloud.example.com/remote.php/dav/public-files/tok123"
        );
        assert_eq!(
            public.get_file_url("tok123", Some("/sub dir/a.txt")),
            "https://cloud.example.com/remote.php/dav/public-files/tok123/sub%20dir/a.txt"
        );
    }

    #[tokio::test]
    async fn list_never_sends_session_credential() {
        let (ctx, fake) = authed_context();
        fake.push(
            207,
            r#"<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:response><d:href>/remote.php/dav/public-files/tok123/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype>
    <oc:public-link-item-type>folder</oc:public-link-item-type></d:prop>
    <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
  <d:response><d:href>/remote.php/dav/public-files/tok123/a.txt</d:href>
    <d:propstat><d:prop><d:getcontentlength>3</d:getcontentlength><d:resourcetype/></d:prop>
    <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
</d:multistatus>"#,
        );
        let items = PublicFiles::new(ctx)
            .list_extended("tok123", None, PropfindDepth::One)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].property_str("public-link-item-type"), Some("folder"));
        assert_eq!(items[1].name, "/a.txt");

        let req = fake.last_request();
        assert_eq!(req.header("authorization"), None);
        let body = String::from_utf8(req.body.unwrap().to_vec()).unwrap();
        assert!(body.contains("public-link-item-type"));
    }

    #[tokio::test]
    async fn password_becomes_public_basic_auth() {
        let (ctx, fake) = anonymous_context();
        fake.push(200, "hello");
        let data = PublicFiles::new(ctx)
            .download("tok123", Some("a.txt"), Some("secret"))
            .await
            .unwrap();
        assert_eq!(&data[..], b"hello");
        assert_eq!(
            fake.last_request().header("authorization"),
            Some("Basic cHVibGljOnNlY3JldA==")
        );
    }

    #[tokio::test]
    async fn download_failure_keeps_body() {
        let (ctx, fake) = anonymous_context();
        fake.push(401, "wrong password");
        let err = PublicFiles::new(ctx)
            .download("tok123", None, Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(401));
        assert_eq!(err.as_http().unwrap().body(), "wrong password");
    }

    #[tokio::test]
    async fn put_conditions_and_result() {
        let (ctx, fake) = anonymous_context();
        let public = PublicFiles::new(ctx);

        let mut resp = crate::transport::TransportResponse::new(201, "");
        resp.headers.insert("etag", HeaderValue::from_static("\"e1\""));
        resp.headers.insert("oc-fileid", HeaderValue::from_static("00000042oc"));
        fake.push_response(resp);
        let result = public
            .put_file_contents("tok", Some("a.txt"), None, "abc", &PutOptions::default())
            .await
            .unwrap();
        assert_eq!(result.etag.as_deref(), Some("\"e1\""));
        assert_eq!(result.file_id.as_deref(), Some("00000042oc"));
        let req = fake.last_request();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.header("if-none-match"), Some("*"));
        assert_eq!(req.header("if-match"), None);

        fake.push(204, "");
        let opts = PutOptions {
            previous_entity_tag: Some("\"e1\"".into()),
            ..Default::default()
        };
        public
            .put_file_contents("tok", Some("a.txt"), None, "abcd", &opts)
            .await
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.header("if-match"), Some("\"e1\""));
        assert_eq!(req.header("if-none-match"), None);

        fake.push(204, "");
        let opts = PutOptions {
            overwrite: true,
            ..Default::default()
        };
        public
            .put_file_contents("tok", Some("a.txt"), None, "x", &opts)
            .await
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.header("if-match"), None);
        assert_eq!(req.header("if-none-match"), None);
    }

    #[tokio::test]
    async fn put_existing_file_is_precondition_failure() {
        let (ctx, fake) = anonymous_context();
        fake.push(412, "");
        let err = PublicFiles::new(ctx)
            .put_file_contents("tok", Some("a.txt"), None, "abc", &PutOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(412));
    }

    #[tokio::test]
    async fn folder_delete_move_copy() {
        let (ctx, fake) = anonymous_context();
        let public = PublicFiles::new(ctx);
        for _ in 0..4 {
            fake.push(201, "");
        }
        public.create_folder("tok", Some("new"), None).await.unwrap();
        public.delete("tok", Some("old.txt"), None).await.unwrap();
        public.move_file("tok/a.txt", "tok/b.txt", None).await.unwrap();
        public.copy("tok/b.txt", "tok/c.txt", Some("pw")).await.unwrap();

        let reqs = fake.requests();
        assert_eq!(reqs[0].method.as_str(), "MKCOL");
        assert_eq!(reqs[1].method, Method::DELETE);
        assert_eq!(reqs[2].method.as_str(), "MOVE");
        assert_eq!(
            reqs[2].header("destination"),
            Some("https://cloud.example.com/remote.php/dav/public-files/tok/b.txt")
        );
        assert_eq!(reqs[3].method.as_str(), "COPY");
        assert!(reqs[3].header("authorization").is_some());
    }
}
