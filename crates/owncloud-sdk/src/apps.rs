// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · apps
// ──────────────────────────────────────────────────────────────────────────────
// App management over OCS `cloud/apps`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::Context;
use crate::error::OcResult;
use crate::groups::element_list;
use crate::urls::{encode_segment, OCS_SERVICE_CLOUD};
use reqwest::Method;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Apps {
    ctx: Arc<Context>,
}

impl Apps {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Every installed app id mapped to whether it is enabled.
    pub async fn get_apps(&self) -> OcResult<BTreeMap<String, bool>> {
        let all = self
            .ctx
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, "apps", &[])
            .await?;
        let enabled = self
            .ctx
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, "apps?filter=enabled", &[])
            .await?;

        let enabled = element_list(&enabled.data, "apps");
        Ok(element_list(&all.data, "apps")
            .into_iter()
            .map(|app| {
                let on = enabled.contains(&app);
                (app, on)
            })
            .collect())
    }

    pub async fn enable_app(&self, app: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::POST,
                OCS_SERVICE_CLOUD,
                &format!("apps/{}", encode_segment(app)),
                &[],
            )
            .await?;
        Ok(())
    }

    pub async fn disable_app(&self, app: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::DELETE,
                OCS_SERVICE_CLOUD,
                &format!("apps/{}", encode_segment(app)),
                &[],
            )
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
    use crate::testing::{authed_context, ocs_body};

    #[tokio::test]
    async fn apps_with_enabled_flag() {
        let (ctx, fake) = authed_context();
        fake.push(
            200,
            &ocs_body(
                100,
                "<apps><element>files</element><element>activity</element></apps>",
            ),
        );
        fake.push(200, &ocs_body(100, "<apps><element>files</element></apps>"));

        let apps = Apps::new(ctx).get_apps().await.unwrap();
        assert_eq!(apps.get("files"), Some(&true));
        assert_eq!(apps.get("activity"), Some(&false));
        assert_eq!(
            fake.requests()[1].url,
            "https://cloud.example.com/ocs/v1.php/cloud/apps?filter=enabled"
        );
    }

    #[tokio::test]
    async fn enable_disable() {
        let (ctx, fake) = authed_context();
        let apps = Apps::new(ctx);
        fake.push(200, &ocs_body(100, ""));
        fake.push(200, &ocs_body(100, ""));
        apps.enable_app("files_texteditor").await.unwrap();
        apps.disable_app("files_texteditor").await.unwrap();

        let reqs = fake.requests();
        assert_eq!(reqs[0].method, Method::POST);
        assert_eq!(reqs[1].method, Method::DELETE);
        assert_eq!(
            reqs[1].url,
            "https://cloud.example.com/ocs/v1.php/cloud/apps/files_texteditor"
        );
    }

    #[tokio::test]
    async fn unknown_app_is_service_error() {
        let (ctx, fake) = authed_context();
        fake.push(200, &ocs_body(998, ""));
        let err = Apps::new(ctx).enable_app("nope").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Service);
    }
}
