// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · groups
// ──────────────────────────────────────────────────────────────────────────────
// Group provisioning over OCS `cloud/groups`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::Context;
use crate::error::OcResult;
use crate::urls::{encode_segment, OCS_SERVICE_CLOUD};
use crate::xml::NormalizedNode;
use reqwest::Method;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Groups {
    ctx: Arc<Context>,
}

impl Groups {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub async fn create_group(&self, group: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::POST,
                OCS_SERVICE_CLOUD,
                "groups",
                &[("groupid".to_string(), group.to_string())],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_group(&self, group: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::DELETE,
                OCS_SERVICE_CLOUD,
                &format!("groups/{}", encode_segment(group)),
                &[],
            )
            .await?;
        Ok(())
    }

    /// All group names.
    pub async fn get_groups(&self) -> OcResult<Vec<String>> {
        let doc = self
            .ctx
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, "groups", &[])
            .await?;
        Ok(element_list(&doc.data, "groups"))
    }

    /// User ids belonging to `group`.
    pub async fn get_group_members(&self, group: &str) -> OcResult<Vec<String>> {
        let doc = self
            .ctx
            .ocs_request(
                Method::GET,
                OCS_SERVICE_CLOUD,
                &format!("groups/{}", encode_segment(group)),
                &[],
            )
            .await?;
        Ok(element_list(&doc.data, "users"))
    }

    pub async fn group_exists(&self, group: &str) -> OcResult<bool> {
        Ok(self.get_groups().await?.iter().any(|g| g == group))
    }
}

/// `data.<what>.element` as a list, however many elements there were.
pub(crate) fn element_list(data: &NormalizedNode, what: &str) -> Vec<String> {
    data.get(what)
        .map(|node| node.strings("element"))
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
