// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · users
// ──────────────────────────────────────────────────────────────────────────────
// User provisioning over OCS `cloud/users`:
//  • create / delete / search / lookup
//  • attribute updates
//  • group and subadmin-group membership
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::Context;
use crate::error::OcResult;
use crate::groups::element_list;
use crate::urls::{encode_segment, OCS_SERVICE_CLOUD};
use crate::xml::NormalizedNode;
use reqwest::Method;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Users {
    ctx: Arc<Context>,
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

impl Users {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    fn user_action(user: &str, suffix: &str) -> String {
        format!("users/{}{}", encode_segment(user), suffix)
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Create `user`, optionally adding it to `groups` in the same call.
    pub async fn create_user(&self, user: &str, password: &str, groups: &[&str]) -> OcResult<()> {
        let mut data = vec![pair("userid", user), pair("password", password)];
        data.extend(groups.iter().map(|g| pair("groups[]", g)));
        self.ctx
            .ocs_request(Method::POST, OCS_SERVICE_CLOUD, "users", &data)
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, user: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(Method::DELETE, OCS_SERVICE_CLOUD, &Self::user_action(user, ""), &[])
            .await?;
        Ok(())
    }

    /// User ids matching `query` (empty query lists everyone).
    pub async fn search_users(&self, query: &str) -> OcResult<Vec<String>> {
        let action = format!("users?search={}", encode_segment(query));
        let doc = self
            .ctx
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, &action, &[])
            .await?;
        Ok(element_list(&doc.data, "users"))
    }

    pub async fn user_exists(&self, user: &str) -> OcResult<bool> {
        Ok(self.search_users(user).await?.iter().any(|u| u == user))
    }

    /// The raw `<data>` of `cloud/users/<user>` (email, quota, displayname, …).
    pub async fn get_user(&self, user: &str) -> OcResult<NormalizedNode> {
        let doc = self
            .ctx
            .ocs_request(Method::GET, OCS_SERVICE_CLOUD, &Self::user_action(user, ""), &[])
            .await?;
        Ok(doc.data)
    }

    /// Set one attribute, e.g. `("email", "a@example.com")` or `("quota", "1GB")`.
    pub async fn set_user_attribute(&self, user: &str, key: &str, value: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::PUT,
                OCS_SERVICE_CLOUD,
                &Self::user_action(user, ""),
                &[pair("key", key), pair("value", value)],
            )
            .await?;
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────────────

    pub async fn add_user_to_group(&self, user: &str, group: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::POST,
                OCS_SERVICE_CLOUD,
                &Self::user_action(user, "/groups"),
                &[pair("groupid", group)],
            )
            .await?;
        Ok(())
    }

    pub async fn remove_user_from_group(&self, user: &str, group: &str) -> OcResult<()> {
        self.ctx
            .ocs_request(
                Method::DELETE,
                OCS_SERVICE_CLOUD,
                &Self::user_action(user, "/groups"),
                &[pair("groupid", group)],
            )
            .await?;
        Ok(())
    }

    pub async fn get_user_groups(&self, user: &str) -> OcResult<Vec<String>> {
        let doc = self
            .ctx
            .ocs_request(
                Method::GET,
                OCS_SERVICE_CLOUD,
                &Self::user_action(user, "/groups"),
                &[],
            )
            .await?;
        Ok(element_list(&doc.data, "groups"))
    }

    pub async fn user_is_in_group(&self, user: &str, group: &str) -> OcResult<bool> {
        Ok(self.get_user_groups(user).await?.iter().any(|g| g == group))
    }

    /// Groups `user` administers as a subadmin.
    pub async fn get_user_subadmin_groups(&self, user: &str) -> OcResult<Vec<String>> {
        let doc = self
            .ctx
            .ocs_request(
                Method::GET,
                OCS_SERVICE_CLOUD,
                &Self::user_action(user, "/subadmins"),
                &[],
            )
            .await?;
        Ok(doc.data.strings("element"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{authed_context, ocs_body};

    #[tokio::test]
    async fn create_user_with_groups() {
        let (ctx, fake) = authed_context();
        fake.push(200, &ocs_body(100, ""));
        Users::new(ctx)
            .create_user("bob", "s3cret", &["staff", "dev"])
            .await
            .unwrap();

        let req = fake.last_request();
        assert_eq!(req.url, "https://cloud.example.com/ocs/v1.php/cloud/users");
        assert_eq!(
            req.body.as_deref(),
            Some(&b"userid=bob&password=s3cret&groups%5B%5D=staff&groups%5B%5D=dev"[..])
        );
    }

    #[tokio::test]
    async fn search_and_exists() {
        let (ctx, fake) = authed_context();
        let users = Users::new(ctx);
        fake.push(200, &ocs_body(100, "<users><element>bob</element></users>"));
        fake.push(200, &ocs_body(100, "<users><element>bobby</element></users>"));

        assert!(users.user_exists("bob").await.unwrap());
        assert!(!users.user_exists("bob").await.unwrap());
        assert_eq!(
            fake.requests()[0].url,
            "https://cloud.example.com/ocs/v1.php/cloud/users?search=bob"
        );
    }

    #[tokio::test]
    async fn provisioning_disabled_is_uniform() {
        let (ctx, fake) = authed_context();
        fake.push(200, &ocs_body(999, ""));
        let err = Users::new(ctx).search_users("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(
            err.to_string(),
            "Provisioning API has been disabled at your instance"
        );
    }

    #[tokio::test]
    async fn get_user_returns_data() {
        let (ctx, fake) = authed_context();
        fake.push(
            200,
            &ocs_body(100, "<email>bob@example.com</email><quota><used>10</used></quota>"),
        );
        let data = Users::new(ctx).get_user("bob").await.unwrap();
        assert_eq!(data.get("email").and_then(NormalizedNode::as_str), Some("bob@example.com"));
        assert_eq!(data.path("quota.used").and_then(NormalizedNode::as_str), Some("10"));
    }

    #[tokio::test]
    async fn attribute_and_membership_requests() {
        let (ctx, fake) = authed_context();
        let users = Users::new(ctx);
        for _ in 0..4 {
            fake.push(200, &ocs_body(100, ""));
        }
        users.set_user_attribute("bob", "email", "b@x").await.unwrap();
        users.add_user_to_group("bob", "staff").await.unwrap();
        users.remove_user_from_group("bob", "staff").await.unwrap();
        users.delete_user("bob").await.unwrap();

        let reqs = fake.requests();
        assert_eq!(reqs[0].method, Method::PUT);
        assert_eq!(reqs[0].body.as_deref(), Some(&b"key=email&value=b%40x"[..]));
        assert_eq!(reqs[1].url, "https://cloud.example.com/ocs/v1.php/cloud/users/bob/groups");
        assert_eq!(reqs[2].method, Method::DELETE);
        assert_eq!(reqs[2].body.as_deref(), Some(&b"groupid=staff"[..]));
        assert_eq!(reqs[3].url, "https://cloud.example.com/ocs/v1.php/cloud/users/bob");
    }

    #[tokio::test]
    async fn groups_and_subadmins() {
        let (ctx, fake) = authed_context();
        let users = Users::new(ctx);
        fake.push(200, &ocs_body(100, "<groups><element>staff</element></groups>"));
        fake.push(200, &ocs_body(100, "<element>dev</element>"));

        assert!(users.user_is_in_group("bob", "staff").await.unwrap());
        assert_eq!(users.get_user_subadmin_groups("bob").await.unwrap(), vec!["dev"]);
    }
}
