// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · testing
// ──────────────────────────────────────────────────────────────────────────────
// In-memory transport for unit tests: replays queued responses in order and
// records every request it was asked to send.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::Context;
use crate::error::{OcError, OcResult};
use crate::session::Session;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::urls::UrlBuilder;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub(crate) const BASE_URL: &str = "https://cloud.example.com/";

#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<OcResult<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: u16, body: &str) {
        self.push_response(TransportResponse::new(status, body.to_string()));
    }

    pub fn push_with_header(&self, status: u16, body: &str, name: &'static str, value: &str) {
        let mut resp = TransportResponse::new(status, body.to_string());
        resp.headers
            .insert(name, value.parse().expect("test header value"));
        self.push_response(resp);
    }

    pub fn push_response(&self, resp: TransportResponse) {
        self.responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn push_error(&self, err: OcError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(&self, request: TransportRequest) -> OcResult<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(404, "no response queued")))
    }
}

/// Context over a fake transport, authorised as `alice`.
pub(crate) fn authed_context() -> (Arc<Context>, Arc<FakeTransport>) {
    let (ctx, fake) = anonymous_context();
    ctx.session().set_authorization("Bearer token").unwrap();
    ctx.session()
        .set_current_user(Some(crate::types::UserInfo::new("alice")));
    (ctx, fake)
}

/// Context over a fake transport with no credential.
pub(crate) fn anonymous_context() -> (Arc<Context>, Arc<FakeTransport>) {
    let fake = FakeTransport::new();
    let ctx = Context::new(
        UrlBuilder::new(BASE_URL).unwrap(),
        Session::new(),
        fake.clone(),
    );
    (Arc::new(ctx), fake)
}

pub(crate) fn ocs_body(statuscode: u32, data: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<ocs><meta><status>{}</status><statuscode>{}</statuscode>\
         <message></message></meta><data>{}</data></ocs>",
        if statuscode == 100 { "ok" } else { "failure" },
        statuscode,
        data
    )
}
