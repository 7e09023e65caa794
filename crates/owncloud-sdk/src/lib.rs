//! # ownCloud SDK
//!
//! Async client for an ownCloud instance:
//!
//! - **Files**: list, download, upload, mkcol, delete, move, copy over
//!   WebDAV, or over a Reva gRPC gateway selected at construction time
//! - **Trash-bin**: list, clear, restore
//! - **Public links**: anonymous (optionally password-protected) access
//! - **Provisioning**: OCS users, groups and apps
//! - **Session**: credentials, extra headers, current user and a cached
//!   capability set per client
//!
//! Every operation returns [`OcResult`]; failures are classified by
//! [`ErrorKind`] as pre-flight, transport, service or parse errors.
//!
//! ```no_run
//! use owncloud_sdk::{ClientOptions, OwnCloud, PropfindDepth};
//!
//! # async fn demo() -> owncloud_sdk::OcResult<()> {
//! let oc = OwnCloud::new(
//!     ClientOptions::new("https://cloud.example.com/").with_basic("alice", "secret"),
//! )?;
//! oc.login().await?;
//! for item in oc.trash().list("", PropfindDepth::One).await? {
//!     println!("{} {:?}", item.name, item.property_str("trashbin-original-location"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod client;
pub mod config;
pub mod error;
pub mod files;
pub mod groups;
pub mod grpc;
pub mod public_files;
pub mod service;
pub mod session;
pub mod transport;
pub mod trash;
pub mod types;
pub mod urls;
pub mod users;
pub mod xml;

#[cfg(test)]
mod testing;

pub use client::Context;
pub use config::{AuthOptions, BasicCredentials, ClientOptions, ConnectorKind, TransportOptions};
pub use error::{ErrorKind, HttpError, OcError, OcResult};
pub use files::{FileBackend, WebdavFiles};
pub use grpc::{GrpcFiles, RevaGateway, RpcCode, RpcReply, RpcStatus};
pub use service::{OwnCloud, OwnCloudBuilder};
pub use session::{CacheState, Session};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
pub use types::{
    Capabilities, DavProperty, FileInfo, OcsRequest, PropfindDepth, PutOptions, PutResult,
    ResourceType, UserInfo,
};
pub use xml::NormalizedNode;
