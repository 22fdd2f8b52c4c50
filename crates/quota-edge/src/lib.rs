#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Typed access to the Apigee Edge management API, limited to the calls the
//! quota demo needs.
//!
//! Layout:
//! - `api.rs`: the `ManagementApi` seam implemented by the HTTP client and test fakes
//! - `client.rs`: reqwest-backed client and connection/authentication
//! - `entity.rs`: per-kind capabilities plus conditional create/delete
//! - `proxy.rs`: conditional import, deploy, and undeploy of API proxies
//! - `bundle.rs`: zipping an `apiproxy/` tree for import
//! - `model.rs`: wire payloads
//! - `error.rs`: error type and not-found classification

pub mod api;
pub mod bundle;
pub mod client;
pub mod entity;
pub mod error;
pub mod model;
pub mod proxy;

pub use api::ManagementApi;
pub use bundle::ProxyBundle;
pub use client::{
    ConnectOptions, Credentials, DEFAULT_MGMT_SERVER, DEFAULT_SSO_URL, EdgeClient,
    basic_authorization,
};
pub use entity::{
    AppEntity, DeveloperEntity, EntityKind, ManagedEntity, ProductEntity, Provisioned,
    ProxyEntity, Removal, ensure_absent, ensure_present,
};
pub use error::{EdgeError, EdgeResult};
pub use model::{
    AccessTokenResponse, ApiProduct, AppRequest, Attribute, Credential, Deployments, Developer,
    DeveloperApp, EnvironmentDeployment, ProxyInfo, ProxyRevision, Quota, QuotaTimeUnit,
    RevisionDeployment, attributes, parse_key_expiry,
};
pub use proxy::{Deployment, ensure_deployed, ensure_imported, ensure_undeployed};
