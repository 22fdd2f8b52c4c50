//! Per-kind entity capabilities and the conditional create/delete helpers built on them.
//!
//! # Design
//!
//! - Each managed kind implements [`ManagedEntity`] with its own list/find/fetch/create/delete.
//! - [`ensure_present`] creates only when the discriminator is not listed.
//! - [`ensure_absent`] deletes only when the discriminator is listed and treats 404 as absence.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{error, info};

use crate::api::ManagementApi;
use crate::bundle::ProxyBundle;
use crate::error::{EdgeError, EdgeResult};
use crate::model::{ApiProduct, AppRequest, Developer, DeveloperApp, ProxyInfo};

/// Remote resource kinds managed by the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// API proxy.
    Proxy,
    /// API product.
    Product,
    /// Developer.
    Developer,
    /// Developer app.
    DeveloperApp,
}

impl EntityKind {
    /// Collection name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxies",
            Self::Product => "products",
            Self::Developer => "developers",
            Self::DeveloperApp => "developerapps",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of a conditional create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned<T> {
    /// The entity already existed and was read back.
    Existing(T),
    /// The entity was created by this call.
    Created(T),
}

impl<T> Provisioned<T> {
    /// Whether this call created the entity.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Borrow the entity.
    #[must_use]
    pub const fn get(&self) -> &T {
        match self {
            Self::Existing(value) | Self::Created(value) => value,
        }
    }

    /// Unwrap the entity.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Existing(value) | Self::Created(value) => value,
        }
    }

    const fn outcome(&self) -> &'static str {
        match self {
            Self::Existing(_) => "exists",
            Self::Created(_) => "created",
        }
    }
}

/// Outcome of a conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entity existed and was deleted.
    Deleted,
    /// Nothing to delete.
    Absent,
}

impl Removal {
    const fn outcome(self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Absent => "absent",
        }
    }
}

/// Capability set of one managed entity kind, bound to a fixed discriminator and payload.
#[async_trait]
pub trait ManagedEntity: Send + Sync {
    /// Representation returned by `fetch` and `create`.
    type Resource: Send;

    /// Kind of entity.
    fn kind(&self) -> EntityKind;

    /// Fixed name identifying the entity.
    fn discriminator(&self) -> &str;

    /// Names of existing entities of this kind.
    async fn list(&self, api: &dyn ManagementApi) -> EdgeResult<Vec<String>>;

    /// Locate the discriminator in a listing.
    fn find<'a>(&self, existing: &'a [String]) -> Option<&'a str> {
        existing
            .iter()
            .map(String::as_str)
            .find(|name| *name == self.discriminator())
    }

    /// Read the existing entity.
    async fn fetch(&self, api: &dyn ManagementApi) -> EdgeResult<Self::Resource>;

    /// Create the entity from its fixed payload.
    async fn create(&self, api: &dyn ManagementApi) -> EdgeResult<Self::Resource>;

    /// Delete the entity by its fixed identifier.
    async fn delete(&self, api: &dyn ManagementApi) -> EdgeResult<()>;
}

/// Create the entity unless the listing already contains it.
///
/// # Errors
///
/// Logs and propagates any list, fetch, or create failure.
pub async fn ensure_present<E>(
    api: &dyn ManagementApi,
    entity: &E,
) -> EdgeResult<Provisioned<E::Resource>>
where
    E: ManagedEntity + ?Sized,
{
    let outcome = match establish(api, entity).await {
        Ok(outcome) => outcome,
        Err(err) => {
            log_unexpected(entity.kind(), entity.discriminator(), &err);
            return Err(err);
        }
    };
    info!(
        entity = %entity.kind(),
        name = entity.discriminator(),
        outcome = outcome.outcome(),
        "conditional create"
    );
    Ok(outcome)
}

async fn establish<E>(
    api: &dyn ManagementApi,
    entity: &E,
) -> EdgeResult<Provisioned<E::Resource>>
where
    E: ManagedEntity + ?Sized,
{
    let existing = entity.list(api).await?;
    Ok(if entity.find(&existing).is_some() {
        Provisioned::Existing(entity.fetch(api).await?)
    } else {
        Provisioned::Created(entity.create(api).await?)
    })
}

/// Delete the entity if the listing contains it. A 404 anywhere counts as already absent.
///
/// # Errors
///
/// Logs and propagates any failure other than 404.
pub async fn ensure_absent<E>(api: &dyn ManagementApi, entity: &E) -> EdgeResult<Removal>
where
    E: ManagedEntity + ?Sized,
{
    let removal = match remove(api, entity).await {
        Ok(removal) => removal,
        Err(err) if err.is_not_found() => Removal::Absent,
        Err(err) => {
            log_unexpected(entity.kind(), entity.discriminator(), &err);
            return Err(err);
        }
    };
    info!(
        entity = %entity.kind(),
        name = entity.discriminator(),
        outcome = removal.outcome(),
        "conditional delete"
    );
    Ok(removal)
}

async fn remove<E>(api: &dyn ManagementApi, entity: &E) -> EdgeResult<Removal>
where
    E: ManagedEntity + ?Sized,
{
    let existing = entity.list(api).await?;
    if entity.find(&existing).is_none() {
        return Ok(Removal::Absent);
    }
    entity.delete(api).await?;
    Ok(Removal::Deleted)
}

pub(crate) fn log_unexpected(kind: EntityKind, name: &str, err: &EdgeError) {
    match err {
        EdgeError::Status {
            operation,
            status,
            body,
        } => error!(
            entity = %kind,
            name,
            operation,
            %status,
            body = body.as_str(),
            "unexpected error"
        ),
        other => error!(entity = %kind, name, error = ?other, "unexpected error"),
    }
}

/// The demo API proxy, imported from a local bundle source.
#[derive(Debug, Clone)]
pub struct ProxyEntity {
    name: String,
    source: PathBuf,
}

impl ProxyEntity {
    /// Proxy `name` whose bundle lives at or below `source`.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Bundle source directory.
    #[must_use]
    pub fn source(&self) -> &std::path::Path {
        &self.source
    }
}

#[async_trait]
impl ManagedEntity for ProxyEntity {
    type Resource = ProxyInfo;

    fn kind(&self) -> EntityKind {
        EntityKind::Proxy
    }

    fn discriminator(&self) -> &str {
        &self.name
    }

    async fn list(&self, api: &dyn ManagementApi) -> EdgeResult<Vec<String>> {
        api.list_proxies().await
    }

    async fn fetch(&self, api: &dyn ManagementApi) -> EdgeResult<ProxyInfo> {
        api.get_proxy(&self.name).await
    }

    async fn create(&self, api: &dyn ManagementApi) -> EdgeResult<ProxyInfo> {
        let bundle = ProxyBundle::from_dir(&self.source)?;
        let imported = api.import_proxy(&self.name, bundle).await?;
        Ok(ProxyInfo {
            name: imported.name,
            revision: vec![imported.revision],
        })
    }

    async fn delete(&self, api: &dyn ManagementApi) -> EdgeResult<()> {
        api.delete_proxy(&self.name).await
    }
}

/// The demo API product.
#[derive(Debug, Clone)]
pub struct ProductEntity {
    product: ApiProduct,
}

impl ProductEntity {
    /// Wrap the create payload.
    #[must_use]
    pub const fn new(product: ApiProduct) -> Self {
        Self { product }
    }

    /// Create payload.
    #[must_use]
    pub const fn payload(&self) -> &ApiProduct {
        &self.product
    }
}

#[async_trait]
impl ManagedEntity for ProductEntity {
    type Resource = ApiProduct;

    fn kind(&self) -> EntityKind {
        EntityKind::Product
    }

    fn discriminator(&self) -> &str {
        &self.product.name
    }

    async fn list(&self, api: &dyn ManagementApi) -> EdgeResult<Vec<String>> {
        api.list_products().await
    }

    async fn fetch(&self, api: &dyn ManagementApi) -> EdgeResult<ApiProduct> {
        api.get_product(&self.product.name).await
    }

    async fn create(&self, api: &dyn ManagementApi) -> EdgeResult<ApiProduct> {
        api.create_product(&self.product).await
    }

    async fn delete(&self, api: &dyn ManagementApi) -> EdgeResult<()> {
        api.delete_product(&self.product.name).await
    }
}

/// The demo developer.
#[derive(Debug, Clone)]
pub struct DeveloperEntity {
    developer: Developer,
}

impl DeveloperEntity {
    /// Wrap the create payload.
    #[must_use]
    pub const fn new(developer: Developer) -> Self {
        Self { developer }
    }

    /// Create payload.
    #[must_use]
    pub const fn payload(&self) -> &Developer {
        &self.developer
    }
}

#[async_trait]
impl ManagedEntity for DeveloperEntity {
    type Resource = Developer;

    fn kind(&self) -> EntityKind {
        EntityKind::Developer
    }

    fn discriminator(&self) -> &str {
        &self.developer.email
    }

    async fn list(&self, api: &dyn ManagementApi) -> EdgeResult<Vec<String>> {
        api.list_developers().await
    }

    // The server stores emails lowercased.
    fn find<'a>(&self, existing: &'a [String]) -> Option<&'a str> {
        existing
            .iter()
            .map(String::as_str)
            .find(|email| email.eq_ignore_ascii_case(&self.developer.email))
    }

    async fn fetch(&self, api: &dyn ManagementApi) -> EdgeResult<Developer> {
        api.get_developer(&self.developer.email).await
    }

    async fn create(&self, api: &dyn ManagementApi) -> EdgeResult<Developer> {
        api.create_developer(&self.developer).await
    }

    async fn delete(&self, api: &dyn ManagementApi) -> EdgeResult<()> {
        api.delete_developer(&self.developer.email).await
    }
}

/// The demo developer app, owned by a developer.
#[derive(Debug, Clone)]
pub struct AppEntity {
    developer: String,
    app: AppRequest,
}

impl AppEntity {
    /// Wrap the create payload for an app owned by `developer`.
    #[must_use]
    pub fn new(developer: impl Into<String>, app: AppRequest) -> Self {
        Self {
            developer: developer.into(),
            app,
        }
    }

    /// Owning developer's email.
    #[must_use]
    pub fn developer(&self) -> &str {
        &self.developer
    }

    /// Create payload.
    #[must_use]
    pub const fn payload(&self) -> &AppRequest {
        &self.app
    }
}

#[async_trait]
impl ManagedEntity for AppEntity {
    type Resource = DeveloperApp;

    fn kind(&self) -> EntityKind {
        EntityKind::DeveloperApp
    }

    fn discriminator(&self) -> &str {
        &self.app.name
    }

    async fn list(&self, api: &dyn ManagementApi) -> EdgeResult<Vec<String>> {
        api.list_apps(&self.developer).await
    }

    async fn fetch(&self, api: &dyn ManagementApi) -> EdgeResult<DeveloperApp> {
        api.get_app(&self.developer, &self.app.name).await
    }

    async fn create(&self, api: &dyn ManagementApi) -> EdgeResult<DeveloperApp> {
        api.create_app(&self.developer, &self.app).await
    }

    async fn delete(&self, api: &dyn ManagementApi) -> EdgeResult<()> {
        api.delete_app(&self.developer, &self.app.name).await
    }
}
