//! Management operations implemented by the HTTP client and by test fakes.

use async_trait::async_trait;

use crate::bundle::ProxyBundle;
use crate::error::EdgeResult;
use crate::model::{
    ApiProduct, AppRequest, Deployments, Developer, DeveloperApp, ProxyInfo, ProxyRevision,
};

/// Organization-scoped management API.
///
/// Every method maps onto one HTTP call. Absent resources surface as
/// [`crate::EdgeError::Status`] with a 404 status.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Organization the session is bound to.
    fn org(&self) -> &str;

    /// Names of all API proxies.
    async fn list_proxies(&self) -> EdgeResult<Vec<String>>;

    /// Proxy summary including its revisions.
    async fn get_proxy(&self, name: &str) -> EdgeResult<ProxyInfo>;

    /// Import a bundle as a new revision of `name`, creating the proxy if needed.
    async fn import_proxy(&self, name: &str, bundle: ProxyBundle) -> EdgeResult<ProxyRevision>;

    /// Delete a proxy and all of its revisions.
    async fn delete_proxy(&self, name: &str) -> EdgeResult<()>;

    /// Deployment status of a proxy across environments.
    async fn get_deployments(&self, name: &str) -> EdgeResult<Deployments>;

    /// Deploy a proxy revision to an environment.
    async fn deploy(&self, name: &str, env: &str, revision: u32) -> EdgeResult<()>;

    /// Undeploy a proxy revision from an environment.
    async fn undeploy(&self, name: &str, env: &str, revision: u32) -> EdgeResult<()>;

    /// Names of all API products.
    async fn list_products(&self) -> EdgeResult<Vec<String>>;

    /// Read one API product.
    async fn get_product(&self, name: &str) -> EdgeResult<ApiProduct>;

    /// Create an API product.
    async fn create_product(&self, product: &ApiProduct) -> EdgeResult<ApiProduct>;

    /// Delete an API product.
    async fn delete_product(&self, name: &str) -> EdgeResult<()>;

    /// Emails of all developers.
    async fn list_developers(&self) -> EdgeResult<Vec<String>>;

    /// Read one developer.
    async fn get_developer(&self, email: &str) -> EdgeResult<Developer>;

    /// Create a developer.
    async fn create_developer(&self, developer: &Developer) -> EdgeResult<Developer>;

    /// Delete a developer.
    async fn delete_developer(&self, email: &str) -> EdgeResult<()>;

    /// Names of a developer's apps. A 404 means the developer does not exist.
    async fn list_apps(&self, developer: &str) -> EdgeResult<Vec<String>>;

    /// Read one developer app, including its credentials.
    async fn get_app(&self, developer: &str, name: &str) -> EdgeResult<DeveloperApp>;

    /// Create a developer app.
    async fn create_app(&self, developer: &str, app: &AppRequest) -> EdgeResult<DeveloperApp>;

    /// Delete a developer app.
    async fn delete_app(&self, developer: &str, name: &str) -> EdgeResult<()>;
}
