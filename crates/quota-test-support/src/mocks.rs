//! In-memory management API that enforces the server's referential rules.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use quota_edge::{
    ApiProduct, AppRequest, Credential, Deployments, Developer, DeveloperApp, EdgeError,
    EdgeResult, EnvironmentDeployment, ManagementApi, ProxyBundle, ProxyInfo, ProxyRevision,
    RevisionDeployment,
};
use reqwest::StatusCode;
use uuid::Uuid;

/// One call received by [`InMemoryEdge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `GET /apis`
    ListProxies,
    /// `GET /apis/{name}`
    GetProxy(String),
    /// `POST /apis?action=import`
    ImportProxy(String),
    /// `DELETE /apis/{name}`
    DeleteProxy(String),
    /// `GET /apis/{name}/deployments`
    GetDeployments(String),
    /// `POST .../revisions/{rev}/deployments`
    Deploy {
        /// Proxy name.
        name: String,
        /// Target environment.
        env: String,
        /// Revision deployed.
        revision: u32,
    },
    /// `DELETE .../revisions/{rev}/deployments`
    Undeploy {
        /// Proxy name.
        name: String,
        /// Target environment.
        env: String,
        /// Revision undeployed.
        revision: u32,
    },
    /// `GET /apiproducts`
    ListProducts,
    /// `GET /apiproducts/{name}`
    GetProduct(String),
    /// `POST /apiproducts`
    CreateProduct(String),
    /// `DELETE /apiproducts/{name}`
    DeleteProduct(String),
    /// `GET /developers`
    ListDevelopers,
    /// `GET /developers/{email}`
    GetDeveloper(String),
    /// `POST /developers`
    CreateDeveloper(String),
    /// `DELETE /developers/{email}`
    DeleteDeveloper(String),
    /// `GET /developers/{email}/apps`
    ListApps(String),
    /// `GET /developers/{email}/apps/{name}`
    GetApp {
        /// Owning developer.
        developer: String,
        /// App name.
        name: String,
    },
    /// `POST /developers/{email}/apps`
    CreateApp {
        /// Owning developer.
        developer: String,
        /// App name.
        name: String,
    },
    /// `DELETE /developers/{email}/apps/{name}`
    DeleteApp {
        /// Owning developer.
        developer: String,
        /// App name.
        name: String,
    },
}

impl ApiCall {
    /// Operation name, matching the names the HTTP client reports in errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::ListProxies => "proxies.list",
            Self::GetProxy(_) => "proxies.get",
            Self::ImportProxy(_) => "proxies.import",
            Self::DeleteProxy(_) => "proxies.delete",
            Self::GetDeployments(_) => "proxies.deployments",
            Self::Deploy { .. } => "proxies.deploy",
            Self::Undeploy { .. } => "proxies.undeploy",
            Self::ListProducts => "products.list",
            Self::GetProduct(_) => "products.get",
            Self::CreateProduct(_) => "products.create",
            Self::DeleteProduct(_) => "products.delete",
            Self::ListDevelopers => "developers.list",
            Self::GetDeveloper(_) => "developers.get",
            Self::CreateDeveloper(_) => "developers.create",
            Self::DeleteDeveloper(_) => "developers.delete",
            Self::ListApps(_) => "apps.list",
            Self::GetApp { .. } => "apps.get",
            Self::CreateApp { .. } => "apps.create",
            Self::DeleteApp { .. } => "apps.delete",
        }
    }

    /// Whether the call changes server state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::ImportProxy(_)
                | Self::DeleteProxy(_)
                | Self::Deploy { .. }
                | Self::Undeploy { .. }
                | Self::CreateProduct(_)
                | Self::DeleteProduct(_)
                | Self::CreateDeveloper(_)
                | Self::DeleteDeveloper(_)
                | Self::CreateApp { .. }
                | Self::DeleteApp { .. }
        )
    }
}

#[derive(Debug, Default)]
struct StoredProxy {
    revisions: BTreeSet<u32>,
    deployed: BTreeMap<String, BTreeSet<u32>>,
    bundle_entries: Vec<String>,
}

#[derive(Debug)]
struct StoredApp {
    developer: String,
    app: DeveloperApp,
    api_products: Vec<String>,
}

#[derive(Debug, Default)]
struct EdgeState {
    environments: BTreeSet<String>,
    proxies: BTreeMap<String, StoredProxy>,
    products: BTreeMap<String, ApiProduct>,
    developers: BTreeMap<String, Developer>,
    apps: Vec<StoredApp>,
    calls: Vec<ApiCall>,
    faults: HashMap<&'static str, StatusCode>,
}

impl EdgeState {
    fn app_index(&self, developer: &str, name: &str) -> Option<usize> {
        self.apps
            .iter()
            .position(|stored| stored.developer == developer && stored.app.name == name)
    }
}

/// Management API fake backed by in-process state.
///
/// Mirrors the server rules the demo depends on: absent resources answer 404, duplicate
/// creates answer 409, and entities referenced by others cannot be deleted.
#[derive(Debug)]
pub struct InMemoryEdge {
    org: String,
    state: Mutex<EdgeState>,
}

impl InMemoryEdge {
    /// Empty organization with `test` and `prod` environments.
    #[must_use]
    pub fn new(org: impl Into<String>) -> Self {
        let state = EdgeState {
            environments: ["test", "prod"].into_iter().map(str::to_string).collect(),
            ..EdgeState::default()
        };
        Self {
            org: org.into(),
            state: Mutex::new(state),
        }
    }

    /// Make the next call of `operation` fail with `status`.
    pub fn fail_next(&self, operation: &'static str, status: StatusCode) {
        self.lock().faults.insert(operation, status);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls that changed state, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Whether nothing exists in the organization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.proxies.is_empty()
            && state.products.is_empty()
            && state.developers.is_empty()
            && state.apps.is_empty()
    }

    /// Whether the proxy exists.
    #[must_use]
    pub fn has_proxy(&self, name: &str) -> bool {
        self.lock().proxies.contains_key(name)
    }

    /// Revisions of `name` deployed to `env`.
    #[must_use]
    pub fn deployed_revisions(&self, name: &str, env: &str) -> Vec<u32> {
        self.lock()
            .proxies
            .get(name)
            .and_then(|proxy| proxy.deployed.get(env))
            .map(|revisions| revisions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every deployment of `name` without recording a call.
    pub fn undeploy_everywhere(&self, name: &str) {
        if let Some(proxy) = self.lock().proxies.get_mut(name) {
            proxy.deployed.clear();
        }
    }

    /// Archive entries of the most recent import of `name`.
    #[must_use]
    pub fn imported_entries(&self, name: &str) -> Option<Vec<String>> {
        self.lock()
            .proxies
            .get(name)
            .map(|proxy| proxy.bundle_entries.clone())
    }

    /// Stored product, if any.
    #[must_use]
    pub fn product(&self, name: &str) -> Option<ApiProduct> {
        self.lock().products.get(name).cloned()
    }

    /// Stored developer, looked up case-insensitively.
    #[must_use]
    pub fn developer(&self, email: &str) -> Option<Developer> {
        self.lock()
            .developers
            .get(&email.to_ascii_lowercase())
            .cloned()
    }

    /// Stored app, if any.
    #[must_use]
    pub fn app(&self, developer: &str, name: &str) -> Option<DeveloperApp> {
        let state = self.lock();
        state
            .app_index(&developer.to_ascii_lowercase(), name)
            .map(|index| state.apps[index].app.clone())
    }

    fn lock(&self) -> MutexGuard<'_, EdgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply<T>(
        &self,
        call: ApiCall,
        handler: impl FnOnce(&mut EdgeState, &'static str) -> EdgeResult<T>,
    ) -> EdgeResult<T> {
        let operation = call.operation();
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(status) = state.faults.remove(operation) {
            return Err(EdgeError::status(operation, status, "injected failure"));
        }
        handler(&mut state, operation)
    }
}

fn not_found(operation: &'static str, what: &str) -> EdgeError {
    EdgeError::status(
        operation,
        StatusCode::NOT_FOUND,
        format!("{{\"code\":\"NotFound\",\"message\":\"{what} does not exist\"}}"),
    )
}

fn conflict(operation: &'static str, what: &str) -> EdgeError {
    EdgeError::status(
        operation,
        StatusCode::CONFLICT,
        format!("{{\"code\":\"Conflict\",\"message\":\"{what}\"}}"),
    )
}

fn bad_request(operation: &'static str, what: &str) -> EdgeError {
    EdgeError::status(
        operation,
        StatusCode::BAD_REQUEST,
        format!("{{\"code\":\"BadRequest\",\"message\":\"{what}\"}}"),
    )
}

fn proxy_info(name: &str, proxy: &StoredProxy) -> ProxyInfo {
    ProxyInfo {
        name: name.to_string(),
        revision: proxy.revisions.iter().map(ToString::to_string).collect(),
    }
}

#[async_trait]
impl ManagementApi for InMemoryEdge {
    fn org(&self) -> &str {
        &self.org
    }

    async fn list_proxies(&self) -> EdgeResult<Vec<String>> {
        self.apply(ApiCall::ListProxies, |state, _| {
            Ok(state.proxies.keys().cloned().collect())
        })
    }

    async fn get_proxy(&self, name: &str) -> EdgeResult<ProxyInfo> {
        self.apply(ApiCall::GetProxy(name.to_string()), |state, operation| {
            state
                .proxies
                .get(name)
                .map(|proxy| proxy_info(name, proxy))
                .ok_or_else(|| not_found(operation, name))
        })
    }

    async fn import_proxy(&self, name: &str, bundle: ProxyBundle) -> EdgeResult<ProxyRevision> {
        self.apply(ApiCall::ImportProxy(name.to_string()), |state, _| {
            let proxy = state.proxies.entry(name.to_string()).or_default();
            let revision = proxy.revisions.last().map_or(1, |latest| latest + 1);
            proxy.revisions.insert(revision);
            proxy.bundle_entries = bundle.entries().to_vec();
            Ok(ProxyRevision {
                name: name.to_string(),
                revision: revision.to_string(),
            })
        })
    }

    async fn delete_proxy(&self, name: &str) -> EdgeResult<()> {
        self.apply(ApiCall::DeleteProxy(name.to_string()), |state, operation| {
            let proxy = state
                .proxies
                .get(name)
                .ok_or_else(|| not_found(operation, name))?;
            if proxy.deployed.values().any(|revisions| !revisions.is_empty()) {
                return Err(conflict(operation, "proxy has deployed revisions"));
            }
            state.proxies.remove(name);
            Ok(())
        })
    }

    async fn get_deployments(&self, name: &str) -> EdgeResult<Deployments> {
        self.apply(ApiCall::GetDeployments(name.to_string()), |state, operation| {
            let proxy = state
                .proxies
                .get(name)
                .ok_or_else(|| not_found(operation, name))?;
            let environment = proxy
                .deployed
                .iter()
                .filter(|(_, revisions)| !revisions.is_empty())
                .map(|(env, revisions)| EnvironmentDeployment {
                    name: env.clone(),
                    revision: revisions
                        .iter()
                        .map(|revision| RevisionDeployment {
                            name: revision.to_string(),
                            state: Some("deployed".to_string()),
                        })
                        .collect(),
                })
                .collect();
            Ok(Deployments {
                name: Some(name.to_string()),
                environment,
            })
        })
    }

    async fn deploy(&self, name: &str, env: &str, revision: u32) -> EdgeResult<()> {
        let call = ApiCall::Deploy {
            name: name.to_string(),
            env: env.to_string(),
            revision,
        };
        self.apply(call, |state, operation| {
            if !state.environments.contains(env) {
                return Err(not_found(operation, env));
            }
            let proxy = state
                .proxies
                .get_mut(name)
                .ok_or_else(|| not_found(operation, name))?;
            if !proxy.revisions.contains(&revision) {
                return Err(not_found(operation, &format!("{name} revision {revision}")));
            }
            // override=true replaces whatever ran in the environment
            proxy
                .deployed
                .insert(env.to_string(), BTreeSet::from([revision]));
            Ok(())
        })
    }

    async fn undeploy(&self, name: &str, env: &str, revision: u32) -> EdgeResult<()> {
        let call = ApiCall::Undeploy {
            name: name.to_string(),
            env: env.to_string(),
            revision,
        };
        self.apply(call, |state, operation| {
            let proxy = state
                .proxies
                .get_mut(name)
                .ok_or_else(|| not_found(operation, name))?;
            let removed = proxy
                .deployed
                .get_mut(env)
                .is_some_and(|revisions| revisions.remove(&revision));
            if removed {
                Ok(())
            } else {
                Err(bad_request(operation, "revision is not deployed"))
            }
        })
    }

    async fn list_products(&self) -> EdgeResult<Vec<String>> {
        self.apply(ApiCall::ListProducts, |state, _| {
            Ok(state.products.keys().cloned().collect())
        })
    }

    async fn get_product(&self, name: &str) -> EdgeResult<ApiProduct> {
        self.apply(ApiCall::GetProduct(name.to_string()), |state, operation| {
            state
                .products
                .get(name)
                .cloned()
                .ok_or_else(|| not_found(operation, name))
        })
    }

    async fn create_product(&self, product: &ApiProduct) -> EdgeResult<ApiProduct> {
        self.apply(
            ApiCall::CreateProduct(product.name.clone()),
            |state, operation| {
                if state.products.contains_key(&product.name) {
                    return Err(conflict(operation, "product already exists"));
                }
                state.products.insert(product.name.clone(), product.clone());
                Ok(product.clone())
            },
        )
    }

    async fn delete_product(&self, name: &str) -> EdgeResult<()> {
        self.apply(ApiCall::DeleteProduct(name.to_string()), |state, operation| {
            if !state.products.contains_key(name) {
                return Err(not_found(operation, name));
            }
            if state
                .apps
                .iter()
                .any(|stored| stored.api_products.iter().any(|product| product == name))
            {
                return Err(conflict(operation, "product is referenced by an app"));
            }
            state.products.remove(name);
            Ok(())
        })
    }

    async fn list_developers(&self) -> EdgeResult<Vec<String>> {
        self.apply(ApiCall::ListDevelopers, |state, _| {
            Ok(state.developers.keys().cloned().collect())
        })
    }

    async fn get_developer(&self, email: &str) -> EdgeResult<Developer> {
        self.apply(ApiCall::GetDeveloper(email.to_string()), |state, operation| {
            state
                .developers
                .get(&email.to_ascii_lowercase())
                .cloned()
                .ok_or_else(|| not_found(operation, email))
        })
    }

    async fn create_developer(&self, developer: &Developer) -> EdgeResult<Developer> {
        self.apply(
            ApiCall::CreateDeveloper(developer.email.clone()),
            |state, operation| {
                let key = developer.email.to_ascii_lowercase();
                if state.developers.contains_key(&key) {
                    return Err(conflict(operation, "developer already exists"));
                }
                let stored = Developer {
                    email: key.clone(),
                    developer_id: Some(Uuid::new_v4().to_string()),
                    ..developer.clone()
                };
                state.developers.insert(key, stored.clone());
                Ok(stored)
            },
        )
    }

    async fn delete_developer(&self, email: &str) -> EdgeResult<()> {
        self.apply(
            ApiCall::DeleteDeveloper(email.to_string()),
            |state, operation| {
                let key = email.to_ascii_lowercase();
                if !state.developers.contains_key(&key) {
                    return Err(not_found(operation, email));
                }
                if state.apps.iter().any(|stored| stored.developer == key) {
                    return Err(conflict(operation, "developer still owns apps"));
                }
                state.developers.remove(&key);
                Ok(())
            },
        )
    }

    async fn list_apps(&self, developer: &str) -> EdgeResult<Vec<String>> {
        self.apply(ApiCall::ListApps(developer.to_string()), |state, operation| {
            let key = developer.to_ascii_lowercase();
            if !state.developers.contains_key(&key) {
                return Err(not_found(operation, developer));
            }
            Ok(state
                .apps
                .iter()
                .filter(|stored| stored.developer == key)
                .map(|stored| stored.app.name.clone())
                .collect())
        })
    }

    async fn get_app(&self, developer: &str, name: &str) -> EdgeResult<DeveloperApp> {
        let call = ApiCall::GetApp {
            developer: developer.to_string(),
            name: name.to_string(),
        };
        self.apply(call, |state, operation| {
            state
                .app_index(&developer.to_ascii_lowercase(), name)
                .map(|index| state.apps[index].app.clone())
                .ok_or_else(|| not_found(operation, name))
        })
    }

    async fn create_app(&self, developer: &str, app: &AppRequest) -> EdgeResult<DeveloperApp> {
        let call = ApiCall::CreateApp {
            developer: developer.to_string(),
            name: app.name.clone(),
        };
        self.apply(call, |state, operation| {
            let key = developer.to_ascii_lowercase();
            if !state.developers.contains_key(&key) {
                return Err(not_found(operation, developer));
            }
            if let Some(missing) = app
                .api_products
                .iter()
                .find(|product| !state.products.contains_key(*product))
            {
                return Err(bad_request(
                    operation,
                    &format!("API product {missing} does not exist"),
                ));
            }
            if state.app_index(&key, &app.name).is_some() {
                return Err(conflict(operation, "app already exists"));
            }
            let created = DeveloperApp {
                name: app.name.clone(),
                app_id: Some(Uuid::new_v4().to_string()),
                status: Some("approved".to_string()),
                attributes: app.attributes.clone(),
                scopes: app.scopes.clone(),
                credentials: vec![Credential {
                    consumer_key: Uuid::new_v4().simple().to_string(),
                    consumer_secret: Uuid::new_v4().simple().to_string(),
                    status: Some("approved".to_string()),
                    expires_at: None,
                }],
            };
            state.apps.push(StoredApp {
                developer: key,
                app: created.clone(),
                api_products: app.api_products.clone(),
            });
            Ok(created)
        })
    }

    async fn delete_app(&self, developer: &str, name: &str) -> EdgeResult<()> {
        let call = ApiCall::DeleteApp {
            developer: developer.to_string(),
            name: name.to_string(),
        };
        self.apply(call, |state, operation| {
            let index = state
                .app_index(&developer.to_ascii_lowercase(), name)
                .ok_or_else(|| not_found(operation, name))?;
            state.apps.remove(index);
            Ok(())
        })
    }
}
