//! Demo asset names, resolved run configuration, and the fixed create payloads.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use quota_edge::{ApiProduct, AppRequest, Developer, Quota, QuotaTimeUnit, attributes};
use url::Url;

/// Proxy name; tied to the bundle's base path.
pub const DEFAULT_PROXY: &str = "quotatest";
/// API product name.
pub const DEFAULT_PRODUCT: &str = "QuotaTest-Example-Product";
/// Developer email.
pub const DEFAULT_DEVELOPER: &str = "QuotaTest-Example-Developer@example.com";
/// Developer app name.
pub const DEFAULT_APP: &str = "QuotaTest-Example-App-1";
/// Directory holding the `apiproxy/` bundle tree.
pub const DEFAULT_SOURCE: &str = "proxy-bundle";

const DESCRIPTION: &str = "Test Product for Quota Test Example";
const APPROVAL_TYPE: &str = "auto";
const SCOPES: [&str; 3] = ["A", "B", "C"];
const QUOTA_LIMIT: u32 = 5;
const QUOTA_INTERVAL: u32 = 1;
const DEVELOPER_FIRST_NAME: &str = "QuotaTest-Example";
const DEVELOPER_LAST_NAME: &str = "Developer";

/// Names identifying each demo asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminators {
    /// API proxy name.
    pub proxy: String,
    /// API product name.
    pub product: String,
    /// Developer email.
    pub developer: String,
    /// Developer app name.
    pub app: String,
}

impl Default for Discriminators {
    fn default() -> Self {
        Self {
            proxy: DEFAULT_PROXY.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            developer: DEFAULT_DEVELOPER.to_string(),
            app: DEFAULT_APP.to_string(),
        }
    }
}

impl Discriminators {
    /// Names suffixed with `namespace`, so several demos can share an organization.
    ///
    /// The proxy keeps its name because the bundle's base path is fixed.
    #[must_use]
    pub fn namespaced(namespace: &str) -> Self {
        let (local, domain) = DEFAULT_DEVELOPER
            .split_once('@')
            .unwrap_or((DEFAULT_DEVELOPER, "example.com"));
        Self {
            proxy: DEFAULT_PROXY.to_string(),
            product: format!("{DEFAULT_PRODUCT}-{namespace}"),
            developer: format!("{local}-{namespace}@{domain}"),
            app: format!("{DEFAULT_APP}-{namespace}"),
        }
    }

    fn developer_user_name(&self) -> &str {
        self.developer
            .split_once('@')
            .map_or(self.developer.as_str(), |(local, _)| local)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Organization name.
    pub org: String,
    /// Target environment.
    pub env: String,
    /// Quota time unit attached to the product.
    pub time_unit: QuotaTimeUnit,
    /// Asset names.
    pub names: Discriminators,
    /// Bundle source directory.
    pub source: PathBuf,
    /// Runtime host serving the deployed proxy.
    pub apiserver: Url,
    /// Timestamp stamped into the `note` attribute.
    pub created_at: DateTime<Utc>,
    /// App credential lifetime in milliseconds; `None` issues keys that never expire.
    pub key_expiry: Option<u64>,
}

impl DemoConfig {
    /// Defaults for `org` and `env`; the runtime host is `https://{org}-{env}.apigee.net`.
    ///
    /// # Errors
    ///
    /// Returns an error when `org` and `env` do not form a valid host name.
    pub fn new(org: impl Into<String>, env: impl Into<String>) -> Result<Self, url::ParseError> {
        let org = org.into();
        let env = env.into();
        let apiserver = default_apiserver(&org, &env)?;
        Ok(Self {
            org,
            env,
            time_unit: QuotaTimeUnit::default(),
            names: Discriminators::default(),
            source: PathBuf::from(DEFAULT_SOURCE),
            apiserver,
            created_at: Utc::now(),
            key_expiry: None,
        })
    }

    /// Replace the quota time unit.
    #[must_use]
    pub const fn with_time_unit(mut self, time_unit: QuotaTimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }

    /// Replace the asset names.
    #[must_use]
    pub fn with_names(mut self, names: Discriminators) -> Self {
        self.names = names;
        self
    }

    /// Replace the bundle source directory.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the app credential lifetime in milliseconds.
    #[must_use]
    pub const fn with_key_expiry(mut self, key_expiry: Option<u64>) -> Self {
        self.key_expiry = key_expiry;
        self
    }

    /// Replace the runtime host.
    #[must_use]
    pub fn with_apiserver(mut self, apiserver: Url) -> Self {
        self.apiserver = apiserver;
        self
    }

    /// `{apiserver}{path}` with exactly one slash between them.
    #[must_use]
    pub fn runtime_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.apiserver.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Runtime URL of `suffix` below the demo proxy's base path.
    #[must_use]
    pub fn proxy_url(&self, suffix: &str) -> String {
        self.runtime_url(&format!(
            "{}/{}",
            self.names.proxy,
            suffix.trim_start_matches('/')
        ))
    }

    fn note(&self) -> String {
        format!(
            "created {} for Quota Test Example",
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    fn scopes() -> Vec<String> {
        SCOPES.iter().map(|scope| (*scope).to_string()).collect()
    }

    /// Product payload: public, auto-approved, 5 calls per one time unit.
    #[must_use]
    pub fn product(&self) -> ApiProduct {
        ApiProduct {
            name: self.names.product.clone(),
            display_name: self.names.product.clone(),
            description: DESCRIPTION.to_string(),
            approval_type: APPROVAL_TYPE.to_string(),
            attributes: attributes([("access", "public".to_string()), ("note", self.note())]),
            scopes: Self::scopes(),
            proxies: vec![self.names.proxy.clone()],
            environments: Vec::new(),
            api_resources: Vec::new(),
            quota: Some(Quota {
                limit: QUOTA_LIMIT,
                interval: QUOTA_INTERVAL,
                time_unit: self.time_unit,
            }),
        }
    }

    /// Developer payload.
    #[must_use]
    pub fn developer(&self) -> Developer {
        Developer {
            email: self.names.developer.clone(),
            first_name: DEVELOPER_FIRST_NAME.to_string(),
            last_name: DEVELOPER_LAST_NAME.to_string(),
            user_name: self.names.developer_user_name().to_string(),
            attributes: attributes([("note", self.note())]),
            developer_id: None,
        }
    }

    /// Developer app payload, subscribed to the demo product.
    ///
    /// Apps have no description field; it travels as an attribute. Key approval follows the
    /// product's `auto` approval type.
    #[must_use]
    pub fn app(&self) -> AppRequest {
        AppRequest {
            name: self.names.app.clone(),
            api_products: vec![self.names.product.clone()],
            attributes: attributes([
                ("access", "public".to_string()),
                ("description", DESCRIPTION.to_string()),
                ("note", self.note()),
            ]),
            scopes: Self::scopes(),
            key_expires_in: self.key_expiry,
        }
    }
}

/// Runtime host for an organization and environment.
///
/// # Errors
///
/// Returns an error when the pair does not form a valid host name.
pub fn default_apiserver(org: &str, env: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("https://{org}-{env}.apigee.net"))
}
