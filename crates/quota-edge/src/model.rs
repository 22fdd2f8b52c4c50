//! Wire payloads for the management API.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{EdgeError, EdgeResult};

/// Name/value attribute as the management API represents custom attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// Build an attribute list from name/value pairs.
#[must_use]
pub fn attributes<I, K, V>(pairs: I) -> Vec<Attribute>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: name.into(),
            value: value.into(),
        })
        .collect()
}

/// Time unit for a product quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaTimeUnit {
    /// Per minute.
    #[default]
    Minute,
    /// Per hour.
    Hour,
    /// Per day.
    Day,
}

impl QuotaTimeUnit {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl Display for QuotaTimeUnit {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Quota policy attached to a product. The API carries the numbers as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// Requests allowed per interval.
    #[serde(rename = "quota", with = "string_number")]
    pub limit: u32,
    /// Interval length in `time_unit`s.
    #[serde(rename = "quotaInterval", with = "string_number")]
    pub interval: u32,
    /// Interval unit.
    #[serde(rename = "quotaTimeUnit")]
    pub time_unit: QuotaTimeUnit,
}

/// API product, used both as the create payload and the read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    /// Product name (the discriminator).
    pub name: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// `auto` or `manual`.
    #[serde(default)]
    pub approval_type: String,
    /// Custom attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// OAuth scopes granted by the product.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Proxies bundled in the product.
    #[serde(default)]
    pub proxies: Vec<String>,
    /// Environments the product is limited to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<String>,
    /// Resource paths exposed by the product.
    #[serde(default)]
    pub api_resources: Vec<String>,
    /// Quota policy, absent when the product has none.
    #[serde(flatten)]
    pub quota: Option<Quota>,
}

/// Developer, used both as the create payload and the read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    /// Email address (the discriminator).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Portal user name.
    pub user_name: String,
    /// Custom attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,
}

/// Payload for creating a developer app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    /// App name (the discriminator).
    pub name: String,
    /// Products the app's first credential is approved for.
    pub api_products: Vec<String>,
    /// Custom attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Requested OAuth scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Credential lifetime in milliseconds; `None` means never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_expires_in: Option<u64>,
}

/// Developer app as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperApp {
    /// App name.
    pub name: String,
    /// Server-assigned identifier.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Approval status.
    #[serde(default)]
    pub status: Option<String>,
    /// Custom attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Credential pairs issued for the app.
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl DeveloperApp {
    /// First credential pair, which the API issues on creation.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::MissingCredentials`] when the app has none.
    pub fn primary_credential(&self) -> EdgeResult<&Credential> {
        self.credentials
            .first()
            .ok_or_else(|| EdgeError::MissingCredentials {
                app: self.name.clone(),
            })
    }
}

/// Consumer key/secret pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Client identifier.
    pub consumer_key: String,
    /// Client secret.
    pub consumer_secret: String,
    /// Approval status of the pair.
    #[serde(default)]
    pub status: Option<String>,
    /// Expiry timestamp in epoch milliseconds; `-1` means never.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Proxy summary with its revision list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyInfo {
    /// Proxy name.
    pub name: String,
    /// Revision numbers, as strings.
    #[serde(default)]
    pub revision: Vec<String>,
}

impl ProxyInfo {
    /// Highest numeric revision, if any.
    #[must_use]
    pub fn latest_revision(&self) -> Option<u32> {
        self.revision
            .iter()
            .filter_map(|value| value.parse::<u32>().ok())
            .max()
    }
}

/// Result of importing a proxy bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRevision {
    /// Proxy name.
    pub name: String,
    /// Newly created revision number, as a string.
    pub revision: String,
}

/// Deployment status of a proxy across environments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployments {
    /// Proxy name.
    #[serde(default)]
    pub name: Option<String>,
    /// Environments with at least one deployed revision.
    #[serde(default)]
    pub environment: Vec<EnvironmentDeployment>,
}

impl Deployments {
    /// Whether any revision is deployed to `env`.
    #[must_use]
    pub fn is_deployed_to(&self, env: &str) -> bool {
        self.environment.iter().any(|deployment| deployment.name == env)
    }

    /// Numeric revisions deployed to `env`.
    #[must_use]
    pub fn revisions_in(&self, env: &str) -> Vec<u32> {
        self.environment
            .iter()
            .filter(|deployment| deployment.name == env)
            .flat_map(|deployment| deployment.revision.iter())
            .filter_map(|revision| revision.name.parse::<u32>().ok())
            .collect()
    }
}

/// Deployment of a proxy into one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDeployment {
    /// Environment name.
    pub name: String,
    /// Revisions deployed in the environment.
    #[serde(default)]
    pub revision: Vec<RevisionDeployment>,
}

/// One deployed revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDeployment {
    /// Revision number, as a string.
    pub name: String,
    /// Deployment state (`deployed`, `error`, ...).
    #[serde(default)]
    pub state: Option<String>,
}

/// OAuth token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessTokenResponse {
    /// Issued access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type, usually `Bearer` or `BearerToken`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds; some servers send it as a string.
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
}

/// Parse a credential lifetime such as `210d` or `12h` into milliseconds.
///
/// Accepted suffixes: `ms`, `s`, `m`, `h`, `d`, `w`. A bare number is taken as milliseconds.
///
/// # Errors
///
/// Returns [`EdgeError::InvalidExpiry`] for empty, non-numeric, or overflowing values.
pub fn parse_key_expiry(value: &str) -> EdgeResult<u64> {
    let invalid = || EdgeError::InvalidExpiry {
        value: value.to_string(),
    };
    let trimmed = value.trim();
    let split = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let factor: u64 = match unit {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return Err(invalid()),
    };
    amount.checked_mul(factor).ok_or_else(invalid)
}

mod string_number {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    pub(super) fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }
}
