//! Conditional import, deploy, and undeploy of API proxies.

use tracing::{info, warn};

use crate::api::ManagementApi;
use crate::entity::{EntityKind, ManagedEntity, Provisioned, ProxyEntity, Removal, log_unexpected};
use crate::error::{EdgeError, EdgeResult};
use crate::model::ProxyInfo;

/// Outcome of a conditional deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    /// The environment already ran these revisions; nothing was deployed.
    AlreadyDeployed {
        /// Revisions deployed to the environment.
        revisions: Vec<u32>,
    },
    /// A revision was deployed by this call.
    Deployed {
        /// Revision deployed.
        revision: u32,
    },
}

/// Import the proxy bundle unless the proxy already exists.
///
/// Existence is decided by reading the proxy directly; a 404 triggers the import.
///
/// # Errors
///
/// Propagates non-404 read failures and any packaging or import failure.
pub async fn ensure_imported(
    api: &dyn ManagementApi,
    proxy: &ProxyEntity,
) -> EdgeResult<Provisioned<ProxyInfo>> {
    let outcome = match import_if_missing(api, proxy).await {
        Ok(outcome) => outcome,
        Err(err) => {
            log_unexpected(EntityKind::Proxy, proxy.discriminator(), &err);
            return Err(err);
        }
    };
    let info = outcome.get();
    info!(
        entity = %EntityKind::Proxy,
        name = proxy.discriminator(),
        outcome = if outcome.was_created() { "imported" } else { "exists" },
        revisions = ?info.revision,
        "conditional import"
    );
    Ok(outcome)
}

async fn import_if_missing(
    api: &dyn ManagementApi,
    proxy: &ProxyEntity,
) -> EdgeResult<Provisioned<ProxyInfo>> {
    match api.get_proxy(proxy.discriminator()).await {
        Ok(info) => Ok(Provisioned::Existing(info)),
        Err(err) if err.is_not_found() => Ok(Provisioned::Created(proxy.create(api).await?)),
        Err(err) => Err(err),
    }
}

/// Deploy the proxy's latest revision to `env` unless the environment already runs it.
///
/// # Errors
///
/// Returns [`EdgeError::NoRevision`] when the proxy has no numeric revision. Deployment read
/// and deploy failures are logged and propagated.
pub async fn ensure_deployed(
    api: &dyn ManagementApi,
    env: &str,
    proxy: &ProxyInfo,
) -> EdgeResult<Deployment> {
    let result = deploy_latest(api, env, proxy).await;
    if let Err(err) = &result {
        log_unexpected(EntityKind::Proxy, &proxy.name, err);
    }
    result
}

async fn deploy_latest(
    api: &dyn ManagementApi,
    env: &str,
    proxy: &ProxyInfo,
) -> EdgeResult<Deployment> {
    let deployments = api.get_deployments(&proxy.name).await?;
    info!(
        name = proxy.name.as_str(),
        environments = ?deployments
            .environment
            .iter()
            .map(|deployment| deployment.name.as_str())
            .collect::<Vec<_>>(),
        "deployments"
    );

    if deployments.is_deployed_to(env) {
        let revisions = deployments.revisions_in(env);
        info!(name = proxy.name.as_str(), env, ?revisions, "already deployed");
        return Ok(Deployment::AlreadyDeployed { revisions });
    }

    let revision = proxy
        .latest_revision()
        .ok_or_else(|| EdgeError::NoRevision {
            proxy: proxy.name.clone(),
        })?;
    api.deploy(&proxy.name, env, revision).await?;
    info!(name = proxy.name.as_str(), env, revision, "deployed");
    Ok(Deployment::Deployed { revision })
}

/// Undeploy every revision of `name` running in `env`.
///
/// A proxy that does not exist, or that is not deployed to `env`, yields [`Removal::Absent`].
///
/// # Errors
///
/// Logs and propagates any failure other than 404.
pub async fn ensure_undeployed(
    api: &dyn ManagementApi,
    name: &str,
    env: &str,
) -> EdgeResult<Removal> {
    let result = undeploy_all(api, name, env).await;
    match result {
        Ok(removal) => {
            info!(name, env, outcome = ?removal, "conditional undeploy");
            Ok(removal)
        }
        Err(err) if err.is_not_found() => {
            warn!(name, env, "proxy not found while undeploying");
            Ok(Removal::Absent)
        }
        Err(err) => {
            log_unexpected(EntityKind::Proxy, name, &err);
            Err(err)
        }
    }
}

async fn undeploy_all(api: &dyn ManagementApi, name: &str, env: &str) -> EdgeResult<Removal> {
    let revisions = api.get_deployments(name).await?.revisions_in(env);
    if revisions.is_empty() {
        return Ok(Removal::Absent);
    }
    for revision in revisions {
        api.undeploy(name, env, revision).await?;
    }
    Ok(Removal::Deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{EdgeClient, parse_base_url};
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use reqwest::Client;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn client_for(server: &MockServer) -> Result<EdgeClient> {
        Ok(EdgeClient::from_parts(
            Client::new(),
            parse_base_url(&server.base_url())?,
            "acme".to_string(),
            HeaderValue::from_static("Bearer token-1"),
        ))
    }

    fn proxy(revisions: &[&str]) -> ProxyInfo {
        ProxyInfo {
            name: "quotatest".into(),
            revision: revisions.iter().map(|rev| (*rev).to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn deploys_latest_revision_when_env_missing() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(200).json_body(json!({
                "name": "quotatest",
                "environment": [{"name": "prod", "revision": [{"name": "1", "state": "deployed"}]}]
            }));
        });
        let deploy = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/o/acme/environments/test/apis/quotatest/revisions/3/deployments");
            then.status(200).json_body(json!({"state": "deployed"}));
        });

        let client = client_for(&server)?;
        let outcome = ensure_deployed(&client, "test", &proxy(&["1", "3", "2"])).await?;
        assert_eq!(outcome, Deployment::Deployed { revision: 3 });
        deploy.assert();
        Ok(())
    }

    #[tokio::test]
    async fn skips_deploy_when_env_already_runs_proxy() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(200).json_body(json!({
                "name": "quotatest",
                "environment": [{"name": "test", "revision": [{"name": "2", "state": "deployed"}]}]
            }));
        });

        let client = client_for(&server)?;
        let outcome = ensure_deployed(&client, "test", &proxy(&["1", "2"])).await?;
        assert_eq!(outcome, Deployment::AlreadyDeployed { revisions: vec![2] });
        Ok(())
    }

    #[tokio::test]
    async fn proxy_without_revisions_cannot_deploy() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(200).json_body(json!({"name": "quotatest", "environment": []}));
        });

        let client = client_for(&server)?;
        let err = ensure_deployed(&client, "test", &proxy(&[]))
            .await
            .expect_err("no revision expected");
        assert!(matches!(err, EdgeError::NoRevision { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn server_error_on_read_does_not_import() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest");
            then.status(500).body("backend unavailable");
        });

        let client = client_for(&server)?;
        let entity = ProxyEntity::new("quotatest", "/nonexistent/bundle");
        let err = ensure_imported(&client, &entity)
            .await
            .expect_err("server error propagates");
        assert_eq!(err.http_status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.operation(), Some("proxies.get"));
        Ok(())
    }

    #[tokio::test]
    async fn deploy_failure_keeps_server_body() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(200).json_body(json!({"name": "quotatest", "environment": []}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1/o/acme/environments/test/apis/quotatest/revisions/1/deployments");
            then.status(400).body("revision 1 has validation errors");
        });

        let client = client_for(&server)?;
        let err = ensure_deployed(&client, "test", &proxy(&["1"]))
            .await
            .expect_err("deploy rejected");
        assert_eq!(err.operation(), Some("proxies.deploy"));
        assert!(err.to_string().contains("revision 1 has validation errors"));
        Ok(())
    }

    #[tokio::test]
    async fn undeploy_of_missing_proxy_is_absent() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(404).body("{\"code\":\"messaging.config.beans.ApplicationDoesNotExist\"}");
        });

        let client = client_for(&server)?;
        let removal = ensure_undeployed(&client, "quotatest", "test").await?;
        assert_eq!(removal, Removal::Absent);
        Ok(())
    }

    #[tokio::test]
    async fn undeploys_every_revision_in_env() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(200).json_body(json!({
                "name": "quotatest",
                "environment": [{
                    "name": "test",
                    "revision": [{"name": "1", "state": "deployed"}, {"name": "2", "state": "deployed"}]
                }]
            }));
        });
        let first = server.mock(|when, then| {
            when.method(DELETE)
                .path("/v1/o/acme/environments/test/apis/quotatest/revisions/1/deployments");
            then.status(200);
        });
        let second = server.mock(|when, then| {
            when.method(DELETE)
                .path("/v1/o/acme/environments/test/apis/quotatest/revisions/2/deployments");
            then.status(200);
        });

        let client = client_for(&server)?;
        assert_eq!(
            ensure_undeployed(&client, "quotatest", "test").await?,
            Removal::Deleted
        );
        first.assert();
        second.assert();
        Ok(())
    }

    #[tokio::test]
    async fn undeploy_surfaces_server_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/o/acme/apis/quotatest/deployments");
            then.status(503).body("unavailable");
        });

        let client = client_for(&server)?;
        let err = ensure_undeployed(&client, "quotatest", "test")
            .await
            .expect_err("server error expected");
        assert_eq!(err.http_status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        Ok(())
    }
}
