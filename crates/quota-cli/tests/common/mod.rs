//! Shared harness: in-memory management API, sample bundle, and a mocked token endpoint.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use httpmock::MockServer;
use httpmock::prelude::*;
use quota_cli::client::AppContext;
use quota_cli::commands::{ProvisionError, ProvisionReport, provision};
use quota_cli::demo::{DemoConfig, Discriminators};
use quota_edge::ManagementApi;
use quota_test_support::fixtures::{BundleSource, sample_bundle_source};
use quota_test_support::mocks::InMemoryEdge;
use reqwest::Client;
use serde_json::json;
use url::Url;

pub const ACCESS_TOKEN: &str = "tok-quota-demo";

pub struct Harness {
    pub edge: Arc<InMemoryEdge>,
    pub server: MockServer,
    pub source: BundleSource,
}

impl Harness {
    pub async fn start() -> Result<Self> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST)
                .path("/quotatest/oauth2-cc/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .header_exists("authorization")
                .body("grant_type=client_credentials");
            then.status(200).json_body(json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "BearerToken",
                "expires_in": "1799"
            }));
        });
        Ok(Self {
            edge: Arc::new(InMemoryEdge::new("acme")),
            server,
            source: sample_bundle_source()?,
        })
    }

    pub fn config(&self) -> Result<DemoConfig> {
        Ok(DemoConfig::new("acme", "test")?
            .with_source(self.source.path())
            .with_apiserver(Url::parse(&self.server.base_url())?))
    }

    pub fn context(&self) -> Result<AppContext> {
        self.context_with(self.config()?)
    }

    pub fn namespaced_context(&self, namespace: &str) -> Result<AppContext> {
        self.context_with(
            self.config()?
                .with_names(Discriminators::namespaced(namespace)),
        )
    }

    pub fn context_with(&self, config: DemoConfig) -> Result<AppContext> {
        let api: Arc<dyn ManagementApi> = self.edge.clone();
        Ok(AppContext {
            api,
            http: Client::new(),
            config,
        })
    }

    pub async fn provision(&self) -> Result<(ProvisionReport, String)> {
        let ctx = self.context()?;
        let mut out = Vec::new();
        let report = provision(&ctx, &mut out).await?;
        Ok((report, String::from_utf8(out)?))
    }

    pub async fn provision_err(&self) -> Result<(ProvisionError, String)> {
        let ctx = self.context()?;
        let mut out = Vec::new();
        match provision(&ctx, &mut out).await {
            Ok(_) => anyhow::bail!("provisioning was expected to fail"),
            Err(err) => Ok((err, String::from_utf8(out)?)),
        }
    }
}
