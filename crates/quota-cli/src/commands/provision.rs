//! Conditional creation of every demo asset, followed by the token exchange.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io::Write;

use quota_edge::{
    AppEntity, Credential, Deployment, DeveloperEntity, ProductEntity, ProxyEntity,
    ensure_deployed, ensure_imported, ensure_present,
};
use tracing::{debug, info};

use crate::client::AppContext;
use crate::commands::token::fetch_token;
use crate::output::{render_credentials, render_next_steps, render_token_request};

/// Position reached by a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisionState {
    /// Nothing done yet.
    Start,
    /// The proxy exists.
    Imported,
    /// The proxy runs in the target environment.
    Deployed,
    /// The product exists.
    ProductReady,
    /// The developer exists.
    DeveloperReady,
    /// The app exists and its credentials are known.
    AppReady,
    /// An access token was issued.
    TokenAcquired,
    /// Example commands were printed.
    Done,
}

impl ProvisionState {
    /// Upper-case state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Imported => "IMPORTED",
            Self::Deployed => "DEPLOYED",
            Self::ProductReady => "PRODUCT_READY",
            Self::DeveloperReady => "DEVELOPER_READY",
            Self::AppReady => "APP_READY",
            Self::TokenAcquired => "TOKEN_ACQUIRED",
            Self::Done => "DONE",
        }
    }
}

impl Display for ProvisionState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A provisioning step failed; `state` is the last state reached.
#[derive(Debug)]
pub struct ProvisionError {
    /// Last state reached before the failure.
    pub state: ProvisionState,
    /// Underlying failure.
    pub source: anyhow::Error,
}

impl Display for ProvisionError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "provisioning halted at {}", self.state)
    }
}

impl Error for ProvisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let source: &(dyn Error + 'static) = self.source.as_ref();
        Some(source)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// Assets this run created.
    pub created: Created,
    /// Deploy outcome.
    pub deployment: Deployment,
    /// App credential pair.
    pub credential: Credential,
    /// Issued access token.
    pub access_token: String,
}

/// Which assets this run created, as opposed to finding them in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Created {
    /// Proxy was imported.
    pub proxy: bool,
    /// Product was created.
    pub product: bool,
    /// Developer was created.
    pub developer: bool,
    /// App was created.
    pub app: bool,
}

/// Create whatever is missing, fetch a token, and print the example commands to `out`.
///
/// # Errors
///
/// Returns [`ProvisionError`] carrying the last state reached when any step fails.
pub async fn provision(
    ctx: &AppContext,
    out: &mut dyn Write,
) -> Result<ProvisionReport, ProvisionError> {
    let mut state = ProvisionState::Start;
    let result = run_steps(ctx, out, &mut state).await;
    result.map_err(|source| ProvisionError { state, source })
}

fn advance(state: &mut ProvisionState, next: ProvisionState) {
    debug!(from = %state, to = %next, "provision state");
    *state = next;
}

async fn run_steps(
    ctx: &AppContext,
    out: &mut dyn Write,
    state: &mut ProvisionState,
) -> anyhow::Result<ProvisionReport> {
    let api = ctx.api.as_ref();
    let config = &ctx.config;
    let names = &config.names;
    let mut created = Created::default();

    let proxy = ProxyEntity::new(&names.proxy, &config.source);
    let imported = ensure_imported(api, &proxy).await?;
    created.proxy = imported.was_created();
    let info = imported.into_inner();
    advance(state, ProvisionState::Imported);

    let deployment = ensure_deployed(api, &config.env, &info).await?;
    advance(state, ProvisionState::Deployed);

    let product = ProductEntity::new(config.product());
    created.product = ensure_present(api, &product).await?.was_created();
    advance(state, ProvisionState::ProductReady);

    let developer = DeveloperEntity::new(config.developer());
    created.developer = ensure_present(api, &developer).await?.was_created();
    advance(state, ProvisionState::DeveloperReady);

    let app = AppEntity::new(&names.developer, config.app());
    let app = ensure_present(api, &app).await?;
    created.app = app.was_created();
    let app = app.into_inner();
    info!(app = app.name.as_str(), "app name");
    let credential = app.primary_credential()?.clone();
    advance(state, ProvisionState::AppReady);

    render_credentials(out, config, &credential)?;
    render_token_request(out, config)?;
    let access_token = fetch_token(&ctx.http, config, &credential).await?;
    advance(state, ProvisionState::TokenAcquired);

    render_next_steps(out, config, &access_token, &credential.consumer_key)?;
    advance(state, ProvisionState::Done);

    info!(?created, "provisioned");
    Ok(ProvisionReport {
        created,
        deployment,
        credential,
        access_token,
    })
}
