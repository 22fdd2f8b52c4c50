//! Conditional deletion of the demo assets in reverse dependency order.

use quota_edge::{
    AppEntity, DeveloperEntity, EdgeResult, ProductEntity, ProxyEntity, Removal, ensure_absent,
    ensure_undeployed,
};
use tracing::info;

use crate::client::AppContext;

/// Outcome of each reset step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    /// Developer app.
    pub app: Removal,
    /// Developer.
    pub developer: Removal,
    /// API product.
    pub product: Removal,
    /// Proxy deployment in the target environment.
    pub undeploy: Removal,
    /// API proxy.
    pub proxy: Removal,
}

impl ResetReport {
    /// Whether the run found nothing to remove.
    #[must_use]
    pub fn was_empty(&self) -> bool {
        [
            self.app,
            self.developer,
            self.product,
            self.undeploy,
            self.proxy,
        ]
        .iter()
        .all(|removal| *removal == Removal::Absent)
    }
}

/// Delete the app, developer, and product, undeploy the proxy, then delete it.
///
/// Absent assets are skipped. The first failure other than 404 aborts the remaining steps.
///
/// # Errors
///
/// Propagates the failing step's error.
pub async fn reset(ctx: &AppContext) -> EdgeResult<ResetReport> {
    let api = ctx.api.as_ref();
    let config = &ctx.config;
    let names = &config.names;

    let app = ensure_absent(api, &AppEntity::new(&names.developer, config.app())).await?;
    let developer = ensure_absent(api, &DeveloperEntity::new(config.developer())).await?;
    let product = ensure_absent(api, &ProductEntity::new(config.product())).await?;
    let undeploy = ensure_undeployed(api, &names.proxy, &config.env).await?;
    let proxy = ensure_absent(api, &ProxyEntity::new(&names.proxy, &config.source)).await?;

    let report = ResetReport {
        app,
        developer,
        product,
        undeploy,
        proxy,
    };
    info!(?report, "ok. demo assets have been deleted");
    Ok(report)
}
