//! Root span helpers.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the command-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the command-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>, org: &str, env: &str) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "quota_demo",
            mode = %mode,
            org = %org,
            env = %env,
            build_sha = %build_sha()
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_enters_span_without_subscriber() {
        let _guard = GlobalContextGuard::new("provision", "acme", "test");
        tracing::info!("inside the root span");
    }
}
