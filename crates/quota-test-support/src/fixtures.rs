//! Proxy bundle source trees for tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "apiproxy/quotatest.xml",
        "<APIProxy name=\"quotatest\"><Basepaths>/quotatest</Basepaths></APIProxy>\n",
    ),
    (
        "apiproxy/proxies/endpoint1.xml",
        "<ProxyEndpoint name=\"endpoint1\"><HTTPProxyConnection><BasePath>/quotatest</BasePath></HTTPProxyConnection></ProxyEndpoint>\n",
    ),
    (
        "apiproxy/policies/Quota-1.xml",
        "<Quota name=\"Quota-1\"/>\n",
    ),
];

/// Temporary directory holding a minimal `apiproxy/` tree.
#[derive(Debug)]
pub struct BundleSource {
    dir: TempDir,
}

impl BundleSource {
    /// Directory that contains `apiproxy/`.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Archive names the sample tree packages to, sorted.
    #[must_use]
    pub fn expected_entries() -> Vec<String> {
        let mut entries: Vec<String> = SAMPLE_FILES
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();
        entries.sort();
        entries
    }
}

/// Write a minimal proxy bundle into a fresh temporary directory.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be created.
pub fn sample_bundle_source() -> Result<BundleSource> {
    let dir = tempfile::Builder::new()
        .prefix("quota-demo-bundle-")
        .tempdir()
        .context("failed to create bundle directory")?;
    for (relative, contents) in SAMPLE_FILES {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(BundleSource { dir })
}

/// Empty temporary directory, for exercising a missing bundle.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn empty_source() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("quota-demo-empty-")
        .tempdir()
        .context("failed to create empty directory")
}

/// The proxy bundle shipped at the workspace root.
#[must_use]
pub fn shipped_bundle_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("proxy-bundle")
}
