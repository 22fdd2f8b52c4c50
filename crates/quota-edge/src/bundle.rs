//! Packaging of an `apiproxy/` source tree into the zip archive the import endpoint expects.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{EdgeError, EdgeResult};

const BUNDLE_ROOT: &str = "apiproxy";

/// Zipped proxy bundle ready for import.
#[derive(Debug, Clone)]
pub struct ProxyBundle {
    root: PathBuf,
    archive: Vec<u8>,
    entries: Vec<String>,
}

impl ProxyBundle {
    /// Zip the `apiproxy/` tree found at, or directly below, `source`.
    ///
    /// Entries are stored with an `apiproxy/` prefix. Editor backup and lock files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when no `apiproxy` directory exists, when it holds no files, or when
    /// reading or archiving fails.
    pub fn from_dir(source: &Path) -> EdgeResult<Self> {
        let root = locate_root(source)?;
        let base = root
            .parent()
            .ok_or_else(|| EdgeError::bundle(&root, "apiproxy directory has no parent"))?;

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::new();

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_editor_artifact(entry.file_name()));
        for entry in walker {
            let entry = entry.map_err(|source| EdgeError::Walkdir {
                path: root.clone(),
                source,
            })?;
            let name = archive_name(entry.path(), base)?;
            if entry.file_type().is_dir() {
                writer
                    .add_directory(format!("{name}/"), options)
                    .map_err(|source| EdgeError::Zip {
                        operation: "bundle.add_directory",
                        source,
                    })?;
                continue;
            }

            writer
                .start_file(name.clone(), options)
                .map_err(|source| EdgeError::Zip {
                    operation: "bundle.start_file",
                    source,
                })?;
            let mut file = File::open(entry.path())
                .map_err(|source| EdgeError::io("bundle.open", entry.path(), source))?;
            io::copy(&mut file, &mut writer)
                .map_err(|source| EdgeError::io("bundle.copy", entry.path(), source))?;
            entries.push(name);
        }

        let cursor = writer.finish().map_err(|source| EdgeError::Zip {
            operation: "bundle.finish",
            source,
        })?;

        if entries.is_empty() {
            return Err(EdgeError::bundle(root, "apiproxy directory contains no files"));
        }

        debug!(root = %root.display(), files = entries.len(), "proxy bundle packaged");
        Ok(Self {
            root,
            archive: cursor.into_inner(),
            entries,
        })
    }

    /// Directory the bundle was read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Zip archive bytes.
    #[must_use]
    pub fn archive(&self) -> &[u8] {
        &self.archive
    }

    /// Consume the bundle, returning the archive bytes.
    #[must_use]
    pub fn into_archive(self) -> Vec<u8> {
        self.archive
    }

    /// Archived file names, in archive order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

fn locate_root(source: &Path) -> EdgeResult<PathBuf> {
    if source.file_name() == Some(OsStr::new(BUNDLE_ROOT)) && source.is_dir() {
        return Ok(source.to_path_buf());
    }
    let nested = source.join(BUNDLE_ROOT);
    if nested.is_dir() {
        return Ok(nested);
    }
    Err(EdgeError::bundle(source, "no apiproxy directory found"))
}

fn archive_name(path: &Path, base: &Path) -> EdgeResult<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|_| EdgeError::bundle(path, "entry outside bundle root"))?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => return Err(EdgeError::bundle(path, "entry path is not normal")),
        }
    }
    Ok(parts.join("/"))
}

fn is_editor_artifact(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.ends_with('~')
        || name.starts_with(".#")
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
        || name == ".DS_Store"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(root: &Path, relative: &str, contents: &str) -> Result<(), Box<dyn Error>> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn sample_tree() -> Result<TempDir, Box<dyn Error>> {
        let temp = tempfile::Builder::new().prefix("quota-bundle-").tempdir()?;
        write(temp.path(), "apiproxy/quotatest.xml", "<APIProxy name='quotatest'/>")?;
        write(temp.path(), "apiproxy/policies/Quota-1.xml", "<Quota/>")?;
        write(temp.path(), "apiproxy/policies/Quota-1.xml~", "stale")?;
        write(temp.path(), "apiproxy/proxies/#endpoint1.xml#", "lock")?;
        write(temp.path(), "apiproxy/proxies/endpoint1.xml", "<ProxyEndpoint/>")?;
        write(temp.path(), "README.md", "not bundled")?;
        Ok(temp)
    }

    #[test]
    fn bundles_apiproxy_tree_with_prefix() -> Result<(), Box<dyn Error>> {
        let temp = sample_tree()?;
        let bundle = ProxyBundle::from_dir(temp.path())?;
        assert_eq!(
            bundle.entries(),
            [
                "apiproxy/policies/Quota-1.xml",
                "apiproxy/proxies/endpoint1.xml",
                "apiproxy/quotatest.xml",
            ]
        );
        assert_eq!(bundle.root(), temp.path().join("apiproxy"));

        let mut archive = ZipArchive::new(Cursor::new(bundle.archive().to_vec()))?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"apiproxy/quotatest.xml".to_string()));
        assert!(!names.iter().any(|name| name.ends_with('~')));
        assert!(!names.iter().any(|name| name.contains("README")));

        let mut contents = String::new();
        io::Read::read_to_string(&mut archive.by_name("apiproxy/policies/Quota-1.xml")?, &mut contents)?;
        assert_eq!(contents, "<Quota/>");
        Ok(())
    }

    #[test]
    fn accepts_apiproxy_directory_itself() -> Result<(), Box<dyn Error>> {
        let temp = sample_tree()?;
        let bundle = ProxyBundle::from_dir(&temp.path().join("apiproxy"))?;
        assert_eq!(bundle.entries().len(), 3);
        Ok(())
    }

    #[test]
    fn missing_apiproxy_is_rejected() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::Builder::new().prefix("quota-bundle-").tempdir()?;
        let err = ProxyBundle::from_dir(temp.path()).expect_err("no bundle expected");
        assert!(matches!(
            err,
            EdgeError::Bundle {
                reason: "no apiproxy directory found",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn empty_apiproxy_is_rejected() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::Builder::new().prefix("quota-bundle-").tempdir()?;
        fs::create_dir_all(temp.path().join("apiproxy/policies"))?;
        let err = ProxyBundle::from_dir(temp.path()).expect_err("empty bundle expected");
        assert!(matches!(
            err,
            EdgeError::Bundle {
                reason: "apiproxy directory contains no files",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn editor_artifacts_are_detected() {
        assert!(is_editor_artifact(OsStr::new("a.xml~")));
        assert!(is_editor_artifact(OsStr::new(".#a.xml")));
        assert!(is_editor_artifact(OsStr::new("#a.xml#")));
        assert!(!is_editor_artifact(OsStr::new("#")));
        assert!(!is_editor_artifact(OsStr::new("a.xml")));
    }
}
