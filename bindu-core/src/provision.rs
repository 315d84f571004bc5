//! Folder provisioning under the server's data directory.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::ProvisionError;

/// Creates folders relative to a fixed base directory.
///
/// Only plain relative paths are accepted: absolute paths, drive prefixes and
/// `..` components are rejected so a request can never escape `base_dir`.
#[derive(Debug, Clone)]
pub struct FolderProvisioner {
    base_dir: PathBuf,
}

impl FolderProvisioner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve `relative` against the base directory without touching disk.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ProvisionError> {
        let trimmed = relative.trim();
        if trimmed.is_empty() {
            return Err(ProvisionError::InvalidPath("path is empty".into()));
        }

        let path = Path::new(trimmed);
        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(ProvisionError::InvalidPath(format!(
                        "'{trimmed}' must not contain '..'"
                    )))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ProvisionError::InvalidPath(format!(
                        "'{trimmed}' must be relative"
                    )))
                }
            }
        }

        Ok(self.base_dir.join(path))
    }

    /// Ensure the folder exists, creating intermediate directories.
    ///
    /// Calling this for a folder that already exists succeeds.
    pub async fn provision(&self, relative: &str) -> Result<PathBuf, ProvisionError> {
        let full = self.resolve(relative)?;
        tokio::fs::create_dir_all(&full).await?;
        debug!(path = %full.display(), "Folder provisioned");
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let provisioner = FolderProvisioner::new("/srv/bindu");

        assert!(matches!(
            provisioner.resolve("../etc"),
            Err(ProvisionError::InvalidPath(_))
        ));
        assert!(matches!(
            provisioner.resolve("temp/../../etc"),
            Err(ProvisionError::InvalidPath(_))
        ));
        assert!(matches!(
            provisioner.resolve("/tmp/scans"),
            Err(ProvisionError::InvalidPath(_))
        ));
        assert!(matches!(
            provisioner.resolve("   "),
            Err(ProvisionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_joins_relative_paths() {
        let provisioner = FolderProvisioner::new("/srv/bindu");
        assert_eq!(
            provisioner.resolve("temp/scans").unwrap(),
            PathBuf::from("/srv/bindu/temp/scans")
        );
        assert_eq!(
            provisioner.resolve("./temp").unwrap(),
            PathBuf::from("/srv/bindu/./temp")
        );
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let provisioner = FolderProvisioner::new(temp.path());

        let first = provisioner.provision("temp/fingerprints").await.unwrap();
        let second = provisioner.provision("temp/fingerprints").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn test_provision_fails_when_file_in_the_way() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("blocker"), b"x").unwrap();
        let provisioner = FolderProvisioner::new(temp.path());

        let result = provisioner.provision("blocker/inner").await;
        assert!(matches!(result, Err(ProvisionError::Io(_))));
    }
}
