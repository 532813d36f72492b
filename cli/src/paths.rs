//! Path utilities for voxid.

use std::io;
use std::path::{Path, PathBuf};

/// Default base directory name.
pub const DEFAULT_BASE_DIR: &str = ".voxid";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Provides access to the voxid directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    /// User's home directory.
    pub home_dir: PathBuf,
}

impl Paths {
    pub fn new() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self { home_dir })
    }

    /// Returns the base directory (~/.voxid).
    pub fn base_dir(&self) -> PathBuf {
        self.home_dir.join(DEFAULT_BASE_DIR)
    }

    /// Returns the config file path (~/.voxid/config.yaml).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir().join(DEFAULT_CONFIG_FILE)
    }

    /// Returns the artifact store directory (~/.voxid/models).
    pub fn models_dir(&self) -> PathBuf {
        self.base_dir().join("models")
    }

    /// Returns the dataset directory (~/.voxid/datasets).
    pub fn datasets_dir(&self) -> PathBuf {
        self.base_dir().join("datasets")
    }

    /// Expands a leading `~/` to the home directory.
    pub fn expand(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("~") {
            Ok(rest) => self.home_dir.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> Paths {
        Paths {
            home_dir: PathBuf::from("/home/test"),
        }
    }

    #[test]
    fn test_paths_structure() {
        let paths = paths();
        assert!(paths.base_dir().ends_with(".voxid"));
        assert!(paths.config_file().ends_with(".voxid/config.yaml"));
        assert!(paths.models_dir().ends_with("models"));
        assert!(paths.datasets_dir().ends_with("datasets"));
    }

    #[test]
    fn test_expand() {
        let paths = paths();
        assert_eq!(
            paths.expand(Path::new("~/.voxid/models")),
            PathBuf::from("/home/test/.voxid/models")
        );
        assert_eq!(paths.expand(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
        assert_eq!(paths.expand(Path::new("rel/~")), PathBuf::from("rel/~"));
    }
}
