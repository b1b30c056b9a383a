//! Network manager configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use podnet_core::{Error, Result};

/// Default directory holding the plugin binaries
pub const DEFAULT_BIN_DIR: &str = "/opt/cni/bin";
/// Default directory holding the network configuration files
pub const DEFAULT_CONF_DIR: &str = "/etc/cni/net.d";
/// Default number of configuration files loaded
pub const DEFAULT_MAX_CONF_NUM: usize = 1;
/// Loopback plus one pod network
pub const DEFAULT_MIN_NETWORK_COUNT: usize = 2;

/// Network manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CniConfig {
    /// Directory holding the plugin binaries
    pub bin_dir: PathBuf,

    /// Directory holding the network configuration files
    pub conf_dir: PathBuf,

    /// Maximum number of configuration files to load; 0 loads all of them
    pub max_conf_num: usize,

    /// Minimum number of networks a sandbox attaches to, loopback included
    pub min_network_count: usize,
}

impl Default for CniConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            conf_dir: PathBuf::from(DEFAULT_CONF_DIR),
            max_conf_num: DEFAULT_MAX_CONF_NUM,
            min_network_count: DEFAULT_MIN_NETWORK_COUNT,
        }
    }
}

impl CniConfig {
    /// Create a configuration with the default locations
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields keep their defaults.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| Error::InvalidConfig {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        let config: Self = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), config = ?config, "Loaded network manager configuration");
        Ok(config)
    }

    /// Set the plugin binary directory
    #[must_use]
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = dir.into();
        self
    }

    /// Set the network configuration directory
    #[must_use]
    pub fn with_conf_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.conf_dir = dir.into();
        self
    }

    /// Set the maximum number of configuration files
    #[must_use]
    pub const fn with_max_conf_num(mut self, max: usize) -> Self {
        self.max_conf_num = max;
        self
    }

    /// Set the minimum number of attached networks
    #[must_use]
    pub const fn with_min_network_count(mut self, count: usize) -> Self {
        self.min_network_count = count;
        self
    }

    /// Check that the counts can be satisfied
    ///
    /// Loopback always counts as one network, so `max_conf_num` files give at
    /// most `max_conf_num + 1` networks.
    pub fn validate(&self) -> Result<()> {
        if self.min_network_count == 0 {
            return Err(Error::Initialization {
                message: "minimum network count must be at least 1".to_string(),
            });
        }

        if self.max_conf_num != 0 && self.max_conf_num < self.min_network_count - 1 {
            return Err(Error::Initialization {
                message: format!(
                    "loading at most {} config file(s) cannot attach the required {} networks",
                    self.max_conf_num, self.min_network_count
                ),
            });
        }

        Ok(())
    }

    /// Check that both directories exist
    pub async fn check_dirs(&self) -> Result<()> {
        check_dir("plugin binary", &self.bin_dir).await?;
        check_dir("plugin configuration", &self.conf_dir).await
    }
}

async fn check_dir(kind: &str, path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::Initialization {
            message: format!("{kind} path {} is not a directory", path.display()),
        }),
        Err(e) => Err(Error::Initialization {
            message: format!("{kind} directory {}: {e}", path.display()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CniConfig::default();
        assert_eq!(config.bin_dir, PathBuf::from("/opt/cni/bin"));
        assert_eq!(config.conf_dir, PathBuf::from("/etc/cni/net.d"));
        assert_eq!(config.max_conf_num, 1);
        assert_eq!(config.min_network_count, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CniConfig::new()
            .with_bin_dir("/usr/libexec/cni")
            .with_conf_dir("/run/cni")
            .with_max_conf_num(0)
            .with_min_network_count(3);

        assert_eq!(config.bin_dir, PathBuf::from("/usr/libexec/cni"));
        assert_eq!(config.conf_dir, PathBuf::from("/run/cni"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_counts() {
        let config = CniConfig::new().with_min_network_count(0);
        assert!(matches!(config.validate(), Err(Error::Initialization { .. })));

        let config = CniConfig::new()
            .with_max_conf_num(1)
            .with_min_network_count(3);
        assert!(matches!(config.validate(), Err(Error::Initialization { .. })));
    }

    #[test]
    fn test_validate_largest_conf_num() {
        let config = CniConfig::new()
            .with_max_conf_num(usize::MAX)
            .with_min_network_count(usize::MAX);
        assert!(config.validate().is_ok());

        let config = CniConfig::new().with_max_conf_num(usize::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_field_names() {
        let config: CniConfig =
            serde_json::from_str(r#"{"binDir": "/bin", "maxConfNum": 0}"#).unwrap();

        assert_eq!(config.bin_dir, PathBuf::from("/bin"));
        assert_eq!(config.conf_dir, PathBuf::from(DEFAULT_CONF_DIR));
        assert_eq!(config.max_conf_num, 0);
        assert_eq!(config.min_network_count, DEFAULT_MIN_NETWORK_COUNT);
    }

    #[tokio::test]
    async fn test_check_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = CniConfig::new()
            .with_bin_dir(dir.path())
            .with_conf_dir(dir.path());
        assert!(config.check_dirs().await.is_ok());

        let missing = config.clone().with_conf_dir(dir.path().join("missing"));
        let err = missing.check_dirs().await.unwrap_err();
        assert!(err.to_string().contains("plugin configuration directory"));
    }

    #[tokio::test]
    async fn test_file_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = CniConfig::new().with_bin_dir(file.path());

        let err = config.check_dirs().await.unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cni.json");
        std::fs::write(&path, r#"{"confDir": "/tmp/net.d", "minNetworkCount": 1}"#).unwrap();

        let config = CniConfig::from_file(&path).await.unwrap();
        assert_eq!(config.conf_dir, PathBuf::from("/tmp/net.d"));
        assert_eq!(config.min_network_count, 1);
        assert_eq!(config.bin_dir, PathBuf::from(DEFAULT_BIN_DIR));

        assert!(CniConfig::from_file(dir.path().join("absent.json")).await.is_err());
    }
}
