//! Locations used by the rolekit CLI
//!
//! - Definitions root (the sandbox root holding `role/` and `tool/`)
//! - Schema directory (`role_schema.json`, `tool_schema.json`)
//! - Configuration directory
//!
//! The configuration directory follows platform conventions (XDG on Linux).
//! The definitions root defaults to the current directory and the schema
//! directory to `<root>/schemas`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_QUALIFIER: &str = "rs";
const APP_ORGANIZATION: &str = "rolekit";
const APP_NAME: &str = "rolekit";

pub const CONFIG_FILE: &str = "config.yaml";

/// Resolved locations for a rolekit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolekitPaths {
    /// Sandbox root with `role/` and `tool/` below it
    pub root: PathBuf,

    /// Directory holding the JSON schemas
    pub schemas_dir: PathBuf,

    /// Configuration directory
    pub config_dir: PathBuf,
}

impl RolekitPaths {
    /// System defaults: the current directory as root and the platform
    /// config directory
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .context("Failed to determine system directories")?;
        let root = std::env::current_dir().context("Failed to read current directory")?;

        Ok(Self {
            schemas_dir: root.join("schemas"),
            root,
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    /// Every location placed under a single directory
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();

        Self {
            schemas_dir: root.join("schemas"),
            config_dir: root.join("config"),
            root,
        }
    }

    pub fn default_config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn display(&self) -> String {
        format!(
            "rolekit paths:
  Definitions root:  {}
  Schemas:           {}
  Config directory:  {}",
            self.root.display(),
            self.schemas_dir.display(),
            self.config_dir.display()
        )
    }
}

/// Path overrides from the config file, the environment or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PathsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Fill unset fields from a lower-precedence source
    pub fn or(self, fallback: PathsConfig) -> PathsConfig {
        PathsConfig {
            root: self.root.or(fallback.root),
            schemas_dir: self.schemas_dir.or(fallback.schemas_dir),
            config_dir: self.config_dir.or(fallback.config_dir),
        }
    }

    /// Apply overrides to default paths
    ///
    /// Without an explicit schema directory, schemas follow the root.
    pub fn apply_to(&self, mut paths: RolekitPaths) -> RolekitPaths {
        if let Some(ref root) = self.root {
            paths.root = root.clone();
            paths.schemas_dir = root.join("schemas");
        }
        if let Some(ref schemas_dir) = self.schemas_dir {
            paths.schemas_dir = schemas_dir.clone();
        }
        if let Some(ref config_dir) = self.config_dir {
            paths.config_dir = config_dir.clone();
        }
        paths
    }
}

/// Overrides from the environment:
/// - ROLEKIT_ROOT
/// - ROLEKIT_SCHEMAS_DIR
/// - ROLEKIT_CONFIG_DIR
pub fn paths_from_env() -> PathsConfig {
    PathsConfig {
        root: std::env::var("ROLEKIT_ROOT").ok().map(PathBuf::from),
        schemas_dir: std::env::var("ROLEKIT_SCHEMAS_DIR").ok().map(PathBuf::from),
        config_dir: std::env::var("ROLEKIT_CONFIG_DIR").ok().map(PathBuf::from),
    }
}
