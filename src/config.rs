//! Project layout.
//!
//! All paths hang off a single project root. An optional `navsync.json` at that
//! root overrides individual locations; every field has a default matching the
//! standard monorepo layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

pub const CONFIG_FILE: &str = "navsync.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub manifest: PathBuf,
    pub features_dir: PathBuf,
    pub feature_module: String,
    pub expo_app_dir: PathBuf,
    pub next_app_dir: PathBuf,
    pub tabs_group: String,
    pub route_extension: String,
    pub next_page: String,
    /// Name of the top-level declaration holding the navigator list.
    pub navigation_export: String,
    /// Discriminator matched against the tabs navigator's `name`.
    pub tabs_navigator_name: String,
    pub debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("packages/app/features/navigation/layout.tsx"),
            features_dir: PathBuf::from("packages/app/features"),
            feature_module: "screen.tsx".to_string(),
            expo_app_dir: PathBuf::from("apps/expo/app"),
            next_app_dir: PathBuf::from("apps/next/app"),
            tabs_group: "(tabs)".to_string(),
            route_extension: "tsx".to_string(),
            next_page: "page.tsx".to_string(),
            navigation_export: "appNavigationStructure".to_string(),
            tabs_navigator_name: "(tabs)".to_string(),
            debounce_ms: 1500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub config: SyncConfig,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, config: SyncConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Reads `<root>/navsync.json` when present, defaults otherwise.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::new(root, SyncConfig::default()));
        }

        let data = fs::read_to_string(&config_path).map_err(|source| SyncError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&data).map_err(|source| SyncError::Config {
            path: config_path.clone(),
            source,
        })?;
        tracing::debug!("loaded layout overrides from {}", config_path.display());
        Ok(Self::new(root, config))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.manifest)
    }

    pub fn feature_dir(&self, screen: &str) -> PathBuf {
        self.root.join(&self.config.features_dir).join(screen)
    }

    pub fn feature_module_path(&self, screen: &str) -> PathBuf {
        self.feature_dir(screen).join(&self.config.feature_module)
    }

    pub fn expo_tabs_dir(&self) -> PathBuf {
        self.root
            .join(&self.config.expo_app_dir)
            .join(&self.config.tabs_group)
    }

    pub fn expo_route_path(&self, screen: &str) -> PathBuf {
        self.expo_tabs_dir()
            .join(format!("{}.{}", screen, self.config.route_extension))
    }

    pub fn next_route_dir(&self, screen: &str) -> PathBuf {
        self.root
            .join(&self.config.next_app_dir)
            .join(&self.config.tabs_group)
            .join(screen)
    }

    pub fn next_route_path(&self, screen: &str) -> PathBuf {
        self.next_route_dir(screen).join(&self.config.next_page)
    }

    /// Feature module file name without its extension (`screen`).
    pub fn feature_module_stem(&self) -> &str {
        let module = self.config.feature_module.as_str();
        module.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(module)
    }

    /// Import path of a feature module as seen from the manifest.
    pub fn manifest_import_source(&self, screen: &str) -> String {
        format!("../{}/{}", screen, self.feature_module_stem())
    }

    /// Package-style import path used by the route entry files.
    pub fn package_import_source(&self, screen: &str) -> String {
        format!("app/features/{}/{}", screen, self.feature_module_stem())
    }

    /// Path relative to the project root, for log lines and git.
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
