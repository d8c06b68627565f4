//! Projection Generators
//!
//! One screen projects onto three files: the shared feature module and the two
//! platform route entries. Each projection is written, removed and renamed on
//! its own so the orchestrator can gate every file operation separately.
//!
//! An existing target is never overwritten silently. The overwrite question
//! defaults to yes when the write is a regeneration (update or rename) and to
//! no for a fresh addition.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ProjectLayout;
use crate::error::{Result, SyncError};
use crate::model::ScreenEntry;
use crate::prompt::Prompter;
use crate::slug::default_component_name;
use crate::templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    FeatureModule,
    ExpoRoute,
    NextRoute,
}

impl Projection {
    pub const ALL: [Projection; 3] = [
        Projection::FeatureModule,
        Projection::ExpoRoute,
        Projection::NextRoute,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Projection::FeatureModule => "feature screen",
            Projection::ExpoRoute => "Expo tab file",
            Projection::NextRoute => "Next.js page file",
        }
    }

    /// Projections that live in a directory of their own.
    fn owns_directory(self) -> bool {
        matches!(self, Projection::FeatureModule | Projection::NextRoute)
    }
}

pub struct Projector<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> Projector<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn target_path(&self, projection: Projection, screen: &str) -> PathBuf {
        match projection {
            Projection::FeatureModule => self.layout.feature_module_path(screen),
            Projection::ExpoRoute => self.layout.expo_route_path(screen),
            Projection::NextRoute => self.layout.next_route_path(screen),
        }
    }

    pub fn render(&self, projection: Projection, entry: &ScreenEntry) -> String {
        let component = entry
            .component()
            .map(str::to_string)
            .unwrap_or_else(|| default_component_name(&entry.name));
        match projection {
            Projection::FeatureModule => templates::feature_module(
                self.layout,
                &entry.name,
                &component,
                entry.display_title(),
            ),
            Projection::ExpoRoute => templates::expo_route(self.layout, &entry.name, &component),
            Projection::NextRoute => templates::next_route(self.layout, &entry.name, &component),
        }
    }

    /// Write one projection of `entry`. `None` when the user kept an existing
    /// file.
    pub fn generate(
        &self,
        projection: Projection,
        entry: &ScreenEntry,
        is_update: bool,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<PathBuf>> {
        let path = self.target_path(projection, &entry.name);
        let shown = self.layout.relative(&path).display().to_string();

        if path.exists() {
            let question = format!("File {} already exists. Overwrite?", shown);
            if !prompter.confirm(&question, is_update) {
                tracing::info!("Skipped {} (existing file kept)", shown);
                return Ok(None);
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SyncError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, self.render(projection, entry)).map_err(|source| SyncError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Generated: {}", shown);
        Ok(Some(path))
    }

    /// Remove one projection of `screen`. Already absent is not an error.
    pub fn remove(&self, projection: Projection, screen: &str) -> Result<Option<PathBuf>> {
        let path = self.target_path(projection, screen);
        if !path.exists() {
            tracing::debug!("{} already absent", self.layout.relative(&path).display());
            return Ok(None);
        }

        self.discard(projection, &path)?;
        tracing::info!("Removed: {}", self.layout.relative(&path).display());
        Ok(Some(path))
    }

    /// Delete a projection file along with its per-screen directory once that
    /// directory is empty.
    pub fn discard(&self, projection: Projection, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|source| SyncError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
        if projection.owns_directory() {
            if let Some(dir) = path.parent() {
                remove_dir_if_empty(dir);
            }
        }
        Ok(())
    }

    /// Move one projection from `old` to `new` and regenerate it. Returns every
    /// path touched, old locations included, for staging.
    pub fn rename(
        &self,
        projection: Projection,
        old: &ScreenEntry,
        new: &ScreenEntry,
        prompter: &mut dyn Prompter,
    ) -> Result<Vec<PathBuf>> {
        let old_path = self.target_path(projection, &old.name);
        let new_path = self.target_path(projection, &new.name);
        let mut touched = Vec::new();

        if old_path.exists() && !new_path.exists() {
            if let Some(parent) = new_path.parent() {
                fs::create_dir_all(parent).map_err(|source| SyncError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::rename(&old_path, &new_path).map_err(|source| SyncError::Write {
                path: new_path.clone(),
                source,
            })?;
            tracing::info!(
                "Moved: {} -> {}",
                self.layout.relative(&old_path).display(),
                self.layout.relative(&new_path).display()
            );
            touched.push(old_path.clone());
            if projection.owns_directory() {
                if let Some(dir) = old_path.parent() {
                    remove_dir_if_empty(dir);
                }
            }
        }

        if let Some(path) = self.generate(projection, new, true, prompter)? {
            if !touched.contains(&path) {
                touched.push(path);
            }
        } else if new_path.exists() {
            touched.push(new_path);
        }

        if let Some(path) = self.remove(projection, &old.name)? {
            touched.push(path);
        }
        touched.dedup();
        Ok(touched)
    }
}

/// Best effort: a directory that still holds anything is left alone.
fn remove_dir_if_empty(dir: &Path) {
    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        match fs::remove_dir(dir) {
            Ok(()) => tracing::debug!("removed empty directory {}", dir.display()),
            Err(e) => tracing::warn!("could not remove {}: {}", dir.display(), e),
        }
    }
}
