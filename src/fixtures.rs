//! Shared manifest fixtures and collaborator doubles for the test modules.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{ProjectLayout, SyncConfig};
use crate::error::Result;
use crate::vcs::{PendingChange, VersionControl};

pub const MANIFEST: &str = r#"// packages/app/features/navigation/layout.tsx

import { ComponentType } from 'react'
import { HomeScreen } from '../home/screen'
import { AccountScreen } from '../account/screen'
export const isAutoSaveEnabled = true
export const isEditing = false

export interface ScreenConfig {
  name: string
  component: ComponentType<any>
}

// --- Main Navigation Structure ---
export const appNavigationStructure: NavigatorLayout[] = [
  {
    type: 'stack',
    name: 'Root',
    initialRouteName: '(tabs)',
    screens: [
      {
        type: 'tabs',
        name: '(tabs)',
        initialRouteName: 'home',
        screens: [
          {
            name: 'home',
            component: HomeScreen,
            options: {
              title: 'Home',
              tabBarIconName: 'home',
            },
          },
          {
            name: 'account',
            component: AccountScreen,
            options: {
              title: 'Account',
              tabBarIconName: 'person',
            },
          },
        ],
      },
    ],
  },
]
"#;

const TABS_CLOSE: &str = "        ],\n      },";

/// Append a hand-written screen block to the tabs navigator.
pub fn with_screen(manifest: &str, name: &str, component: &str, title: &str) -> String {
    let block = format!(
        "          {{\n            name: '{name}',\n            component: {component},\n            options: {{\n              title: '{title}',\n            }},\n          }},\n"
    );
    manifest.replacen(TABS_CLOSE, &format!("{}{}", block, TABS_CLOSE), 1)
}

/// Append a half-typed screen block: a name and nothing else.
pub fn with_draft(manifest: &str, name: &str) -> String {
    let block = format!("          {{\n            name: '{name}',\n          }},\n");
    manifest.replacen(TABS_CLOSE, &format!("{}{}", block, TABS_CLOSE), 1)
}

pub fn with_editing(manifest: &str, editing: bool) -> String {
    manifest.replacen(
        "export const isEditing = false",
        &format!("export const isEditing = {}", editing),
        1,
    )
}

pub fn with_autosave(manifest: &str, autosave: bool) -> String {
    manifest.replacen(
        "export const isAutoSaveEnabled = true",
        &format!("export const isAutoSaveEnabled = {}", autosave),
        1,
    )
}

/// Declare `pendingCommands` right after the flags.
pub fn with_pending(manifest: &str, body: &str) -> String {
    manifest.replacen(
        "export const isEditing = false\n",
        &format!(
            "export const isEditing = false\nexport const pendingCommands = {}\n",
            body
        ),
        1,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMP PROJECT
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Project {
    _dir: TempDir,
    pub layout: ProjectLayout,
}

impl Project {
    pub fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path(), SyncConfig::default());
        let project = Self { _dir: dir, layout };
        fs::create_dir_all(project.layout.manifest_path().parent().unwrap()).unwrap();
        project.write_manifest(manifest);
        project
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }

    pub fn manifest(&self) -> String {
        fs::read_to_string(self.layout.manifest_path()).unwrap()
    }

    pub fn write_manifest(&self, source: &str) {
        fs::write(self.layout.manifest_path(), source).unwrap();
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).unwrap()
    }

    /// Write all three projections of `screen` with placeholder bodies.
    pub fn seed_screen(&self, screen: &str) {
        for path in [
            self.layout.feature_module_path(screen),
            self.layout.expo_route_path(screen),
            self.layout.next_route_path(screen),
        ] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("// {}\n", screen)).unwrap();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VCS DOUBLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct RecordingVcs {
    pub pending: Vec<PendingChange>,
    pub commits: Vec<(String, Vec<PathBuf>)>,
}

impl VersionControl for RecordingVcs {
    fn pending_changes(&self) -> Result<Vec<PendingChange>> {
        Ok(self.pending.clone())
    }

    fn commit(&mut self, message: &str, paths: &[PathBuf]) -> Result<()> {
        self.commits.push((message.to_string(), paths.to_vec()));
        Ok(())
    }
}
