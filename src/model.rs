//! Manifest Model
//!
//! Plain data produced by the parser and consumed by the classifier, the
//! mutator and the orchestrator. Snapshots are never mutated once built; a new
//! read of the manifest produces a new snapshot.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// SCREENS
// ═══════════════════════════════════════════════════════════════════════════════

/// One entry of the tabs navigator's `screens` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenEntry {
    /// Canonical slug used for directory and file naming.
    pub name: String,
    /// Symbol the generated feature module exports.
    pub component_name: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl ScreenEntry {
    pub fn new(name: impl Into<String>, component_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_name: Some(component_name.into()),
            title: None,
            icon: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Both identity fields are present and non-empty.
    pub fn is_actionable(&self) -> bool {
        !self.name.is_empty() && self.component().is_some()
    }

    pub fn component(&self) -> Option<&str> {
        self.component_name.as_deref().filter(|c| !c.is_empty())
    }

    /// Title shown in generated code, falling back to the slug.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// A `name -> name` or `attributes -> attributes` transition of one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenChange {
    pub old: ScreenEntry,
    pub new: ScreenEntry,
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// An import declaration as it appears in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDecl {
    pub source: String,
    /// Local names of `{ Named }` specifiers.
    pub named: Vec<String>,
    /// Default and namespace bindings. These are never removed by the engine.
    pub other_bindings: Vec<String>,
}

impl ImportDecl {
    pub fn imports(&self, component: &str) -> bool {
        self.named.iter().any(|n| n == component)
    }
}

/// `import { component } from 'source'`, the only form the engine writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportSpec {
    pub component: String,
    pub source: String,
}

impl ImportSpec {
    pub fn new(component: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            source: source.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT & CONTROL CHANNEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable view of the manifest at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub screens: Vec<ScreenEntry>,
    pub imports: Vec<ImportDecl>,
}

impl ManifestSnapshot {
    pub fn screen(&self, name: &str) -> Option<&ScreenEntry> {
        self.screens.iter().find(|s| s.name == name)
    }

    pub fn screen_names(&self) -> Vec<&str> {
        self.screens.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub autosave: bool,
    pub editing: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self {
            autosave: true,
            editing: false,
        }
    }
}

/// Free-form add/delete instruction, either embedded in the manifest or given
/// on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub name: String,
    pub component_name: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl CommandSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The typed intent queue read out of `pendingCommands`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommands {
    pub add: Vec<CommandSpec>,
    pub delete: Vec<CommandSpec>,
}

impl PendingCommands {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty()
    }
}

/// Everything one read of the manifest yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    pub snapshot: ManifestSnapshot,
    pub flags: ControlFlags,
    pub pending: PendingCommands,
}

impl ParsedManifest {
    /// The manifest author asked the engine to hold off.
    pub fn editing_gate_closed(&self) -> bool {
        self.flags.editing && self.flags.autosave && self.pending.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANGE SET
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<ScreenEntry>,
    pub deleted: Vec<ScreenEntry>,
    pub updated: Vec<ScreenChange>,
    pub renamed: Vec<ScreenChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.updated.is_empty()
            && self.renamed.is_empty()
    }

    /// Human-readable multi-line summary for the batch confirmation prompt.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        for s in &self.deleted {
            lines.push(format!("  - delete  {}", s.name));
        }
        for c in &self.renamed {
            lines.push(format!("  ~ rename  {} -> {}", c.old.name, c.new.name));
        }
        for c in &self.updated {
            lines.push(format!("  * update  {}", c.new.name));
        }
        for s in &self.added {
            lines.push(format!("  + add     {}", s.name));
        }
        lines.join("\n")
    }
}
