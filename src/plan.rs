//! Sub-batch planning.
//!
//! A confirmed [`ChangeSet`] is processed as up to four sub-batches in a fixed
//! order: deletions, renames, updates, additions. Each sub-batch is a flat list
//! of steps, one per file operation, so the orchestrator can confirm and run
//! them one at a time and stop at the first refusal.

use crate::config::ProjectLayout;
use crate::model::{ChangeSet, ImportSpec, ScreenChange, ScreenEntry};
use crate::projection::Projection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Deletions,
    Renames,
    Updates,
    Additions,
}

impl BatchKind {
    pub fn label(self) -> &'static str {
        match self {
            BatchKind::Deletions => "deletions",
            BatchKind::Renames => "renames",
            BatchKind::Updates => "updates",
            BatchKind::Additions => "additions",
        }
    }

    fn commit_prefix(self) -> &'static str {
        match self {
            BatchKind::Deletions => "Delete screens",
            BatchKind::Renames => "Rename screens",
            BatchKind::Updates => "Update screens",
            BatchKind::Additions => "Add screens",
        }
    }

    /// Only additions undo their own files when a step is refused.
    pub fn rolls_back(self) -> bool {
        matches!(self, BatchKind::Additions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Generate {
        projection: Projection,
        entry: ScreenEntry,
        is_update: bool,
    },
    Remove {
        projection: Projection,
        screen: String,
    },
    Rename {
        projection: Projection,
        change: ScreenChange,
    },
    AddImport(ImportSpec),
    RemoveImport(ImportSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub description: String,
    pub action: StepAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBatch {
    pub kind: BatchKind,
    /// Screens the batch is about, for messages.
    pub screens: Vec<String>,
    pub steps: Vec<Step>,
}

impl SubBatch {
    pub fn suggested_message(&self) -> String {
        format!("{}: {}", self.kind.commit_prefix(), self.screens.join(", "))
    }
}

/// Sub-batches for `changes`, empty categories left out.
pub fn plan(changes: &ChangeSet, layout: &ProjectLayout) -> Vec<SubBatch> {
    let mut batches = Vec::new();

    if !changes.deleted.is_empty() {
        let mut steps = Vec::new();
        for entry in &changes.deleted {
            for projection in Projection::ALL {
                steps.push(Step {
                    description: format!("Delete {} for {}", projection.label(), entry.name),
                    action: StepAction::Remove {
                        projection,
                        screen: entry.name.clone(),
                    },
                });
            }
            if let Some(spec) = import_for(entry, layout) {
                steps.push(remove_import_step(spec));
            }
        }
        batches.push(SubBatch {
            kind: BatchKind::Deletions,
            screens: changes.deleted.iter().map(|s| s.name.clone()).collect(),
            steps,
        });
    }

    if !changes.renamed.is_empty() {
        let mut steps = Vec::new();
        for change in &changes.renamed {
            for projection in Projection::ALL {
                steps.push(Step {
                    description: format!(
                        "Rename {} {} -> {}",
                        projection.label(),
                        change.old.name,
                        change.new.name
                    ),
                    action: StepAction::Rename {
                        projection,
                        change: change.clone(),
                    },
                });
            }
            steps.extend(swap_import_steps(change, layout));
        }
        batches.push(SubBatch {
            kind: BatchKind::Renames,
            screens: changes
                .renamed
                .iter()
                .map(|c| format!("{} -> {}", c.old.name, c.new.name))
                .collect(),
            steps,
        });
    }

    if !changes.updated.is_empty() {
        let mut steps = Vec::new();
        for change in &changes.updated {
            for projection in Projection::ALL {
                steps.push(Step {
                    description: format!("Regenerate {} for {}", projection.label(), change.new.name),
                    action: StepAction::Generate {
                        projection,
                        entry: change.new.clone(),
                        is_update: true,
                    },
                });
            }
            steps.extend(swap_import_steps(change, layout));
        }
        batches.push(SubBatch {
            kind: BatchKind::Updates,
            screens: changes.updated.iter().map(|c| c.new.name.clone()).collect(),
            steps,
        });
    }

    if !changes.added.is_empty() {
        let mut steps = Vec::new();
        for entry in &changes.added {
            for projection in Projection::ALL {
                steps.push(Step {
                    description: format!("Generate {} for {}", projection.label(), entry.name),
                    action: StepAction::Generate {
                        projection,
                        entry: entry.clone(),
                        is_update: false,
                    },
                });
            }
            if let Some(spec) = import_for(entry, layout) {
                steps.push(Step {
                    description: format!(
                        "Add import for {} to navigation config",
                        spec.component
                    ),
                    action: StepAction::AddImport(spec),
                });
            }
        }
        batches.push(SubBatch {
            kind: BatchKind::Additions,
            screens: changes.added.iter().map(|s| s.name.clone()).collect(),
            steps,
        });
    }

    batches
}

fn import_for(entry: &ScreenEntry, layout: &ProjectLayout) -> Option<ImportSpec> {
    entry
        .component()
        .map(|c| ImportSpec::new(c, layout.manifest_import_source(&entry.name)))
}

fn remove_import_step(spec: ImportSpec) -> Step {
    Step {
        description: format!(
            "Remove import for {} from navigation config",
            spec.component
        ),
        action: StepAction::RemoveImport(spec),
    }
}

/// Replace the old import with the new one when either side moved.
fn swap_import_steps(change: &ScreenChange, layout: &ProjectLayout) -> Vec<Step> {
    let (Some(old), Some(new)) = (import_for(&change.old, layout), import_for(&change.new, layout))
    else {
        return Vec::new();
    };
    if old == new {
        return Vec::new();
    }
    vec![
        remove_import_step(old),
        Step {
            description: format!("Add import for {} to navigation config", new.component),
            action: StepAction::AddImport(new),
        },
    ]
}
