//! Change Classifier
//!
//! Diffs the current screen list against the baseline. Passes run in a fixed
//! order and each one consumes names so later passes never see them again:
//!
//! 1. renames (old name gone, new name appeared, same identity)
//! 2. updates (same name, different component or title)
//! 3. additions
//! 4. deletions
//!
//! Incomplete entries (a name without a component) are never acted on. A
//! baseline draft that gains its component is an addition, not an update,
//! since nothing was ever generated or imported for it.
//!
//! Identity across a rename is decided by an [`IdentityMatcher`]; the default
//! treats an identical component name as proof. Two screens renamed while also
//! swapping component names come out as deletions plus additions. That case is
//! indistinguishable under this rule and is left alone.

use std::collections::HashSet;

use crate::model::{ChangeSet, ScreenChange, ScreenEntry};

pub trait IdentityMatcher {
    fn same_screen(&self, previous: &ScreenEntry, current: &ScreenEntry) -> bool;
}

/// Exact component-name equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentIdentity;

impl IdentityMatcher for ComponentIdentity {
    fn same_screen(&self, previous: &ScreenEntry, current: &ScreenEntry) -> bool {
        match (previous.component(), current.component()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

pub fn classify(current: &[ScreenEntry], previous: &[ScreenEntry]) -> ChangeSet {
    classify_with(current, previous, &ComponentIdentity)
}

pub fn classify_with(
    current: &[ScreenEntry],
    previous: &[ScreenEntry],
    matcher: &dyn IdentityMatcher,
) -> ChangeSet {
    let current = first_per_name(current);
    let previous = first_per_name(previous);

    let current_names: HashSet<&str> = current.iter().map(|s| s.name.as_str()).collect();
    let previous_names: HashSet<&str> = previous.iter().map(|s| s.name.as_str()).collect();
    let actionable_previous: HashSet<&str> = previous
        .iter()
        .filter(|s| s.is_actionable())
        .map(|s| s.name.as_str())
        .collect();

    let mut consumed_previous: HashSet<&str> = HashSet::new();
    let mut consumed_current: HashSet<&str> = HashSet::new();
    let mut changes = ChangeSet::default();

    // 1. renames, first match wins
    for old in previous.iter().filter(|s| s.is_actionable()) {
        if current_names.contains(old.name.as_str()) {
            continue;
        }
        let candidate = current.iter().find(|new| {
            new.is_actionable()
                && !previous_names.contains(new.name.as_str())
                && !consumed_current.contains(new.name.as_str())
                && matcher.same_screen(old, new)
        });
        if let Some(new) = candidate {
            consumed_previous.insert(old.name.as_str());
            consumed_current.insert(new.name.as_str());
            changes.renamed.push(ScreenChange {
                old: (*old).clone(),
                new: (*new).clone(),
            });
        }
    }

    // 2. updates
    for new in current.iter().filter(|s| s.is_actionable()) {
        if consumed_current.contains(new.name.as_str()) {
            continue;
        }
        let Some(old) = previous
            .iter()
            .find(|s| s.name == new.name && s.is_actionable())
        else {
            continue;
        };
        if old.component() != new.component() || old.title != new.title {
            changes.updated.push(ScreenChange {
                old: (*old).clone(),
                new: (*new).clone(),
            });
        }
    }

    // 3. additions
    for new in current.iter().filter(|s| s.is_actionable()) {
        if !actionable_previous.contains(new.name.as_str())
            && !consumed_current.contains(new.name.as_str())
        {
            changes.added.push((*new).clone());
        }
    }

    // 4. deletions
    for old in previous.iter().filter(|s| s.is_actionable()) {
        if !current_names.contains(old.name.as_str())
            && !consumed_previous.contains(old.name.as_str())
        {
            changes.deleted.push((*old).clone());
        }
    }

    changes
}

/// Names are unique within a snapshot; later repeats are dropped.
fn first_per_name(screens: &[ScreenEntry]) -> Vec<&ScreenEntry> {
    let mut seen = HashSet::new();
    screens
        .iter()
        .filter(|s| !s.name.is_empty() && seen.insert(s.name.as_str()))
        .collect()
}
