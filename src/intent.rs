//! Intent Channel
//!
//! Turns free-form add/delete instructions into concrete manifest edits. The
//! instructions arrive either from the manifest's own `pendingCommands` queue
//! or from the command line; both go through the same resolution so a slug and
//! a component name are derived identically.

use std::collections::HashSet;

use crate::error::{Result, SyncError};
use crate::model::{CommandSpec, ManifestSnapshot, PendingCommands, ScreenEntry};
use crate::mutate::ManifestEdits;
use crate::slug::{default_component_name, humanize, is_valid_identifier, slugify};

/// Resolve an add instruction against the current snapshot.
pub fn resolve_add(command: &CommandSpec, snapshot: &ManifestSnapshot) -> Result<ScreenEntry> {
    let slug = slugify(&command.name);
    if slug.is_empty() {
        return Err(SyncError::InvalidScreenName(command.name.clone()));
    }
    if snapshot.screen(&slug).is_some() {
        return Err(SyncError::DuplicateScreen(slug));
    }

    let component = match command.component_name.as_deref().map(str::trim) {
        Some(c) if is_valid_identifier(c) => c.to_string(),
        Some(c) if !c.is_empty() => {
            let fallback = default_component_name(&slug);
            tracing::warn!(
                "'{}' is not a valid component name, using {} instead",
                c,
                fallback
            );
            fallback
        }
        _ => default_component_name(&slug),
    };

    let title = command
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| humanize(&slug));
    let icon = command
        .icon
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slug.clone());

    Ok(ScreenEntry::new(slug, component)
        .with_title(title)
        .with_icon(icon))
}

/// Resolve a delete instruction to a declared screen name. The exact name wins
/// over its slug.
pub fn resolve_delete(command: &CommandSpec, snapshot: &ManifestSnapshot) -> Result<String> {
    let name = command.name.trim();
    if snapshot.screen(name).is_some() {
        return Ok(name.to_string());
    }
    let slug = slugify(name);
    if !slug.is_empty() && snapshot.screen(&slug).is_some() {
        return Ok(slug);
    }
    Err(SyncError::UnknownScreen(name.to_string()))
}

/// Fold a command queue into one edit request. Instructions that cannot be
/// resolved are skipped with a warning; the queue is cleared either way.
pub fn fold_commands(pending: &PendingCommands, snapshot: &ManifestSnapshot) -> ManifestEdits {
    let mut edits = ManifestEdits {
        clear_pending_commands: true,
        ..Default::default()
    };

    let mut queued = HashSet::new();
    for command in &pending.delete {
        match resolve_delete(command, snapshot) {
            Ok(name) => {
                if queued.insert(name.clone()) {
                    edits.screen_names_to_delete.push(name);
                }
            }
            Err(e) => tracing::warn!("pending delete skipped: {}", e),
        }
    }

    let mut added = HashSet::new();
    for command in &pending.add {
        match resolve_add(command, snapshot) {
            Ok(entry) => {
                if added.insert(entry.name.clone()) {
                    edits.screens_to_add.push(entry);
                } else {
                    tracing::warn!("pending add skipped: '{}' queued twice", entry.name);
                }
            }
            Err(e) => tracing::warn!("pending add skipped: {}", e),
        }
    }

    edits
}
