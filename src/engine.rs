//! Orchestrator
//!
//! Drives one processing cycle per manifest change:
//!
//! ```text
//! notification -> state decision -> parse -> editing gate -> pending commands
//!              -> classify vs baseline -> batch confirm -> preflight
//!              -> deletions / renames / updates / additions -> commit -> baseline
//! ```
//!
//! The baseline (last acknowledged snapshot) only moves at the end of a cycle
//! that ran to completion, or when nothing needed doing. A declined batch or a
//! cancelled sub-batch leaves it alone so the same changes come back on the
//! next evaluation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::classify;
use crate::config::ProjectLayout;
use crate::error::{Result, SyncError};
use crate::intent::{fold_commands, resolve_add, resolve_delete};
use crate::model::{CommandSpec, ManifestSnapshot, ParsedManifest};
use crate::mutate::{mutate_manifest, ManifestEdits};
use crate::parse::{parse_manifest, ParseOptions};
use crate::plan::{plan, BatchKind, StepAction, SubBatch};
use crate::projection::{Projection, Projector};
use crate::prompt::Prompter;
use crate::state::{EngineState, NotificationDecision};
use crate::vcs::VersionControl;
use crate::watch::ChangeFeed;

/// How one evaluation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The manifest did not parse; wait for the next save.
    Unparsable,
    /// The manifest is marked as being edited.
    EditingGate,
    /// A cycle was already running; it re-evaluates when done.
    Deferred,
    /// The notification came from the engine's own write.
    IgnoredSelfWrite,
    NoChanges,
    /// No baseline existed; the current snapshot became it.
    BaselineEstablished,
    /// The user declined the batch.
    Declined,
    /// The uncommitted-changes preflight stopped the cycle.
    Aborted,
    /// A file operation was refused inside this sub-batch.
    Cancelled(BatchKind),
    /// Every sub-batch completed. Lists the files touched.
    Applied(Vec<PathBuf>),
    /// An I/O, edit or manifest error stopped the cycle.
    Failed(String),
}

/// One-shot instruction from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectCommand {
    Add(CommandSpec),
    Delete(CommandSpec),
}

enum BatchResult {
    Completed(Vec<PathBuf>),
    Cancelled,
}

pub struct SyncEngine<P, V, F> {
    layout: ProjectLayout,
    options: ParseOptions,
    prompter: P,
    vcs: V,
    feed: F,
    baseline: Option<ManifestSnapshot>,
    state: EngineState,
}

impl<P: Prompter, V: VersionControl, F: ChangeFeed> SyncEngine<P, V, F> {
    pub fn new(layout: ProjectLayout, prompter: P, vcs: V, feed: F) -> Self {
        let options = ParseOptions::from_config(&layout.config);
        Self {
            layout,
            options,
            prompter,
            vcs,
            feed,
            baseline: None,
            state: EngineState::new(),
        }
    }
}

impl<P, V, F> SyncEngine<P, V, F> {
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn baseline(&self) -> Option<&ManifestSnapshot> {
        self.baseline.as_ref()
    }

    pub fn set_baseline(&mut self, snapshot: ManifestSnapshot) {
        self.baseline = Some(snapshot);
    }
}

impl<P: Prompter, V: VersionControl, F: ChangeFeed> SyncEngine<P, V, F> {
    // ═══════════════════════════════════════════════════════════════════════════
    // ENTRY POINTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Take the first baseline from disk. `false` when the manifest does not
    /// parse yet; the first good read then becomes the baseline.
    pub fn initialize(&mut self) -> bool {
        match self.parse_current() {
            Some(parsed) => {
                tracing::info!(
                    "Initial navigation config parsed ({} screens).",
                    parsed.snapshot.screens.len()
                );
                self.baseline = Some(parsed.snapshot);
                true
            }
            None => {
                tracing::error!("Failed to parse initial config. Please check the file.");
                false
            }
        }
    }

    /// Watch loop. Returns when the change feed closes.
    pub fn run(&mut self) {
        while self.feed.wait() {
            let outcome = self.on_notification();
            tracing::debug!("notification handled: {:?}", outcome);
        }
        tracing::info!("change feed closed, stopping");
    }

    /// Handle one change notification.
    pub fn on_notification(&mut self) -> CycleOutcome {
        match self.state.on_notification() {
            NotificationDecision::ConsumedSelfWrite => CycleOutcome::IgnoredSelfWrite,
            NotificationDecision::Deferred => CycleOutcome::Deferred,
            NotificationDecision::Evaluate => self.evaluate(),
        }
    }

    /// Run cycles until no re-evaluation is due. Returns the last outcome.
    pub fn evaluate(&mut self) -> CycleOutcome {
        loop {
            self.state.begin_cycle();
            tracing::info!("Change detected in {}. Parsing...", self.manifest_display());
            let outcome = self.run_cycle().unwrap_or_else(|e| self.report(e));
            tracing::debug!("cycle outcome: {:?}", outcome);
            if !self.state.finish_cycle() {
                return outcome;
            }
            tracing::info!("Re-evaluating the manifest.");
        }
    }

    /// One-shot add/delete. The manifest is edited, re-read and processed like
    /// a watched change, without the editing gate.
    pub fn apply_direct(&mut self, command: &DirectCommand) -> Result<CycleOutcome> {
        let parsed = parse_manifest(&self.read_manifest()?, &self.options)?;
        let edits = match command {
            DirectCommand::Add(spec) => ManifestEdits {
                screens_to_add: vec![resolve_add(spec, &parsed.snapshot)?],
                ..Default::default()
            },
            DirectCommand::Delete(spec) => ManifestEdits {
                screen_names_to_delete: vec![resolve_delete(spec, &parsed.snapshot)?],
                ..Default::default()
            },
        };
        // only the command's own effect is processed
        self.baseline = Some(parsed.snapshot);

        self.state.begin_cycle();
        let result = self.direct_cycle(&edits);
        self.state.finish_cycle();
        result
    }

    fn direct_cycle(&mut self, edits: &ManifestEdits) -> Result<CycleOutcome> {
        if self.apply_manifest_edits(edits)?.is_empty() {
            tracing::warn!("manifest left unchanged");
        }
        let parsed = parse_manifest(&self.read_manifest()?, &self.options)?;
        self.process(parsed.snapshot)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let Some(mut parsed) = self.parse_current() else {
            return Ok(CycleOutcome::Unparsable);
        };

        if parsed.editing_gate_closed() {
            self.state.open_editing_gate();
            tracing::info!("Manifest is marked as being edited. Waiting for editing to finish.");
            return Ok(CycleOutcome::EditingGate);
        }
        self.state.close_editing_gate();

        if !parsed.pending.is_empty() {
            tracing::info!(
                "Applying pending commands ({} add, {} delete).",
                parsed.pending.add.len(),
                parsed.pending.delete.len()
            );
            let edits = fold_commands(&parsed.pending, &parsed.snapshot);
            self.apply_manifest_edits(&edits)?;
            parsed = match self.parse_current() {
                Some(reparsed) => reparsed,
                None => return Ok(CycleOutcome::Unparsable),
            };
        }

        self.process(parsed.snapshot)
    }

    fn process(&mut self, current: ManifestSnapshot) -> Result<CycleOutcome> {
        let Some(baseline) = &self.baseline else {
            tracing::info!("No acknowledged state yet; taking the current manifest as baseline.");
            self.baseline = Some(current);
            return Ok(CycleOutcome::BaselineEstablished);
        };

        let changes = classify(&current.screens, &baseline.screens);
        if changes.is_empty() {
            tracing::info!("No changes detected compared to the last acknowledged state.");
            self.baseline = Some(current);
            return Ok(CycleOutcome::NoChanges);
        }

        let summary = changes.describe();
        tracing::info!("Detected changes:\n{}", summary);
        let question = format!(
            "The following changes were detected:\n{}\nProcess them now?",
            summary
        );
        if !self.confirm(&question, true) {
            tracing::info!("Changes not processed. They will be re-evaluated.");
            if self.state.record_decline() {
                tracing::debug!("one re-evaluation scheduled after decline");
            }
            return Ok(CycleOutcome::Declined);
        }

        if self.preflight() {
            return Ok(CycleOutcome::Aborted);
        }

        let mut applied = Vec::new();
        for batch in plan(&changes, &self.layout) {
            match self.run_batch(&batch)? {
                BatchResult::Completed(touched) => {
                    self.offer_commit(&batch, &touched);
                    applied.extend(touched);
                }
                BatchResult::Cancelled => {
                    tracing::info!("Aborting {}. Baseline left unchanged.", batch.kind.label());
                    return Ok(CycleOutcome::Cancelled(batch.kind));
                }
            }
        }

        applied.sort();
        applied.dedup();
        self.baseline = Some(current);
        tracing::info!("Processing for the current batch completed.");
        Ok(CycleOutcome::Applied(applied))
    }

    fn run_batch(&mut self, batch: &SubBatch) -> Result<BatchResult> {
        tracing::info!("Processing {}: {}", batch.kind.label(), batch.screens.join(", "));
        let mut touched = Vec::new();
        let mut generated = Vec::new();

        for step in &batch.steps {
            if !self.confirm(&format!("Confirm: {}?", step.description), true) {
                tracing::info!("Operation \"{}\" cancelled.", step.description);
                if batch.kind.rolls_back() {
                    self.roll_back(&generated);
                }
                return Ok(BatchResult::Cancelled);
            }

            match self.execute(&step.action) {
                Ok(paths) => {
                    if let StepAction::Generate { projection, .. } = &step.action {
                        generated.extend(paths.iter().map(|p| (*projection, p.clone())));
                    }
                    touched.extend(paths);
                }
                Err(e) => {
                    tracing::error!("Error during \"{}\": {}", step.description, e);
                    if batch.kind.rolls_back() {
                        self.roll_back(&generated);
                    }
                    return Err(e);
                }
            }
            self.absorb_notifications();
        }

        touched.sort();
        touched.dedup();
        Ok(BatchResult::Completed(touched))
    }

    fn execute(&mut self, action: &StepAction) -> Result<Vec<PathBuf>> {
        let projector = Projector::new(&self.layout);
        match action {
            StepAction::Generate {
                projection,
                entry,
                is_update,
            } => Ok(projector
                .generate(*projection, entry, *is_update, &mut self.prompter)?
                .into_iter()
                .collect()),
            StepAction::Remove { projection, screen } => {
                Ok(projector.remove(*projection, screen)?.into_iter().collect())
            }
            StepAction::Rename { projection, change } => {
                projector.rename(*projection, &change.old, &change.new, &mut self.prompter)
            }
            StepAction::AddImport(spec) => {
                self.apply_manifest_edits(&ManifestEdits::default().add_import(spec.clone()))
            }
            StepAction::RemoveImport(spec) => {
                self.apply_manifest_edits(&ManifestEdits::default().remove_import(spec.clone()))
            }
        }
    }

    /// Best effort removal of files written earlier in a refused sub-batch.
    /// Manifest edits are not reverted.
    fn roll_back(&self, generated: &[(Projection, PathBuf)]) {
        if generated.is_empty() {
            return;
        }
        tracing::info!("Undoing generated files for this batch...");
        let projector = Projector::new(&self.layout);
        for (projection, path) in generated {
            if !path.exists() {
                continue;
            }
            match projector.discard(*projection, path) {
                Ok(()) => tracing::info!("Removed: {}", self.layout.relative(path).display()),
                Err(e) => tracing::error!("[{}] Error undoing: {}", e.code(), e),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VERSION CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Offer to commit unrelated work first. `true` aborts the cycle.
    fn preflight(&mut self) -> bool {
        if !self.vcs.enabled() {
            return false;
        }
        let manifest = self.layout.manifest_path();
        let others: Vec<_> = match self.vcs.pending_changes() {
            Ok(changes) => changes
                .into_iter()
                .filter(|c| !same_path(&c.path, &manifest))
                .collect(),
            Err(e) => {
                tracing::warn!("[{}] could not inspect working tree: {}", e.code(), e);
                return false;
            }
        };
        if others.is_empty() {
            return false;
        }

        tracing::info!("Uncommitted changes found (excluding navigation config):");
        for change in &others {
            tracing::info!(
                "  - {} ({})",
                self.layout.relative(&change.path).display(),
                change.status.trim()
            );
        }
        if !self.confirm(
            "You have other uncommitted changes. Would you like to commit them first?",
            false,
        ) {
            tracing::info!("Proceeding without committing other changes.");
            return false;
        }

        let message = self
            .input("Enter commit message for other changes:", None)
            .filter(|m| !m.trim().is_empty());
        let Some(message) = message else {
            tracing::info!("No commit message provided. Aborting current operation.");
            return true;
        };
        let paths: Vec<PathBuf> = others.into_iter().map(|c| c.path).collect();
        if let Err(e) = self.vcs.commit(&message, &paths) {
            tracing::error!("[{}] {}", e.code(), e);
        }
        false
    }

    fn offer_commit(&mut self, batch: &SubBatch, touched: &[PathBuf]) {
        if touched.is_empty() {
            tracing::info!("No files were written for {}.", batch.kind.label());
            return;
        }
        tracing::info!("File operations for {} completed.", batch.kind.label());
        if !self.vcs.enabled() {
            return;
        }
        if !self.confirm(
            "All attempted changes for this batch are done. Do they work as expected?",
            true,
        ) {
            tracing::info!("Please review and commit manually.");
            return;
        }
        if !self.confirm("Commit these changes?", true) {
            return;
        }

        let suggested = batch.suggested_message();
        let message = self
            .input("Enter commit message:", Some(suggested.as_str()))
            .filter(|m| !m.trim().is_empty());
        let Some(message) = message else {
            tracing::info!("No commit message. Not committing.");
            return;
        };

        let mut paths = touched.to_vec();
        paths.push(self.layout.manifest_path());
        paths.sort();
        paths.dedup();
        if let Err(e) = self.vcs.commit(&message, &paths) {
            tracing::error!("[{}] {}", e.code(), e);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MANIFEST I/O
    // ═══════════════════════════════════════════════════════════════════════════

    fn manifest_display(&self) -> String {
        let path = self.layout.manifest_path();
        self.layout.relative(&path).display().to_string()
    }

    fn read_manifest(&self) -> Result<String> {
        let path = self.layout.manifest_path();
        fs::read_to_string(&path).map_err(|source| SyncError::Read { path, source })
    }

    /// `None` on any read or parse failure; the next notification retries.
    fn parse_current(&self) -> Option<ParsedManifest> {
        let parsed = self
            .read_manifest()
            .and_then(|source| parse_manifest(&source, &self.options));
        match parsed {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(
                    "[{}] {}. Waiting for next valid change.",
                    e.code(),
                    e
                );
                None
            }
        }
    }

    /// Mutate and write the manifest. Returns the manifest path when it
    /// actually changed.
    fn apply_manifest_edits(&mut self, edits: &ManifestEdits) -> Result<Vec<PathBuf>> {
        let source = self.read_manifest()?;
        let outcome = mutate_manifest(&source, edits, &self.options)?;
        if !outcome.changed {
            tracing::debug!("manifest edit was a no-op");
            return Ok(Vec::new());
        }

        let path = self.layout.manifest_path();
        self.state.expect_self_write();
        if let Err(source) = fs::write(&path, &outcome.source) {
            self.state.cancel_self_write();
            return Err(SyncError::Write { path, source });
        }
        tracing::info!(
            "Updated {}. Next direct change will be ignored.",
            self.manifest_display()
        );
        Ok(vec![path])
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROMPTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn confirm(&mut self, message: &str, default: bool) -> bool {
        let answer = self.prompter.confirm(message, default);
        self.absorb_notifications();
        answer
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let answer = self.prompter.input(message, default);
        self.absorb_notifications();
        answer
    }

    /// Route notifications that queued up while a prompt was open.
    fn absorb_notifications(&mut self) {
        while self.feed.poll() {
            self.state.on_notification();
        }
    }

    fn report(&self, error: SyncError) -> CycleOutcome {
        tracing::error!("[{}] {}", error.code(), error);
        CycleOutcome::Failed(error.to_string())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
