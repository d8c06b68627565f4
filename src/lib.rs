//! # Navigation Sync
//!
//! Keeps a hand-authored screen manifest in sync with the files generated from
//! it: one feature module per screen plus an Expo route and a Next.js route.
//!
//! ## Pipeline Invariants
//!
//! 1. **Structural reads**: the manifest is parsed with Oxc and the screens
//!    array is located by shape (navigation declaration → first navigator →
//!    `screens` → tabs navigator → `screens`). Line numbers are never used.
//!
//! 2. **Unparsable is not an error**: a manifest caught mid-save yields
//!    [`SyncError::Syntax`] and the cycle waits for the next notification.
//!
//! 3. **One bucket per screen**: the classifier never reports a name in more
//!    than one of added / deleted / updated / renamed.
//!
//! 4. **Minimal manifest diffs**: edits are span-anchored. Bytes outside the
//!    touched spans come through unchanged, and adding an import that already
//!    exists is a no-op.
//!
//! 5. **Baseline discipline**: the last acknowledged snapshot moves only when
//!    a cycle completes or finds nothing to do. Declines and cancellations
//!    leave it where it was.
//!
//! 6. **Own writes are not changes**: every manifest write arms a one-shot
//!    flag that swallows exactly one notification.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod intent;
pub mod model;
pub mod mutate;
pub mod parse;
pub mod plan;
pub mod projection;
pub mod prompt;
pub mod slug;
pub mod state;
pub mod templates;
pub mod vcs;
pub mod watch;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod projection_tests;

pub use classify::{classify, classify_with, ComponentIdentity, IdentityMatcher};
pub use config::{ProjectLayout, SyncConfig};
pub use engine::{CycleOutcome, DirectCommand, SyncEngine};
pub use error::{Result, SyncError};
pub use model::{ChangeSet, ManifestSnapshot, ParsedManifest, ScreenEntry};
pub use mutate::{mutate_manifest, ManifestEdits, MutationOutcome};
pub use parse::{parse_manifest, ParseOptions};
