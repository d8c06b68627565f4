//! Version-control collaborator.
//!
//! Failures here are reported to the caller and never roll back files that
//! were already written.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::{Result, SyncError};

/// A tracked file with uncommitted changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub path: PathBuf,
    /// Two-letter porcelain status, e.g. ` M` or `D `.
    pub status: String,
}

pub trait VersionControl {
    /// Whether commits should be offered at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Tracked changes in the working tree, untracked files excluded.
    fn pending_changes(&self) -> Result<Vec<PendingChange>>;

    /// Stage `paths` (additions, modifications and deletions) and commit.
    fn commit(&mut self, message: &str, paths: &[PathBuf]) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// GIT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| SyncError::Vcs(format!("git {} failed to start: {e}", args[0])))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::Vcs(format!(
                "git {} failed: {}",
                args[0],
                stderr.trim()
            )));
        }
        Ok(output)
    }

    fn toplevel(&self) -> Result<PathBuf> {
        let output = self.run(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }
}

fn path_args<'a>(head: &[&'a str], paths: &'a [&PathBuf]) -> Vec<&'a str> {
    let mut args = head.to_vec();
    args.extend(paths.iter().filter_map(|p| p.to_str()));
    args
}

/// Parse `git status --porcelain` output, resolving paths against `toplevel`.
pub fn parse_porcelain(stdout: &str, toplevel: &Path) -> Vec<PendingChange> {
    stdout
        .lines()
        .filter(|line| line.len() > 3 && !line.starts_with("??"))
        .map(|line| {
            let (status, path) = line.split_at(2);
            let path = path.trim_start();
            // renames are reported as `old -> new`
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            PendingChange {
                path: toplevel.join(path.trim_matches('"')),
                status: status.to_string(),
            }
        })
        .collect()
}

impl VersionControl for GitCli {
    fn pending_changes(&self) -> Result<Vec<PendingChange>> {
        let toplevel = self.toplevel()?;
        let output = self.run(&["status", "--porcelain"])?;
        Ok(parse_porcelain(
            &String::from_utf8_lossy(&output.stdout),
            &toplevel,
        ))
    }

    fn commit(&mut self, message: &str, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            tracing::warn!("commit requested with no files to add");
        }
        let (present, removed): (Vec<&PathBuf>, Vec<&PathBuf>) =
            paths.iter().partition(|p| p.exists());
        // a removed path git never tracked is not an error
        if !removed.is_empty() {
            self.run(&path_args(&["rm", "--cached", "--ignore-unmatch", "-q", "--"], &removed))?;
        }
        if !present.is_empty() {
            self.run(&path_args(&["add", "-A", "--"], &present))?;
        }
        self.run(&["commit", "-m", message])?;
        tracing::info!("Changes committed successfully.");
        Ok(())
    }
}

/// Version control switched off (`--no-commit`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVcs;

impl VersionControl for NoVcs {
    fn enabled(&self) -> bool {
        false
    }

    fn pending_changes(&self) -> Result<Vec<PendingChange>> {
        Ok(Vec::new())
    }

    fn commit(&mut self, _message: &str, _paths: &[PathBuf]) -> Result<()> {
        Ok(())
    }
}

impl<V: VersionControl + ?Sized> VersionControl for Box<V> {
    fn enabled(&self) -> bool {
        (**self).enabled()
    }

    fn pending_changes(&self) -> Result<Vec<PendingChange>> {
        (**self).pending_changes()
    }

    fn commit(&mut self, message: &str, paths: &[PathBuf]) -> Result<()> {
        (**self).commit(message, paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porcelain_skips_untracked() {
        let out = " M packages/app/features/home/screen.tsx\n?? scratch.txt\nD  apps/expo/app/(tabs)/old.tsx\n";
        let changes = parse_porcelain(out, Path::new("/repo"));
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0].path,
            PathBuf::from("/repo/packages/app/features/home/screen.tsx")
        );
        assert_eq!(changes[0].status, " M");
        assert_eq!(changes[1].status, "D ");
    }

    #[test]
    fn test_porcelain_rename_takes_new_path() {
        let out = "R  a/old.tsx -> a/new.tsx\n";
        let changes = parse_porcelain(out, Path::new("/repo"));
        assert_eq!(changes[0].path, PathBuf::from("/repo/a/new.tsx"));
    }
}
