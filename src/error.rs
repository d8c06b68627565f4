//! Error taxonomy for the synchronization engine.
//!
//! Nothing in here is fatal to watch mode: the engine logs the error, leaves the
//! baseline alone and waits for the next notification.

use std::io;
use std::path::PathBuf;

pub const ERR_IO: &str = "NAV-ERR-IO";
pub const ERR_SYNTAX: &str = "NAV-ERR-SYNTAX";
pub const ERR_STRUCTURE: &str = "NAV-ERR-STRUCTURE";
pub const ERR_EDIT: &str = "NAV-ERR-EDIT";
pub const ERR_SCREEN: &str = "NAV-ERR-SCREEN";
pub const ERR_VCS: &str = "NAV-ERR-VCS";
pub const ERR_CONFIG: &str = "NAV-ERR-CONFIG";
pub const ERR_WATCH: &str = "NAV-ERR-WATCH";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("manifest has syntax errors: {0}")]
    Syntax(String),

    #[error("manifest structure not found: {0}")]
    Structure(String),

    #[error("manifest edit produced unparsable source: {0}")]
    InvalidEdit(String),

    #[error("invalid screen name '{0}'")]
    InvalidScreenName(String),

    #[error("screen '{0}' is not declared in the manifest")]
    UnknownScreen(String),

    #[error("screen '{0}' is already declared in the manifest")]
    DuplicateScreen(String),

    #[error("version control: {0}")]
    Vcs(String),

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("file watcher: {0}")]
    Watch(#[from] notify::Error),
}

impl SyncError {
    /// Stable code for log lines and exit diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Read { .. } | SyncError::Write { .. } | SyncError::Remove { .. } => ERR_IO,
            SyncError::Syntax(_) => ERR_SYNTAX,
            SyncError::Structure(_) => ERR_STRUCTURE,
            SyncError::InvalidEdit(_) => ERR_EDIT,
            SyncError::InvalidScreenName(_)
            | SyncError::UnknownScreen(_)
            | SyncError::DuplicateScreen(_) => ERR_SCREEN,
            SyncError::Vcs(_) => ERR_VCS,
            SyncError::Config { .. } => ERR_CONFIG,
            SyncError::Watch(_) => ERR_WATCH,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
