//! Local git repository setup.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Committer identity read from git config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `user.name`
    pub name: String,
    /// `user.email`
    pub email: String,
    /// `github.user`, if configured.
    pub github_user: Option<String>,
}

/// Run `git init` in `path`.
///
/// # Errors
///
/// Returns [`Error::Git`] if git cannot be spawned or exits non-zero.
pub fn init_repo(path: &Path) -> Result<()> {
    let output = Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(path)
        .output()
        .map_err(|e| Error::Git {
            command: "init".into(),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Git {
            command: "init".into(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!("initialized git repository in {}", path.display());
    Ok(())
}

/// Read a single config value as git sees it from `dir`.
/// Unset keys, empty values and a missing git all read as `None`.
fn config_get(dir: &Path, key: &str) -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", key])
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// The committer identity visible from `dir`, or `None` unless both
/// `user.name` and `user.email` are set.
#[must_use]
pub fn local_identity(dir: &Path) -> Option<Identity> {
    let name = config_get(dir, "user.name")?;
    let email = config_get(dir, "user.email")?;
    Some(Identity {
        name,
        email,
        github_user: config_get(dir, "github.user"),
    })
}
