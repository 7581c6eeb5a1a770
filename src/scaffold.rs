//! Project directory layout.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::git::Identity;
use crate::name::PackageName;
use crate::templates;

/// Everything the templates need to render a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    /// Sanitized package name.
    pub name: PackageName,
    /// One-line project description.
    pub description: String,
    /// Author for `pyproject.toml`, if known.
    pub author: Option<Identity>,
}

impl ProjectSpec {
    /// A spec with a placeholder description and no author.
    #[must_use]
    pub fn new(name: PackageName) -> Self {
        let description = format!("The {name} package.");
        Self {
            name,
            description,
            author: None,
        }
    }
}

/// Create `path` and any missing parents. An existing directory is fine.
///
/// # Errors
///
/// Returns [`Error::Io`] naming `path`.
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Write `content` to a new file at `path`. Never overwrites.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists or cannot be written.
pub fn write_template_file(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(path, e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
    Ok(entries.next().is_none())
}

/// Lay out a new project under `parent/<name>` and return that path.
///
/// An empty pre-existing directory is reused; one with content is refused.
///
/// # Errors
///
/// Returns [`Error::DirectoryNotEmpty`] or [`Error::Io`].
pub fn create_package_structure(parent: &Path, spec: &ProjectSpec) -> Result<PathBuf> {
    let root = parent.join(spec.name.as_str());
    let existed = root.exists();
    if existed && !(root.is_dir() && is_empty_dir(&root)?) {
        return Err(Error::DirectoryNotEmpty(root));
    }

    undo_on_error(&root, existed, || write_layout(&root, spec))?;
    Ok(root)
}

// Remove whatever a failed run left under `root`, so a retry does not trip
// over a half-built project. A directory that existed beforehand is kept,
// emptied.
fn undo_on_error(root: &Path, existed: bool, build: impl FnOnce() -> Result<()>) -> Result<()> {
    let result = build();
    if result.is_err() {
        let cleanup = fs::remove_dir_all(root).and_then(|()| {
            if existed {
                fs::create_dir(root)
            } else {
                Ok(())
            }
        });
        match cleanup {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!("could not clean up {}: {e}", root.display());
            }
            _ => {}
        }
    }
    result
}

fn write_layout(root: &Path, spec: &ProjectSpec) -> Result<()> {
    let module = spec.name.module_name();
    let package_dir = root.join("src").join(&module);
    let tests_dir = root.join("tests");

    create_directory(&package_dir)?;
    create_directory(&tests_dir)?;

    write_template_file(&root.join(".gitignore"), templates::gitignore())?;
    write_template_file(&root.join("README.md"), &templates::readme(spec))?;
    write_template_file(&root.join("pyproject.toml"), &templates::pyproject(spec))?;
    write_template_file(&package_dir.join("__init__.py"), &templates::package_init(spec))?;
    write_template_file(
        &tests_dir.join(format!("test_{module}.py")),
        &templates::smoke_test(spec),
    )?;

    Ok(())
}
