//! The `new` workflow: sanitize, check, scaffold, init.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::check::{Availability, Registry, check_name_with_retries};
use crate::error::{Error, Result};
use crate::git;
use crate::name::{PackageName, sanitize};
use crate::scaffold::{ProjectSpec, create_package_structure};

/// Knobs for [`create_project`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Directory the project directory is created in.
    pub parent: PathBuf,
    /// Overrides the placeholder description.
    pub description: Option<String>,
    /// Run `git init` in the new project.
    pub init_git: bool,
    /// Scaffold even if the name is already registered.
    pub allow_taken: bool,
    /// Abort when availability cannot be determined.
    pub strict: bool,
    /// Extra lookups after network failures.
    pub retries: u32,
}

/// What [`create_project`] did.
#[derive(Debug)]
pub struct Created {
    /// Sanitized name actually used.
    pub name: PackageName,
    /// Project root.
    pub root: PathBuf,
    /// Registry verdict; `None` when no registry was consulted.
    pub availability: Option<Availability>,
    /// Whether `git init` succeeded.
    pub git_initialized: bool,
}

/// Create a new project from a raw, user-supplied name.
///
/// With `registry` set to `None` the availability check is skipped.
///
/// # Errors
///
/// [`Error::InvalidName`] if the name cannot be sanitized, [`Error::Taken`]
/// or [`Error::Unknown`] depending on `options`, and scaffolding errors.
/// A failed `git init` is logged, not returned.
pub fn create_project(
    registry: Option<&dyn Registry>,
    raw_name: &str,
    options: &CreateOptions,
) -> Result<Created> {
    let name = sanitize(raw_name)?;
    name.ensure_importable()?;
    if name.as_str() != raw_name {
        info!("using sanitized name `{name}` for `{raw_name}`");
    }

    let availability = match registry {
        Some(registry) => Some(verify(registry, &name, options)?),
        None => None,
    };

    let mut spec = ProjectSpec::new(name.clone());
    if let Some(description) = &options.description {
        spec.description.clone_from(description);
    }
    spec.author = git::local_identity(&options.parent);

    let root = create_package_structure(&options.parent, &spec)?;

    let git_initialized = options.init_git
        && match git::init_repo(&root) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        };

    Ok(Created {
        name,
        root,
        availability,
        git_initialized,
    })
}

fn verify(
    registry: &dyn Registry,
    name: &PackageName,
    options: &CreateOptions,
) -> Result<Availability> {
    match check_name_with_retries(registry, name, options.retries) {
        Availability::Taken if !options.allow_taken => Err(Error::Taken(name.clone())),
        Availability::Taken => {
            warn!("`{name}` is already taken on the package index, continuing anyway");
            Ok(Availability::Taken)
        }
        Availability::Unknown(source) if options.strict => Err(Error::Unknown {
            name: name.clone(),
            source,
        }),
        Availability::Unknown(source) => {
            warn!("could not verify that `{name}` is available ({source}), continuing");
            Ok(Availability::Unknown(source))
        }
        Availability::Available => Ok(Availability::Available),
    }
}
