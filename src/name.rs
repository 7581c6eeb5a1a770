//! Package name sanitizing and validation.
//!
//! A [`PackageName`] is always in the normalized form PyPI uses for lookups
//! (PEP 503): lowercase ASCII letters and digits separated by single hyphens.
//! Scaffolding additionally needs a leading letter so the derived import name
//! is a valid identifier; see [`PackageName::ensure_importable`].

use std::fmt;

use thiserror::Error;

/// Reasons a string is not an acceptable package name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvalidName {
    /// Nothing left after sanitizing (or the input was empty).
    #[error("package name cannot be empty")]
    Empty,
    /// Leading digit; the import package would not be a valid identifier.
    #[error("the name `{name}` cannot start with a digit")]
    StartWithDigit {
        /// The rejected name.
        name: String,
    },
    /// First character is not an ASCII letter or digit.
    #[error(
        "invalid character `{first_char}` in package name: `{name}`, \
         the first character must be an ASCII letter or digit"
    )]
    Start {
        /// The offending character.
        first_char: char,
        /// The rejected name.
        name: String,
    },
    /// A character outside `[a-z0-9-]`.
    #[error(
        "invalid character `{ch}` in package name: `{name}`, \
         characters must be lowercase ASCII alphanumeric or `-`"
    )]
    Char {
        /// The offending character.
        ch: char,
        /// The rejected name.
        name: String,
    },
    /// Trailing or doubled hyphen.
    #[error("package name `{name}` has a trailing or repeated `-`")]
    Separator {
        /// The rejected name.
        name: String,
    },
}

/// A sanitized package name, safe to send to the registry and to use as a
/// directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Accept `name` only if it is already in sanitized form.
    ///
    /// ```
    /// use pypkg::name::PackageName;
    /// assert!(PackageName::new("my-tool").is_ok());
    /// assert!(PackageName::new("My_Tool").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first rule the name breaks.
    pub fn new(name: &str) -> Result<Self, InvalidName> {
        validate(name)?;
        Ok(Self(name.to_owned()))
    }

    /// The distribution name, e.g. `my-tool`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The import package name, e.g. `my_tool`.
    #[must_use]
    pub fn module_name(&self) -> String {
        self.0.replace('-', "_")
    }

    /// Require that [`module_name`](Self::module_name) is a Python
    /// identifier. `2to3` is a fine project name but cannot be imported.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidName::StartWithDigit`].
    pub fn ensure_importable(&self) -> Result<(), InvalidName> {
        if self.0.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(InvalidName::StartWithDigit {
                name: self.0.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<(), InvalidName> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(InvalidName::Empty);
    };

    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return Err(InvalidName::Start {
            first_char: first,
            name: name.into(),
        });
    }

    let mut prev_was_dash = false;
    for ch in chars {
        if ch == '-' {
            if prev_was_dash {
                return Err(InvalidName::Separator { name: name.into() });
            }
            prev_was_dash = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            prev_was_dash = false;
        } else {
            return Err(InvalidName::Char {
                ch,
                name: name.into(),
            });
        }
    }

    if prev_was_dash {
        return Err(InvalidName::Separator { name: name.into() });
    }

    Ok(())
}

/// Normalize a user-supplied project name into a [`PackageName`].
///
/// Letters are lowercased, runs of whitespace, `-`, `_` and `.` collapse into
/// one `-`, and any other character is dropped.
///
/// ```
/// use pypkg::name::sanitize;
/// assert_eq!(sanitize("  My Cool_Package!! ").unwrap().as_str(), "my-cool-package");
/// ```
///
/// # Errors
///
/// Returns [`InvalidName::Empty`] if nothing usable remains.
pub fn sanitize(raw: &str) -> Result<PackageName, InvalidName> {
    let mut out = String::with_capacity(raw.len());
    let mut prev_was_dash = false;

    for ch in raw.trim().chars() {
        let normalized = match ch {
            'a'..='z' | '0'..='9' => Some(ch),
            'A'..='Z' => Some(ch.to_ascii_lowercase()),
            _ if ch.is_whitespace() || matches!(ch, '-' | '_' | '.') => Some('-'),
            _ => None,
        };

        match normalized {
            Some('-') => {
                if out.is_empty() || prev_was_dash {
                    continue;
                }
                out.push('-');
                prev_was_dash = true;
            }
            Some(c) => {
                out.push(c);
                prev_was_dash = false;
            }
            None => {}
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    PackageName::new(&out)
}
