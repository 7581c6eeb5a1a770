#![warn(missing_docs, missing_debug_implementations)]

//! Scaffold new Python packages and check whether their names are free on
//! PyPI.
//!
//! Names are sanitized into the normalized form PyPI uses for lookups, so a
//! single request to the JSON API answers for every spelling that would
//! collide (`My_Tool`, `my.tool`, `my-tool`). A registry that cannot be
//! reached is reported as unknown, never as available.
//!
//! # Example
//!
//! ```no_run
//! use pypkg::check::{check_name, Availability, PyPi};
//! use pypkg::name::sanitize;
//!
//! let registry = PyPi::new();
//! let name = sanitize("My Cool Package").unwrap();
//! match check_name(&registry, &name) {
//!     Availability::Available => println!("Name is available!"),
//!     Availability::Taken => println!("Already taken."),
//!     Availability::Unknown(e) => eprintln!("Could not tell: {e}"),
//! }
//! ```

pub mod check;
pub mod create;
pub mod error;
pub mod git;
pub mod name;
pub mod scaffold;
pub mod templates;

pub use error::{Error, Result};
