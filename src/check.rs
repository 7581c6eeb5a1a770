//! Core availability checking logic for package names on PyPI.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};
use ureq::Agent;

use crate::name::PackageName;

/// Public package index used when no other registry is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";

/// Default bound on a whole lookup, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Project JSON for popular packages lists every release and can run to
// several megabytes.
const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

/// The availability of a package name on the registry.
///
/// Returned by [`check_name`]. `Unknown` carries the reason the registry
/// could not answer; it must never be read as `Available`.
#[derive(Debug)]
#[must_use]
pub enum Availability {
    /// No project with this name exists.
    Available,
    /// A project with this name is already registered.
    Taken,
    /// The registry could not be reached or its reply made no sense.
    Unknown(LookupError),
}

impl Availability {
    /// True only for a definitive `Available`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Taken => write!(f, "taken"),
            Self::Unknown(e) => write!(f, "unknown: {e}"),
        }
    }
}

/// Why a lookup produced no answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LookupError {
    /// Timeout, DNS, connection, TLS or body read failure.
    #[error("registry unreachable: {0}")]
    Network(#[source] Box<ureq::Error>),
    /// The registry answered, but not with a 200 project or a 404.
    #[error("unexpected registry response: {0}")]
    AmbiguousResponse(String),
}

/// A registry reply reduced to what the checker cares about.
#[derive(Debug)]
pub enum Lookup {
    /// The project exists.
    Exists {
        /// Latest release, when the registry reported one.
        latest_version: Option<String>,
    },
    /// The registry has no such project.
    NotFound,
    /// No answer could be obtained.
    Error(LookupError),
}

/// Something that can answer "is this name registered?".
///
/// [`PyPi`] talks to the real index; tests substitute their own.
pub trait Registry {
    /// Perform exactly one lookup for `name`.
    fn lookup(&self, name: &PackageName) -> Lookup;
}

/// Where and how patiently to query the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Base URL; `/pypi/{name}/json` is appended.
    pub base_url: String,
    /// Global timeout applied to each request.
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A PyPI JSON API client.
///
/// Wraps the underlying HTTP agent to insulate callers from the specific
/// HTTP library version used internally.
///
/// ```no_run
/// use pypkg::check::PyPi;
///
/// let registry = PyPi::new();
/// ```
#[derive(Debug, Clone)]
pub struct PyPi {
    agent: Agent,
    base_url: String,
}

impl PyPi {
    /// Client for pypi.org with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Client for an arbitrary index that serves the PyPI JSON API.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
                " (",
                env!("CARGO_PKG_REPOSITORY"),
                ")"
            ))
            .build();
        Self {
            agent: Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn project_url(&self, name: &PackageName) -> String {
        format!("{}/pypi/{name}/json", self.base_url)
    }
}

impl Default for PyPi {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for PyPi {
    fn lookup(&self, name: &PackageName) -> Lookup {
        let url = self.project_url(name);
        trace!("GET {url}");

        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(e) => return Lookup::Error(LookupError::Network(Box::new(e))),
        };

        match response.status().as_u16() {
            200 => match response
                .body_mut()
                .with_config()
                .limit(MAX_BODY_BYTES)
                .read_to_string()
            {
                Ok(body) => parse_project(&body),
                Err(e) => Lookup::Error(body_error(e)),
            },
            404 => Lookup::NotFound,
            status => Lookup::Error(LookupError::AmbiguousResponse(format!("HTTP {status}"))),
        }
    }
}

// The registry answered; a body we cannot decode is a bad answer, not a
// missing one.
fn body_error(e: ureq::Error) -> LookupError {
    match e {
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::InvalidData => {
            LookupError::AmbiguousResponse(format!("unreadable project document: {e}"))
        }
        ureq::Error::BodyExceedsLimit(_) => {
            LookupError::AmbiguousResponse(format!("unreadable project document: {e}"))
        }
        e => LookupError::Network(Box::new(e)),
    }
}

#[derive(Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Deserialize)]
struct ProjectInfo {
    name: String,
    version: Option<String>,
}

/// Interpret the body of a `200 OK` project response.
///
/// Anything that is not a project document with `info.name` is treated as
/// ambiguous rather than as proof of existence.
///
/// ```
/// use pypkg::check::{parse_project, Lookup};
///
/// let body = r#"{"info": {"name": "requests", "version": "2.32.3"}}"#;
/// assert!(matches!(parse_project(body), Lookup::Exists { .. }));
/// ```
#[must_use]
pub fn parse_project(body: &str) -> Lookup {
    match serde_json::from_str::<ProjectResponse>(body) {
        Ok(project) if !project.info.name.trim().is_empty() => Lookup::Exists {
            latest_version: project.info.version.filter(|v| !v.is_empty()),
        },
        Ok(_) => Lookup::Error(LookupError::AmbiguousResponse(
            "project document has an empty name".to_owned(),
        )),
        Err(e) => Lookup::Error(LookupError::AmbiguousResponse(format!(
            "malformed project document: {e}"
        ))),
    }
}

/// Check whether a package name is available on the registry.
///
/// Issues exactly one lookup. A failed lookup is reported as
/// [`Availability::Unknown`], never as available.
///
/// ```no_run
/// use pypkg::check::{check_name, Availability, PyPi};
/// use pypkg::name::sanitize;
///
/// let registry = PyPi::new();
/// let name = sanitize("my-cool-package").unwrap();
/// match check_name(&registry, &name) {
///     Availability::Available => println!("go grab it!"),
///     other => println!("{other}"),
/// }
/// ```
pub fn check_name<R: Registry + ?Sized>(registry: &R, name: &PackageName) -> Availability {
    match registry.lookup(name) {
        Lookup::Exists { latest_version } => {
            debug!(
                "{name} exists (latest {})",
                latest_version.as_deref().unwrap_or("unreleased")
            );
            Availability::Taken
        }
        Lookup::NotFound => {
            debug!("{name} not found");
            Availability::Available
        }
        Lookup::Error(e) => {
            debug!("{name} lookup failed: {e}");
            Availability::Unknown(e)
        }
    }
}

/// Like [`check_name`], but repeats the lookup up to `retries` more times
/// after network failures. Ambiguous responses are returned immediately.
pub fn check_name_with_retries<R: Registry + ?Sized>(
    registry: &R,
    name: &PackageName,
    retries: u32,
) -> Availability {
    let mut attempt = 0;
    loop {
        match check_name(registry, name) {
            Availability::Unknown(LookupError::Network(e)) if attempt < retries => {
                attempt += 1;
                warn!("lookup of {name} failed ({e}), retrying ({attempt}/{retries})");
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    /// Replays canned lookups and counts calls.
    struct Scripted {
        replies: RefCell<VecDeque<Lookup>>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = Lookup>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().collect()),
                calls: Cell::new(0),
            }
        }
    }

    impl Registry for Scripted {
        fn lookup(&self, _name: &PackageName) -> Lookup {
            self.calls.set(self.calls.get() + 1);
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("registry called more often than scripted")
        }
    }

    fn network_error() -> Lookup {
        Lookup::Error(LookupError::Network(Box::new(ureq::Error::Io(
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        ))))
    }

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    #[test]
    fn exists_is_taken() {
        let registry = Scripted::new([Lookup::Exists {
            latest_version: Some("2.32.3".into()),
        }]);
        assert!(matches!(
            check_name(&registry, &name("requests")),
            Availability::Taken
        ));
        assert_eq!(registry.calls.get(), 1);
    }

    #[test]
    fn not_found_is_available() {
        let registry = Scripted::new([Lookup::NotFound]);
        let result = check_name(&registry, &name("zz-unlikely-unused-name-12345"));
        assert!(result.is_available());
    }

    #[test]
    fn network_failure_is_unknown_not_available() {
        let registry = Scripted::new([network_error()]);
        let result = check_name(&registry, &name("anything"));
        assert!(!result.is_available());
        assert!(matches!(
            result,
            Availability::Unknown(LookupError::Network(_))
        ));
    }

    #[test]
    fn ambiguous_response_is_unknown() {
        let registry = Scripted::new([Lookup::Error(LookupError::AmbiguousResponse(
            "HTTP 503".into(),
        ))]);
        match check_name(&registry, &name("anything")) {
            Availability::Unknown(LookupError::AmbiguousResponse(detail)) => {
                assert_eq!(detail, "HTTP 503");
            }
            other => panic!("expected AmbiguousResponse, got {other:?}"),
        }
    }

    #[test]
    fn repeated_checks_agree() {
        let registry = Scripted::new([Lookup::NotFound, Lookup::NotFound]);
        let n = name("stable");
        let first = check_name(&registry, &n).to_string();
        let second = check_name(&registry, &n).to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_retries_makes_one_call() {
        let registry = Scripted::new([network_error()]);
        let result = check_name_with_retries(&registry, &name("flaky"), 0);
        assert!(matches!(result, Availability::Unknown(_)));
        assert_eq!(registry.calls.get(), 1);
    }

    #[test]
    fn retries_recover_from_network_failure() {
        let registry = Scripted::new([network_error(), network_error(), Lookup::NotFound]);
        let result = check_name_with_retries(&registry, &name("flaky"), 2);
        assert!(result.is_available());
        assert_eq!(registry.calls.get(), 3);
    }

    #[test]
    fn ambiguous_response_is_not_retried() {
        let registry = Scripted::new([Lookup::Error(LookupError::AmbiguousResponse(
            "HTTP 500".into(),
        ))]);
        let result = check_name_with_retries(&registry, &name("broken"), 5);
        assert!(matches!(
            result,
            Availability::Unknown(LookupError::AmbiguousResponse(_))
        ));
        assert_eq!(registry.calls.get(), 1);
    }

    #[test]
    fn parse_project_reads_latest_version() {
        let body = r#"{"info": {"name": "requests", "version": "2.32.3"}, "releases": {}}"#;
        match parse_project(body) {
            Lookup::Exists { latest_version } => {
                assert_eq!(latest_version.as_deref(), Some("2.32.3"));
            }
            other => panic!("expected Exists, got {other:?}"),
        }
    }

    #[test]
    fn parse_project_rejects_garbage() {
        for body in ["<html>maintenance</html>", "{}", r#"{"info": {"name": " "}}"#] {
            assert!(
                matches!(
                    parse_project(body),
                    Lookup::Error(LookupError::AmbiguousResponse(_))
                ),
                "body: {body}"
            );
        }
    }

    #[test]
    fn undecodable_body_is_ambiguous() {
        let invalid_utf8 = ureq::Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "stream did not contain valid UTF-8",
        ));
        assert!(matches!(
            body_error(invalid_utf8),
            LookupError::AmbiguousResponse(_)
        ));
        assert!(matches!(
            body_error(ureq::Error::BodyExceedsLimit(MAX_BODY_BYTES)),
            LookupError::AmbiguousResponse(_)
        ));
    }

    #[test]
    fn interrupted_body_is_network() {
        let reset = ureq::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));
        assert!(matches!(body_error(reset), LookupError::Network(_)));
    }

    #[test]
    fn project_url_is_normalized() {
        let registry = PyPi::with_config(RegistryConfig {
            base_url: "http://localhost:8080/".into(),
            timeout: Duration::from_secs(1),
        });
        assert_eq!(
            registry.project_url(&name("my-tool")),
            "http://localhost:8080/pypi/my-tool/json"
        );
    }

    #[test]
    #[ignore = "requires network access; run with: cargo test -- --ignored"]
    fn requests_is_taken() {
        let registry = PyPi::new();
        match check_name(&registry, &name("requests")) {
            Availability::Taken => {}
            other => panic!("expected Taken, got {other:?}"),
        }
    }

    #[test]
    #[ignore = "requires network access"]
    fn unlikely_name_is_available() {
        let registry = PyPi::new();
        match check_name(&registry, &name("zz-unlikely-unused-name-12345")) {
            Availability::Available => {}
            other => panic!("expected Available, got {other:?}"),
        }
    }

    #[test]
    fn lookup_error_is_send_sync() {
        fn assert_normal<T: Sized + Send + Sync>() {}
        assert_normal::<LookupError>();
        assert_normal::<Availability>();
    }

    #[test]
    fn pypi_is_send_sync() {
        fn assert_normal<T: Sized + Send + Sync>() {}
        assert_normal::<PyPi>();
    }
}
