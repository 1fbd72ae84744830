//! Error taxonomy for remote route and component loading.
//!
//! DESIGN
//! ======
//! Remote failures never escalate past the remote that caused them, so these
//! errors are mostly logged rather than returned to callers. Each one maps to
//! a `LoadHint` that tells an operator where to start looking.

use serde::Serialize;

// =============================================================================
// HINTS
// =============================================================================

/// Classified cause of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadHint {
    /// Remote unreachable or returned a non-success status.
    Network,
    /// Remote built against shared dependencies the shell does not provide.
    SharedDependency,
    /// Remote is up but does not expose the requested export.
    MissingExport,
    /// Remote answered with something that is not the expected shape.
    Malformed,
    /// Remote code failed while loading or mounting.
    Crashed,
}

impl LoadHint {
    /// Human-readable remediation line.
    #[must_use]
    pub fn remedy(self) -> &'static str {
        match self {
            Self::Network => "check that the remote is deployed and its base URL is reachable from the shell",
            Self::SharedDependency => "rebuild the remote against the shell's shared dependency versions",
            Self::MissingExport => "verify the remote exposes this name, or add it to the shell's component list",
            Self::Malformed => "verify the remote's export matches the route/component contract",
            Self::Crashed => "inspect the remote's own logs; the failure happened inside remote code",
        }
    }
}

// =============================================================================
// ROUTE SOURCE
// =============================================================================

/// Failure to obtain a remote's route declarations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouteSourceError {
    #[error("route source unreachable: {0}")]
    Unreachable(String),
    #[error("route source returned status {status}")]
    Status { status: u16 },
    #[error("remote does not export routes")]
    MissingExport,
    #[error("route export malformed: {0}")]
    Malformed(String),
}

impl RouteSourceError {
    #[must_use]
    pub fn hint(&self) -> LoadHint {
        match self {
            Self::Unreachable(_) | Self::Status { .. } => LoadHint::Network,
            Self::MissingExport => LoadHint::MissingExport,
            Self::Malformed(_) => LoadHint::Malformed,
        }
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Failure to load a registered component's module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentLoadError {
    #[error("remote unreachable: {0}")]
    Network(String),
    #[error("remote returned status {status}")]
    Status { status: u16 },
    #[error("module has neither a default export nor a named export `{component}`")]
    MissingExport { component: String },
    #[error("shared dependency mismatch: {0}")]
    SharedDependency(String),
    #[error("module malformed: {0}")]
    Malformed(String),
    #[error("module loader panicked: {0}")]
    Panicked(String),
}

impl ComponentLoadError {
    #[must_use]
    pub fn hint(&self) -> LoadHint {
        match self {
            Self::Network(_) | Self::Status { .. } => LoadHint::Network,
            Self::MissingExport { .. } => LoadHint::MissingExport,
            Self::SharedDependency(_) => LoadHint::SharedDependency,
            Self::Malformed(_) => LoadHint::Malformed,
            Self::Panicked(_) => LoadHint::Crashed,
        }
    }
}

/// Failure raised by a component while mounting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl RenderError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
