//! Error types for definition, lookup, and value access.
//!
//! User input problems (bad/missing/unknown arguments, unknown commands) are
//! not errors here: they are match classifications reported by the run loop.

use thiserror::Error;

use crate::args::ArgKind;

/// Misuse of the construction contract. Raised at the offending call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Option or switch declared without an identifier.
    #[error("Identifier is required for non-positional argument '{name}'")]
    MissingIdentifier { name: String },

    /// Two specs share the same (identifier, name, kind) identity.
    #[error("Argument '{identity}' is already registered")]
    DuplicateArgument { identity: String },

    /// An option/switch name or identifier is already used by another spec of the same kind.
    #[error("{kind} key '{key}' is already used by another {kind}")]
    AmbiguousKey { kind: ArgKind, key: String },

    /// Two commands share the same name.
    #[error("Command '{name}' is already registered")]
    DuplicateCommand { name: String },

    /// Commands and top-level arguments were mixed on one app.
    #[error("An app takes either commands or top-level arguments, not both")]
    MixedAppModes,

    /// The configured default command does not exist.
    #[error("Default command '{name}' is not registered")]
    UnknownDefaultCommand { name: String },

    /// Execution requested with no handler bound.
    #[error("Handler not set")]
    HandlerNotSet,

    /// Execution requested before arguments were parsed.
    #[error("Arguments not processed")]
    NotParsed,
}

/// Failure converting a bound value to a typed representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{0}' is not an integer")]
    NotAnInteger(String),

    #[error("'{0}' is not an unsigned integer")]
    NotAnUnsignedInteger(String),

    #[error("'{0}' is not a number")]
    NotADouble(String),

    #[error("'{0}' is not a boolean")]
    NotABoolean(String),
}

/// Context lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("No {kind} argument '{key}'")]
    NotFound { kind: ArgKind, key: String },

    #[error("No positional argument at index {0}")]
    IndexNotFound(usize),

    #[error("Argument '{0}' has no value")]
    NoValue(String),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Returned by handlers that stop because cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Failure raised inside user handler code, caught at the run-loop boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerFault {
    #[error("Unhandled {origin} error: {message}")]
    Failed { origin: &'static str, message: String },

    #[error("Unhandled {origin} panic: {message}")]
    Panicked { origin: &'static str, message: String },

    #[error("Unhandled task cancellation")]
    Cancelled,
}
