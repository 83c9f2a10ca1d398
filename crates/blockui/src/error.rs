#![forbid(unsafe_code)]

//! Unified error model and recovery mapping.
//!
//! Each crate raises its own typed error. [`Error`] wraps them so hosts can
//! use one `?` type, and [`Error::recovery`] says what the overlay layer
//! expects the host to do about each.
//!
//! | Source                              | Recovery                      |
//! |-------------------------------------|-------------------------------|
//! | surface not mounted, slot occupied  | [`Recovery::RetryNextPass`]   |
//! | position solver failure             | [`Recovery::KeepVisibility`]  |
//! | gesture precondition not met        | [`Recovery::SkipGesture`]     |
//! | command bus failure, retry exhausted, bad settings | [`Recovery::Propagate`] |

use std::fmt;

use blockui_core::{BindError, SurfaceError};
use blockui_float::{InitError, SettingsError, SolverError};
use blockui_table::{CommandError, GestureOutcome, GestureResult, SkipReason};

/// Top-level error type for blockui hosts.
#[derive(Debug)]
pub enum Error {
    /// Deferred initialization did not complete.
    Init(InitError),
    /// The editor surface is not ready.
    Surface(SurfaceError),
    /// The registry binding slot is taken.
    Bind(BindError),
    /// The position solver rejected a request.
    Solver(SolverError),
    /// The document engine refused a command.
    Command(CommandError),
    /// A gesture's preconditions were not met.
    Precondition(SkipReason),
    /// Handle settings could not be loaded.
    Settings(SettingsError),
}

/// Standard result type for blockui APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// What the host should do when an error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing; the next `update()` tries again.
    RetryNextPass,
    /// Leave the floating element where and as it is.
    KeepVisibility,
    /// Drop the gesture; nothing was changed.
    SkipGesture,
    /// Hand the error to the caller.
    Propagate,
}

impl Error {
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Init(InitError::NotReady(_) | InitError::Bind(_)) => Recovery::RetryNextPass,
            Self::Init(InitError::RetryExhausted { .. }) => Recovery::Propagate,
            Self::Surface(_) | Self::Bind(_) => Recovery::RetryNextPass,
            Self::Solver(_) => Recovery::KeepVisibility,
            Self::Precondition(_) => Recovery::SkipGesture,
            Self::Command(_) | Self::Settings(_) => Recovery::Propagate,
        }
    }

    /// Error type label for tracing fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Surface(_) => "surface",
            Self::Bind(_) => "bind",
            Self::Solver(_) => "solver",
            Self::Command(_) => "command",
            Self::Precondition(_) => "precondition",
            Self::Settings(_) => "settings",
        }
    }

    /// Whether the overlay layer absorbs this error without caller action.
    pub fn is_absorbed(&self) -> bool {
        !matches!(self.recovery(), Recovery::Propagate)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(err) => write!(f, "init: {err}"),
            Self::Surface(err) => write!(f, "surface: {err}"),
            Self::Bind(err) => write!(f, "bind: {err}"),
            Self::Solver(err) => write!(f, "solver: {err}"),
            Self::Command(err) => write!(f, "command: {err}"),
            Self::Precondition(reason) => write!(f, "gesture skipped: {reason}"),
            Self::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Init(err) => Some(err),
            Self::Surface(err) => Some(err),
            Self::Bind(err) => Some(err),
            Self::Solver(err) => Some(err),
            Self::Command(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::Precondition(_) => None,
        }
    }
}

impl From<InitError> for Error {
    fn from(err: InitError) -> Self {
        Self::Init(err)
    }
}

impl From<SurfaceError> for Error {
    fn from(err: SurfaceError) -> Self {
        Self::Surface(err)
    }
}

impl From<BindError> for Error {
    fn from(err: BindError) -> Self {
        Self::Bind(err)
    }
}

impl From<SolverError> for Error {
    fn from(err: SolverError) -> Self {
        Self::Solver(err)
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<SkipReason> for Error {
    fn from(reason: SkipReason) -> Self {
        Self::Precondition(reason)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

/// Number of commands a gesture applied, with a skip turned into
/// [`Error::Precondition`].
///
/// # Errors
///
/// [`Error::Command`] when the bus failed, [`Error::Precondition`] when the
/// gesture was skipped.
pub fn applied(result: GestureResult) -> Result<usize> {
    match result? {
        GestureOutcome::Applied { commands } => Ok(commands),
        GestureOutcome::Skipped(reason) => Err(reason.into()),
    }
}
