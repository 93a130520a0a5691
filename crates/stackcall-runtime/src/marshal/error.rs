//! Argument failures and the sticky per-call error state

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong with an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Slot kind does not match the declared type
    StructuralTypeMismatch,
    /// Slot kind matched but the value was rejected (NaN, unknown enum name, failed downcast)
    ValueConstraintViolation,
    /// The native function rejected its arguments itself
    UserSignaledInvalidArgument,
}

/// A failed call's diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ArgumentError {
    pub kind: ErrorKind,
    /// Fully formatted diagnostic, shown to scripts as-is
    pub message: String,
    /// Expected type name; empty for native-signalled failures
    pub expected: String,
    /// 1-based argument position; `None` for native-signalled failures
    pub argument: Option<usize>,
}

impl ArgumentError {
    /// Failure at `argument` rendered in the standard diagnostic format
    pub fn bad_argument(
        kind: ErrorKind,
        function: &str,
        expected: impl Into<String>,
        argument: usize,
        got: &str,
    ) -> Self {
        let expected = expected.into();
        Self {
            kind,
            message: bad_argument_message(function, &expected, argument, got),
            expected,
            argument: Some(argument),
        }
    }

    /// Failure reported by the native function
    pub fn from_native(signal: InvalidArgument) -> Self {
        Self {
            kind: ErrorKind::UserSignaledInvalidArgument,
            message: signal.0,
            expected: String::new(),
            argument: None,
        }
    }
}

/// Signal returned by a native function that rejects its arguments.
///
/// The message becomes the call's diagnostic unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidArgument(pub String);

impl InvalidArgument {
    pub fn new(message: impl Into<String>) -> Self {
        InvalidArgument(message.into())
    }
}

/// `Bad argument @ 'fn' [Expected T at argument N, got D]`
pub fn bad_argument_message(function: &str, expected: &str, argument: usize, got: &str) -> String {
    format!(
        "Bad argument @ '{}' [Expected {} at argument {}, got {}]",
        function, expected, argument, got
    )
}

/// First failure of one call. Once set it is never replaced or cleared.
#[derive(Debug, Default)]
pub struct ErrorState {
    error: Option<ArgumentError>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.error.is_some()
    }

    /// Record `error` unless a failure is already recorded.
    /// Returns whether it was recorded.
    pub fn set(&mut self, error: ArgumentError) -> bool {
        if self.error.is_some() {
            return false;
        }
        self.error = Some(error);
        true
    }

    pub fn get(&self) -> Option<&ArgumentError> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<ArgumentError> {
        self.error
    }
}
