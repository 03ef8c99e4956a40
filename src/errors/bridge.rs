// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the host/guest kernel bridge.
//!
//! Every stage of the bridge reports failures through [`BridgeError`]:
//! catalog construction (loading, compiling, negotiating capabilities) and
//! individual invocations (contract checks, buffer sizing, marshaling, guest
//! traps). Nothing in the library aborts the process; callers decide whether
//! a failure is fatal.

use crate::bridge::InputKind;
use thiserror::Error;

/// Comprehensive error type for all bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The module file could not be read, compiled or instantiated.
    #[error("Failed to load module '{module}': {reason}")]
    LoadFailure { module: String, reason: String },

    /// `input_type` (or another negotiation export) is absent or returned an invalid value.
    #[error("Module '{module}' violates the capability contract: {reason}")]
    CapabilityViolation { module: String, reason: String },

    /// `user_level_type` declared something other than f64.
    #[error("Module '{module}' declares unsupported element type {element}; only f64 (code 10) is supported")]
    UnsupportedElementType { module: String, element: String },

    /// No module with this name is registered.
    #[error("Module '{0}' not found in catalog")]
    NotFound(String),

    /// The supplied input shape differs from the negotiated one.
    #[error("Module '{module}' expects {expected} input but {supplied} input was supplied")]
    KindMismatch {
        module: String,
        expected: InputKind,
        supplied: InputKind,
    },

    /// Both or neither of vector/matrix input were supplied.
    #[error("Exactly one of vector or matrix input must be supplied")]
    AmbiguousInput,

    /// Fewer scalar arguments than the module declared.
    #[error("Module '{module}' requires {required} scalar argument(s) but {supplied} were supplied")]
    InsufficientScalarArgs {
        module: String,
        required: usize,
        supplied: usize,
    },

    /// The guest-reported buffer length differs from the requested one.
    #[error("Guest buffer size negotiation failed: requested {requested} elements, guest reports {reported}")]
    SizeNegotiationFailed { requested: usize, reported: i64 },

    /// The matrix is not rectangular.
    #[error("Irregular matrix: {0}")]
    IrregularMatrix(String),

    /// A payload the bridge cannot marshal, such as a histogram sample.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The guest faulted while executing an export.
    #[error("Guest trapped in '{export}': {message}")]
    GuestTrap { export: String, message: String },

    /// A required export is missing or has the wrong signature.
    #[error("Module does not export '{name}' with signature {signature}")]
    MissingExport {
        name: String,
        signature: &'static str,
    },

    /// A guest buffer access fell outside the view or the guest's linear memory.
    #[error("Memory access out of bounds: {0}")]
    OutOfBounds(String),

    /// A previous invocation panicked while holding the module lock.
    #[error("Module '{0}' instance lock is poisoned")]
    InstancePoisoned(String),

    /// File I/O error during catalog loading.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The bytes parse but are not a usable WASM binary.
    #[error("Invalid WASM binary: {0}")]
    InvalidBinary(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    ParserError(#[from] wasmparser::BinaryReaderError),

    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    EngineError(String),

    /// The blocking task running an invocation could not be joined.
    #[error("Invocation task failed: {0}")]
    TaskJoin(String),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Wraps any displayable failure as a [`BridgeError::LoadFailure`] for `module`.
    pub(crate) fn load_failure(module: &str, reason: impl std::fmt::Display) -> Self {
        BridgeError::LoadFailure {
            module: module.to_string(),
            reason: reason.to_string(),
        }
    }
}
