// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for WASM module loading and kernel invocation events.
//!
//! This module contains message types for logging events related to:
//! * WASM module file loading and validation
//! * Binary encoding detection
//! * Kernel invocation lifecycle

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// WASM module loaded successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use wasm_promql::observability::messages::wasm::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     module_path: "wasm/lib/neg_half.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded WASM module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// WASM module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use wasm_promql::observability::messages::wasm::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     module_path: "wasm/lib/missing.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load WASM module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// WASM binary encoding detected.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct EncodingDetected<'a> {
    pub module_path: &'a str,
    pub encoding: &'a str,
}

impl Display for EncodingDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Detected {} encoding for module: {}",
            self.encoding, self.module_path
        )
    }
}

/// Kernel invocation started.
///
/// # Log Level
/// `debug!` - Per-query detail
///
/// # Example
/// ```
/// use wasm_promql::observability::messages::wasm::InvocationStarted;
///
/// let msg = InvocationStarted {
///     module: "neg_half",
///     input_kind: "vector",
///     element_count: 3,
///     scalar_args: 0,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct InvocationStarted<'a> {
    pub module: &'a str,
    pub input_kind: &'a str,
    pub element_count: usize,
    pub scalar_args: usize,
}

impl Display for InvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invoking kernel '{}' with {} input: elements={}, scalar_args={}",
            self.module, self.input_kind, self.element_count, self.scalar_args
        )
    }
}

/// Kernel invocation completed successfully.
///
/// # Log Level
/// `debug!` - Per-query detail
pub struct InvocationCompleted<'a> {
    pub module: &'a str,
    pub output_samples: usize,
    pub elapsed: Duration,
}

impl Display for InvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Kernel '{}' completed: output_samples={}, elapsed={:?}",
            self.module, self.output_samples, self.elapsed
        )
    }
}

/// Kernel invocation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct InvocationFailed<'a> {
    pub module: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Kernel '{}' failed: {}", self.module, self.error)
    }
}
