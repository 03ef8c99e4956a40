// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for catalog construction.
//!
//! This module contains message types for logging events related to:
//! * Scanning the module directory
//! * Capability negotiation with each module
//! * Catalog completion

use std::fmt::{Display, Formatter};

/// Catalog loading started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CatalogLoadStarted<'a> {
    pub directory: &'a str,
}

impl Display for CatalogLoadStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loading kernel modules from '{}'", self.directory)
    }
}

/// Capabilities negotiated for one module.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use wasm_promql::observability::messages::catalog::CapabilitiesNegotiated;
///
/// let msg = CapabilitiesNegotiated {
///     module: "exp_avg",
///     input_kind: "matrix",
///     element_type: "f64",
///     scalar_args: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CapabilitiesNegotiated<'a> {
    pub module: &'a str,
    pub input_kind: &'a str,
    pub element_type: &'a str,
    pub scalar_args: usize,
}

impl Display for CapabilitiesNegotiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' uses {} input of {} elements with {} scalar argument(s)",
            self.module, self.input_kind, self.element_type, self.scalar_args
        )
    }
}

/// Capability negotiation rejected a module.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NegotiationFailed<'a> {
    pub module: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NegotiationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Capability negotiation failed for module '{}': {}",
            self.module, self.error
        )
    }
}

/// Catalog loaded.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CatalogLoaded<'a> {
    pub directory: &'a str,
    pub module_count: usize,
}

impl Display for CatalogLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Kernel catalog loaded from '{}': {} module(s)",
            self.directory, self.module_count
        )
    }
}
