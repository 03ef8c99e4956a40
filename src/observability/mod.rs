// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! This module provides centralized message types for diagnostic and operational
//! logging throughout the kernel bridge. Message types follow a struct-based pattern
//! with a `Display` implementation so that log text lives in one place instead of
//! being scattered as format strings across the codebase.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::catalog` - Module catalog construction and capability negotiation
//! * `messages::wasm` - Module file loading and kernel invocation events
//!
//! # Usage
//!
//! ```rust
//! use wasm_promql::observability::messages::wasm::InvocationFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = InvocationFailed {
//!     module: "neg_half",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
