// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `catalog` - Catalog loading and capability negotiation events
//! * `wasm` - Module file loading and kernel invocation events
//!
//! # Usage Pattern
//!
//! ```rust
//! use wasm_promql::observability::messages::catalog::CatalogLoaded;
//!
//! let msg = CatalogLoaded {
//!     directory: "wasm/lib",
//!     module_count: 3,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

pub mod catalog;
pub mod wasm;
