// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // wasmtime guest backend
pub mod bridge;     // registry, negotiation, marshaling, execution
pub mod config;     // YAML configuration
pub mod errors;     // error handling
pub mod observability;
pub mod promql;     // query-language sample types
pub mod traits;     // guest kernel abstraction
