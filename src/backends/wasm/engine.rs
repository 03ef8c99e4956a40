// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime engine configuration for kernel modules
//!
//! One engine is created per catalog load and shared by every module compiled
//! from it. Each module instance still gets its own store.

use crate::config::EngineConfig;
use crate::errors::{BridgeError, BridgeResult};
use wasmtime::{Config, Engine, OptLevel};

/// Creates a Wasmtime engine configured for core-module kernels
///
/// **Sandboxing:**
/// - Component Model, threads, SIMD, multi-memory and memory64 are disabled
///
/// **Execution limits:**
/// - No fuel metering and no epoch interruption: a kernel runs until it
///   returns or traps, and the host never cancels it
///
/// # Arguments
/// * `options` - Engine section of the configuration
pub fn create_engine(options: &EngineConfig) -> BridgeResult<Engine> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(false);
    config.epoch_interruption(false);

    if options.optimize {
        config.cranelift_opt_level(OptLevel::Speed);
    } else {
        config.cranelift_opt_level(OptLevel::None);
    }

    tracing::debug!(optimize = options.optimize, "Creating engine for kernel modules");

    Engine::new(&config).map_err(|e| BridgeError::EngineError(e.to_string()))
}
