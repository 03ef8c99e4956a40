// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM file loading and validation
//!
//! This module handles reading WASM binaries from disk and performing basic
//! size validation. It does not parse or analyze the binary format - that's
//! the responsibility of the detector module.

use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::wasm::{ModuleLoadFailed, ModuleLoaded};
use std::path::Path;

/// Loads WASM bytes from a file and validates the size
///
/// # Arguments
/// * `path` - Path to the WASM file to load
/// * `max_bytes` - Largest accepted file size
///
/// # Returns
/// * `Ok(Vec<u8>)` - The WASM binary bytes
/// * `Err(BridgeError)` - If the file cannot be read or exceeds `max_bytes`
pub fn load_wasm_bytes<P: AsRef<Path>>(path: P, max_bytes: usize) -> BridgeResult<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        let error = BridgeError::IoError(e);
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &path.display().to_string(),
                error: &error,
            }
        );
        error
    })?;

    if bytes.len() > max_bytes {
        let error = BridgeError::load_failure(
            &path.display().to_string(),
            format!(
                "WASM file too large: {} bytes (max: {} bytes)",
                bytes.len(),
                max_bytes
            ),
        );
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &path.display().to_string(),
                error: &error,
            }
        );
        return Err(error);
    }

    tracing::info!(
        "{}",
        ModuleLoaded {
            module_path: &path.display().to_string(),
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}
