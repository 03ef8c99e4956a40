// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! Kernels are classic core modules. This module uses wasmparser to tell them
//! apart from Component Model binaries, which the kernel ABI cannot drive, before
//! anything is handed to the compiler.

use crate::errors::{BridgeError, BridgeResult};

use wasmparser::{Encoding, Parser, Payload};

/// Encoding of a WebAssembly binary as seen in its version header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WasmEncoding {
    /// Classic core module (binary version 1, no component section)
    CoreModule,
    /// Component Model component (binary version 2+)
    Component,
    /// Legacy Preview 1 component (version 1 with a "component" custom section)
    LegacyComponent,
}

impl WasmEncoding {
    #[inline]
    pub fn is_core_module(self) -> bool {
        matches!(self, Self::CoreModule)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoreModule => "core module",
            Self::Component => "component",
            Self::LegacyComponent => "legacy component",
        }
    }
}

/// Detects the encoding of a WebAssembly binary.
///
/// # Errors
/// Returns an error if the input is empty, truncated, or otherwise invalid per
/// the WASM spec.
pub fn detect_encoding(bytes: &[u8]) -> BridgeResult<WasmEncoding> {
    let parser = Parser::new(0);
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in parser.parse_all(bytes) {
        match payload? {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding =
        encoding.ok_or_else(|| BridgeError::InvalidBinary("missing version header".to_string()))?;

    Ok(match encoding {
        Encoding::Component => WasmEncoding::Component,
        Encoding::Module if has_component_section => WasmEncoding::LegacyComponent,
        Encoding::Module => WasmEncoding::CoreModule,
    })
}
