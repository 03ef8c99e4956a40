// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime backend for kernel modules: file loading, encoding detection,
//! engine construction and the [`GuestKernel`](crate::traits::GuestKernel)
//! implementation.

pub mod detector;
pub mod engine;
pub mod instance;
pub mod loader;

pub use detector::{detect_encoding, WasmEncoding};
pub use engine::create_engine;
pub use instance::WasmKernelInstance;
pub use loader::load_wasm_bytes;
