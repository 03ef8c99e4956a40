// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest kernel capability consumed by the bridge.
//!
//! The bridge never talks to the bytecode engine directly. It drives a guest
//! through this trait, which mirrors the kernel ABI one export per method plus
//! raw access to the guest's linear memory. The wasmtime-backed implementation
//! lives in `backends::wasm::instance`.

use crate::errors::BridgeResult;

/// Names of the exports every kernel module provides.
pub mod exports {
    pub const INPUT_TYPE: &str = "input_type";
    pub const USER_LEVEL_TYPE: &str = "user_level_type";
    pub const SCALAR_ARGS_COUNT: &str = "scalar_args_count";
    pub const RESIZE: &str = "resize";
    pub const SET_DIMENSIONS: &str = "set_dimensions";
    pub const LENGTH: &str = "length";
    pub const SET_SCALAR_ARG: &str = "set_scalar_arg";
    pub const BUFFER_PTR: &str = "get_wasm_memory_buffer_ptr";
    pub const APPLY: &str = "apply";
    pub const MEMORY: &str = "memory";
}

/// An instantiated guest kernel.
///
/// Implementations own the guest's state (its store and linear memory).
/// Methods take `&mut self` wherever the guest may mutate that state, so a
/// single owner, or a lock around the owner, serializes all access.
pub trait GuestKernel: Send {
    /// `input_type() -> i32`: 1 = vector, 2 = matrix.
    fn input_type(&mut self) -> BridgeResult<i32>;

    /// `user_level_type() -> i32`: element representation code.
    fn user_level_type(&mut self) -> BridgeResult<i32>;

    /// `scalar_args_count() -> i32`: matrix kernels only.
    fn scalar_args_count(&mut self) -> BridgeResult<i32>;

    /// `resize(i32)`: vector kernels only.
    fn resize(&mut self, length: i32) -> BridgeResult<()>;

    /// `set_dimensions(i32, i32)`: matrix kernels only.
    fn set_dimensions(&mut self, rows: i32, cols: i32) -> BridgeResult<()>;

    /// `length() -> i32`: current buffer length in elements.
    fn length(&mut self) -> BridgeResult<i32>;

    /// `set_scalar_arg(i32, f64)`: matrix kernels only.
    fn set_scalar_arg(&mut self, index: i32, value: f64) -> BridgeResult<()>;

    /// `get_wasm_memory_buffer_ptr() -> i32`: byte offset of the buffer.
    fn buffer_ptr(&mut self) -> BridgeResult<i32>;

    /// `apply()`: run the kernel over the populated buffer.
    fn apply(&mut self) -> BridgeResult<()>;

    /// Current size of the exported linear memory in bytes.
    fn memory_size(&self) -> usize;

    /// Copy `buf.len()` bytes out of linear memory starting at `offset`.
    fn read_memory(&self, offset: usize, buf: &mut [u8]) -> BridgeResult<()>;

    /// Copy `data` into linear memory starting at `offset`.
    fn write_memory(&mut self, offset: usize, data: &[u8]) -> BridgeResult<()>;
}
