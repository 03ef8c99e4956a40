// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime-backed guest kernel.
//!
//! Each [`WasmKernelInstance`] owns its own `Store`, so two instances never
//! share mutable engine state and can run on different threads at the same
//! time. Exports are resolved by name on every call: the kernel ABI is small
//! and lookups are cheap next to the marshaling work around them.

use crate::errors::{BridgeError, BridgeResult};
use crate::traits::guest::{exports, GuestKernel};
use wasmtime::{Engine, Instance, Memory, Module, Store, WasmParams, WasmResults};

pub struct WasmKernelInstance {
    store: Store<()>,
    instance: Instance,
    memory: Memory,
}

impl WasmKernelInstance {
    /// Compile `bytes` and instantiate the result without imports.
    pub fn from_bytes(engine: &Engine, bytes: &[u8], module_name: &str) -> BridgeResult<Self> {
        let module =
            Module::new(engine, bytes).map_err(|e| BridgeError::load_failure(module_name, e))?;
        Self::instantiate(engine, &module, module_name)
    }

    /// Instantiate an already compiled module in a fresh store.
    pub fn instantiate(engine: &Engine, module: &Module, module_name: &str) -> BridgeResult<Self> {
        let mut store = Store::new(engine, ());

        let instance = Instance::new(&mut store, module, &[])
            .map_err(|e| BridgeError::load_failure(module_name, format!("{:#}", e)))?;

        let memory = instance
            .get_memory(&mut store, exports::MEMORY)
            .ok_or_else(|| {
                BridgeError::load_failure(
                    module_name,
                    format!("WASM module must export '{}'", exports::MEMORY),
                )
            })?;

        Ok(Self {
            store,
            instance,
            memory,
        })
    }

    fn call<Params, Results>(
        &mut self,
        name: &'static str,
        signature: &'static str,
        params: Params,
    ) -> BridgeResult<Results>
    where
        Params: WasmParams,
        Results: WasmResults,
    {
        let func = self
            .instance
            .get_typed_func::<Params, Results>(&mut self.store, name)
            .map_err(|_| BridgeError::MissingExport {
                name: name.to_string(),
                signature,
            })?;

        func.call(&mut self.store, params)
            .map_err(|e| BridgeError::GuestTrap {
                export: name.to_string(),
                message: format!("{:#}", e),
            })
    }
}

impl GuestKernel for WasmKernelInstance {
    fn input_type(&mut self) -> BridgeResult<i32> {
        self.call(exports::INPUT_TYPE, "() -> i32", ())
    }

    fn user_level_type(&mut self) -> BridgeResult<i32> {
        self.call(exports::USER_LEVEL_TYPE, "() -> i32", ())
    }

    fn scalar_args_count(&mut self) -> BridgeResult<i32> {
        self.call(exports::SCALAR_ARGS_COUNT, "() -> i32", ())
    }

    fn resize(&mut self, length: i32) -> BridgeResult<()> {
        self.call(exports::RESIZE, "(i32) -> ()", length)
    }

    fn set_dimensions(&mut self, rows: i32, cols: i32) -> BridgeResult<()> {
        self.call(exports::SET_DIMENSIONS, "(i32, i32) -> ()", (rows, cols))
    }

    fn length(&mut self) -> BridgeResult<i32> {
        self.call(exports::LENGTH, "() -> i32", ())
    }

    fn set_scalar_arg(&mut self, index: i32, value: f64) -> BridgeResult<()> {
        self.call(exports::SET_SCALAR_ARG, "(i32, f64) -> ()", (index, value))
    }

    fn buffer_ptr(&mut self) -> BridgeResult<i32> {
        self.call(exports::BUFFER_PTR, "() -> i32", ())
    }

    fn apply(&mut self) -> BridgeResult<()> {
        self.call(exports::APPLY, "() -> ()", ())
    }

    fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    fn read_memory(&self, offset: usize, buf: &mut [u8]) -> BridgeResult<()> {
        self.memory.read(&self.store, offset, buf).map_err(|e| {
            BridgeError::OutOfBounds(format!(
                "Failed to read {} bytes at offset {}: {}",
                buf.len(),
                offset,
                e
            ))
        })
    }

    fn write_memory(&mut self, offset: usize, data: &[u8]) -> BridgeResult<()> {
        self.memory.write(&mut self.store, offset, data).map_err(|e| {
            BridgeError::OutOfBounds(format!(
                "Failed to write {} bytes at offset {}: {}",
                data.len(),
                offset,
                e
            ))
        })
    }
}
