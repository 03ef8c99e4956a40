// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution bridge: drives one kernel invocation end to end.
//!
//! ## Protocol
//!
//! 1. Contract checks against the descriptor: input kind, scalar argument
//!    count, matrix shape, histogram payloads. These never touch the guest.
//! 2. Exclusive lock on the module's instance.
//! 3. Size the guest buffer (`resize` / `set_dimensions`, confirmed by `length`).
//! 4. Matrix kernels: `set_scalar_arg(i, v)` for each declared scalar, in order.
//! 5. Resolve the buffer address and write every element.
//! 6. `apply()`.
//! 7. Resolve the buffer address again and read every element back.
//! 8. Aggregate, return the instance to `Loaded`, release the lock.
//!
//! The instance goes back to `Loaded` on every exit path once the lock is held.

use crate::bridge::aggregator::{aggregate_matrix, aggregate_vector};
use crate::bridge::capabilities::ModuleDescriptor;
use crate::bridge::input::KernelInput;
use crate::bridge::memory::{size_matrix, size_vector, GuestMemoryView, MatrixShape};
use crate::bridge::registry::{InvocationPhase, KernelSlot, ModuleHandle, ModuleRegistry};
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::wasm::{
    InvocationCompleted, InvocationFailed, InvocationStarted,
};
use crate::promql::{Matrix, Vector};
use std::sync::Arc;
use std::time::Instant;

/// A validated invocation, borrowed from the caller's input.
enum Plan<'a> {
    Vector(&'a Vector),
    Matrix {
        matrix: &'a Matrix,
        shape: MatrixShape,
        scalar_args: &'a [f64],
    },
}

/// Invokes catalog modules on query-language data.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionBridge<'r> {
    registry: &'r ModuleRegistry,
}

impl<'r> ExecutionBridge<'r> {
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Run `module_name` over `input`.
    ///
    /// Vector kernels return one sample per input sample. Matrix kernels return
    /// one sample per row, read from the row's last column. Scalars beyond the
    /// module's declared count are ignored.
    ///
    /// Blocks the calling thread for as long as the guest runs and while
    /// another invocation of the same module holds its lock.
    pub fn invoke(
        &self,
        module_name: &str,
        input: KernelInput,
        scalar_args: &[f64],
    ) -> BridgeResult<Vector> {
        let started = Instant::now();
        tracing::debug!(
            "{}",
            InvocationStarted {
                module: module_name,
                input_kind: input.kind().as_str(),
                element_count: input.element_count(),
                scalar_args: scalar_args.len(),
            }
        );

        let result = self
            .registry
            .lookup(module_name)
            .and_then(|handle| run(handle, input, scalar_args));

        match &result {
            Ok(output) => tracing::debug!(
                "{}",
                InvocationCompleted {
                    module: module_name,
                    output_samples: output.len(),
                    elapsed: started.elapsed(),
                }
            ),
            Err(error) => tracing::error!(
                "{}",
                InvocationFailed {
                    module: module_name,
                    error,
                }
            ),
        }
        result
    }
}

fn run(handle: &ModuleHandle, input: KernelInput, scalar_args: &[f64]) -> BridgeResult<Vector> {
    let descriptor = handle.descriptor();
    let supplied = input.kind();
    if supplied != descriptor.input_kind {
        return Err(BridgeError::KindMismatch {
            module: descriptor.name.clone(),
            expected: descriptor.input_kind,
            supplied,
        });
    }

    let plan = match &input {
        KernelInput::Vector(vector) => Plan::Vector(vector),
        KernelInput::Matrix(matrix) => {
            let required = descriptor.scalar_args_count;
            if scalar_args.len() < required {
                return Err(BridgeError::InsufficientScalarArgs {
                    module: descriptor.name.clone(),
                    required,
                    supplied: scalar_args.len(),
                });
            }
            if matrix.is_empty() {
                return Ok(Vector::new());
            }
            Plan::Matrix {
                matrix,
                shape: MatrixShape::of(matrix)?,
                scalar_args: &scalar_args[..required],
            }
        }
    };
    input.ensure_float_samples()?;
    let values = input.values();

    let mut slot = handle.lock()?;
    let buffer = drive(&mut slot, descriptor, &plan, &values)?;
    match plan {
        Plan::Vector(vector) => aggregate_vector(vector, &buffer),
        Plan::Matrix { matrix, shape, .. } => aggregate_matrix(matrix, shape, &buffer),
    }
}

/// Steps 3 to 7 on a locked slot; the slot ends in `Loaded` either way.
fn drive(
    slot: &mut KernelSlot,
    descriptor: &ModuleDescriptor,
    plan: &Plan<'_>,
    values: &[f64],
) -> BridgeResult<Vec<f64>> {
    let result = drive_phases(slot, descriptor, plan, values);
    slot.advance(&descriptor.name, InvocationPhase::Loaded);
    result
}

fn drive_phases(
    slot: &mut KernelSlot,
    descriptor: &ModuleDescriptor,
    plan: &Plan<'_>,
    values: &[f64],
) -> BridgeResult<Vec<f64>> {
    let module = descriptor.name.as_str();
    let element = descriptor.element_type;

    let (len, scalar_args) = match plan {
        Plan::Vector(vector) => (size_vector(slot.kernel.as_mut(), vector.len())?, &[][..]),
        Plan::Matrix {
            shape, scalar_args, ..
        } => (size_matrix(slot.kernel.as_mut(), *shape)?, *scalar_args),
    };
    slot.advance(module, InvocationPhase::Sized);

    for (index, value) in (0i32..).zip(scalar_args) {
        slot.kernel.set_scalar_arg(index, *value)?;
    }

    GuestMemoryView::resolve(slot.kernel.as_mut(), element, len)?.write_all(values)?;
    slot.advance(module, InvocationPhase::Populated);

    slot.kernel.apply()?;
    slot.advance(module, InvocationPhase::Applied);

    let buffer = GuestMemoryView::resolve(slot.kernel.as_mut(), element, len)?.read_all()?;
    slot.advance(module, InvocationPhase::Harvested);
    Ok(buffer)
}

/// Run an invocation on tokio's blocking pool.
///
/// A kernel runs to completion once started; this only keeps the async
/// caller's reactor free while it does.
pub async fn invoke_blocking(
    registry: Arc<ModuleRegistry>,
    module_name: String,
    input: KernelInput,
    scalar_args: Vec<f64>,
) -> BridgeResult<Vector> {
    tokio::task::spawn_blocking(move || {
        ExecutionBridge::new(&registry).invoke(&module_name, input, &scalar_args)
    })
    .await
    .map_err(|e| BridgeError::TaskJoin(e.to_string()))?
}
