// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host side of the kernel bridge.
//!
//! [`ModuleRegistry`] builds the catalog and negotiates each module's
//! capabilities. [`ExecutionBridge`] runs one invocation, using the memory
//! marshaler to move data through guest memory and the aggregator to shape the
//! result.

pub mod aggregator;
pub mod capabilities;
pub mod executor;
pub mod input;
pub mod memory;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use aggregator::{aggregate_matrix, aggregate_vector};
pub use capabilities::{negotiate, ElementType, InputKind, ModuleDescriptor};
pub use executor::{invoke_blocking, ExecutionBridge};
pub use input::KernelInput;
pub use memory::{GuestMemoryView, MatrixShape};
pub use registry::{InvocationPhase, ModuleHandle, ModuleRegistry};
