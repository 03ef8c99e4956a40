// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability negotiation.
//!
//! Right after instantiation every module is asked, once, what input shape it
//! consumes, which element representation it expects in its buffer and, for
//! matrix kernels, how many scalar side-parameters it needs. The answers are
//! frozen into a [`ModuleDescriptor`] for the lifetime of the catalog.

use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::catalog::{CapabilitiesNegotiated, NegotiationFailed};
use crate::traits::guest::{exports, GuestKernel};
use serde::Serialize;
use std::fmt;

/// Shape of the data a kernel consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Instant vector: one element per sample.
    Vector,
    /// Range vector: a rectangular block of rows, flattened row-major.
    Matrix,
}

impl InputKind {
    /// Decode an `input_type()` answer. 0 and unknown codes are invalid.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Vector),
            2 => Some(Self::Matrix),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Vector => 1,
            Self::Matrix => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Matrix => "matrix",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element representation codes a guest may declare through `user_level_type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            3 => Some(Self::U32),
            4 => Some(Self::U64),
            5 => Some(Self::I8),
            6 => Some(Self::I16),
            7 => Some(Self::I32),
            8 => Some(Self::I64),
            9 => Some(Self::F32),
            10 => Some(Self::F64),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 3,
            Self::U64 => 4,
            Self::I8 => 5,
            Self::I16 => 6,
            Self::I32 => 7,
            Self::I64 => 8,
            Self::F32 => 9,
            Self::F64 => 10,
        }
    }

    /// Width of one element in guest memory, in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Only f64 can be marshaled today.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::F64)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.as_str(), self.code())
    }
}

/// Negotiated, immutable description of a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub input_kind: InputKind,
    pub element_type: ElementType,
    /// Declared scalar side-parameters; always 0 for vector kernels.
    pub scalar_args_count: usize,
}

/// Query a freshly instantiated kernel for its capabilities.
///
/// Calls `input_type`, then `user_level_type`, then (matrix kernels only)
/// `scalar_args_count`. Any missing export or out-of-range answer rejects the
/// module.
pub fn negotiate<K>(module_name: &str, kernel: &mut K) -> BridgeResult<ModuleDescriptor>
where
    K: GuestKernel + ?Sized,
{
    let result = negotiate_inner(module_name, kernel);
    match &result {
        Ok(descriptor) => tracing::info!(
            "{}",
            CapabilitiesNegotiated {
                module: &descriptor.name,
                input_kind: descriptor.input_kind.as_str(),
                element_type: descriptor.element_type.as_str(),
                scalar_args: descriptor.scalar_args_count,
            }
        ),
        Err(error) => tracing::error!(
            "{}",
            NegotiationFailed {
                module: module_name,
                error,
            }
        ),
    }
    result
}

fn negotiate_inner<K>(module_name: &str, kernel: &mut K) -> BridgeResult<ModuleDescriptor>
where
    K: GuestKernel + ?Sized,
{
    let violation = |reason: String| BridgeError::CapabilityViolation {
        module: module_name.to_string(),
        reason,
    };

    let input_code = kernel
        .input_type()
        .map_err(|e| violation(format!("'{}' unavailable: {}", exports::INPUT_TYPE, e)))?;
    let input_kind = InputKind::from_code(input_code).ok_or_else(|| {
        violation(format!(
            "'{}' returned {}; expected 1 (vector) or 2 (matrix)",
            exports::INPUT_TYPE,
            input_code
        ))
    })?;

    let element_code = kernel
        .user_level_type()
        .map_err(|e| violation(format!("'{}' unavailable: {}", exports::USER_LEVEL_TYPE, e)))?;
    let element_type = match ElementType::from_code(element_code) {
        Some(element) if element.is_supported() => element,
        Some(element) => {
            return Err(BridgeError::UnsupportedElementType {
                module: module_name.to_string(),
                element: element.to_string(),
            })
        }
        None => {
            return Err(BridgeError::UnsupportedElementType {
                module: module_name.to_string(),
                element: format!("unknown (code {})", element_code),
            })
        }
    };

    let scalar_args_count = match input_kind {
        InputKind::Vector => 0,
        InputKind::Matrix => {
            let declared = kernel.scalar_args_count().map_err(|e| {
                violation(format!("'{}' unavailable: {}", exports::SCALAR_ARGS_COUNT, e))
            })?;
            usize::try_from(declared).map_err(|_| {
                violation(format!(
                    "'{}' returned negative count {}",
                    exports::SCALAR_ARGS_COUNT,
                    declared
                ))
            })?
        }
    };

    Ok(ModuleDescriptor {
        name: module_name.to_string(),
        input_kind,
        element_type,
        scalar_args_count,
    })
}
