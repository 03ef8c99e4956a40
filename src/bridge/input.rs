// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::bridge::InputKind;
use crate::errors::{BridgeError, BridgeResult};
use crate::promql::{Matrix, Vector};

/// Data handed to a kernel: exactly one of an instant vector or a range vector.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelInput {
    Vector(Vector),
    Matrix(Matrix),
}

impl KernelInput {
    /// Build an input from two optional parts, as an evaluator holding
    /// separately nullable arguments would supply them.
    ///
    /// # Errors
    /// [`BridgeError::AmbiguousInput`] when both or neither part is present.
    pub fn from_parts(vector: Option<Vector>, matrix: Option<Matrix>) -> BridgeResult<Self> {
        match (vector, matrix) {
            (Some(vector), None) => Ok(Self::Vector(vector)),
            (None, Some(matrix)) => Ok(Self::Matrix(matrix)),
            _ => Err(BridgeError::AmbiguousInput),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Vector(_) => InputKind::Vector,
            Self::Matrix(_) => InputKind::Matrix,
        }
    }

    /// Number of float elements this input occupies in the guest buffer.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Vector(vector) => vector.len(),
            Self::Matrix(matrix) => matrix.iter().map(|series| series.points.len()).sum(),
        }
    }

    /// Reject histogram samples, which have no f64 element representation.
    pub fn ensure_float_samples(&self) -> BridgeResult<()> {
        let has_histogram = match self {
            Self::Vector(vector) => vector.iter().any(|sample| sample.point.is_histogram()),
            Self::Matrix(matrix) => matrix
                .iter()
                .any(|series| series.points.iter().any(|point| point.is_histogram())),
        };
        if has_histogram {
            return Err(BridgeError::Unsupported("Histogram".to_string()));
        }
        Ok(())
    }

    /// Element values in guest buffer order; matrices are flattened row-major.
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Vector(vector) => vector.iter().map(|sample| sample.point.value).collect(),
            Self::Matrix(matrix) => matrix
                .iter()
                .flat_map(|series| series.points.iter().map(|point| point.value))
                .collect(),
        }
    }
}
