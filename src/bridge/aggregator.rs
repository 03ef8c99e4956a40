// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shapes a harvested guest buffer into output samples.
//!
//! Vector kernels map element-for-element. Matrix kernels reduce each row into
//! its last column; that slot is the only one read back per row.

use crate::bridge::memory::MatrixShape;
use crate::errors::{BridgeError, BridgeResult};
use crate::promql::{Matrix, Point, Sample, Vector};

/// One output sample per input sample, valued from its buffer element.
///
/// Labels and timestamps pass through unchanged.
pub fn aggregate_vector(input: &Vector, buffer: &[f64]) -> BridgeResult<Vector> {
    if buffer.len() != input.len() {
        return Err(BridgeError::SizeNegotiationFailed {
            requested: input.len(),
            reported: buffer.len() as i64,
        });
    }
    Ok(input
        .iter()
        .zip(buffer)
        .map(|(sample, value)| Sample {
            metric: sample.metric.clone(),
            point: Point::new(sample.point.timestamp, *value),
        })
        .collect())
}

/// Emit one sample per row from the row's last column.
///
/// Each output sample carries its row's labels and the timestamp of the row's
/// last point. Output order is row order.
pub fn aggregate_matrix(
    input: &Matrix,
    shape: MatrixShape,
    buffer: &[f64],
) -> BridgeResult<Vector> {
    if buffer.len() != shape.len() || input.len() != shape.rows {
        return Err(BridgeError::SizeNegotiationFailed {
            requested: shape.len(),
            reported: buffer.len() as i64,
        });
    }

    let mut output = Vector::with_capacity(shape.rows);
    for (index, value) in buffer.iter().enumerate() {
        if !shape.is_last_column(index) {
            continue;
        }
        let series = &input[shape.row_of(index)];
        let timestamp = series
            .points
            .last()
            .map(|point| point.timestamp)
            .ok_or_else(|| BridgeError::IrregularMatrix("row without points".to_string()))?;
        output.push(Sample {
            metric: series.metric.clone(),
            point: Point::new(timestamp, *value),
        });
    }
    Ok(output)
}
