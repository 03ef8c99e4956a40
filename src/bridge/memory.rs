// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest buffer sizing, addressing and element encoding.
//!
//! ## Layout
//!
//! The guest owns one contiguous buffer inside its linear memory. Element `i`
//! lives at `base + i * width`, where `width` comes from the module's declared
//! element type. The only accepted type is f64: 8-byte little-endian IEEE-754. Little-endian is what WebAssembly linear memory mandates, so the
//! encoding never depends on the host's byte order.
//!
//! Matrices are flattened row-major: linear index `i` is row `i / cols`,
//! column `i % cols`.
//!
//! ## Addressing
//!
//! `resize` and `set_dimensions` may move the guest buffer, so the base
//! address is fetched again after sizing and never cached across calls. A
//! [`GuestMemoryView`] borrows the kernel mutably, which pins it to the
//! invocation that created it. Every access is validated against both the
//! negotiated element count and the guest's current memory size before any
//! byte moves, so a guest that misreports its own buffer cannot make the host
//! read or write outside it.

use crate::bridge::capabilities::ElementType;
use crate::errors::{BridgeError, BridgeResult};
use crate::promql::Matrix;
use crate::traits::GuestKernel;
use std::ops::Range;

/// Width in bytes of the one supported element type (f64).
pub const ELEMENT_WIDTH: usize = 8;

/// Encode one element for guest memory.
#[inline]
pub fn encode_f64(value: f64) -> [u8; ELEMENT_WIDTH] {
    value.to_le_bytes()
}

/// Decode one element from guest memory.
#[inline]
pub fn decode_f64(bytes: [u8; ELEMENT_WIDTH]) -> f64 {
    f64::from_le_bytes(bytes)
}

/// Dimensions of a rectangular matrix as laid out in the guest buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixShape {
    pub rows: usize,
    pub cols: usize,
}

impl MatrixShape {
    /// Derive and validate the shape of `matrix`.
    ///
    /// `cols` is the total point count divided by the row count; every row
    /// must have exactly that many points. Rows must not be empty: the
    /// reduction convention needs a last column. A matrix with no rows has
    /// no shape and is handled by the caller.
    pub fn of(matrix: &Matrix) -> BridgeResult<Self> {
        let rows = matrix.len();
        if rows == 0 {
            return Err(BridgeError::IrregularMatrix(
                "matrix has no rows".to_string(),
            ));
        }

        let total: usize = matrix.iter().map(|series| series.points.len()).sum();
        let cols = total / rows;
        if rows * cols != total {
            return Err(BridgeError::IrregularMatrix(format!(
                "{} points do not divide evenly into {} rows",
                total, rows
            )));
        }
        if let Some((index, series)) = matrix
            .iter()
            .enumerate()
            .find(|(_, series)| series.points.len() != cols)
        {
            return Err(BridgeError::IrregularMatrix(format!(
                "row {} ({}) has {} points, expected {}",
                index,
                series.metric,
                series.points.len(),
                cols
            )));
        }
        if cols == 0 {
            return Err(BridgeError::IrregularMatrix(
                "rows contain no points".to_string(),
            ));
        }

        Ok(Self { rows, cols })
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn row_of(&self, index: usize) -> usize {
        index / self.cols
    }

    #[inline]
    pub fn col_of(&self, index: usize) -> usize {
        index % self.cols
    }

    #[inline]
    pub fn is_last_column(&self, index: usize) -> bool {
        self.col_of(index) == self.cols - 1
    }
}

fn to_guest_i32(value: usize, what: &str) -> BridgeResult<i32> {
    i32::try_from(value).map_err(|_| {
        BridgeError::Unsupported(format!(
            "{} {} exceeds the guest's i32 addressing",
            what, value
        ))
    })
}

fn confirm_length<K>(kernel: &mut K, requested: usize) -> BridgeResult<usize>
where
    K: GuestKernel + ?Sized,
{
    let reported = kernel.length()?;
    if usize::try_from(reported).ok() != Some(requested) {
        return Err(BridgeError::SizeNegotiationFailed {
            requested,
            reported: i64::from(reported),
        });
    }
    Ok(requested)
}

/// Size a vector kernel's buffer to `n` elements: `resize(n)` then `length()`.
pub fn size_vector<K>(kernel: &mut K, n: usize) -> BridgeResult<usize>
where
    K: GuestKernel + ?Sized,
{
    let length = to_guest_i32(n, "vector length")?;
    kernel.resize(length)?;
    confirm_length(kernel, n)
}

/// Size a matrix kernel's buffer: `set_dimensions(rows, cols)` then `length()`.
pub fn size_matrix<K>(kernel: &mut K, shape: MatrixShape) -> BridgeResult<usize>
where
    K: GuestKernel + ?Sized,
{
    let rows = to_guest_i32(shape.rows, "matrix rows")?;
    let cols = to_guest_i32(shape.cols, "matrix columns")?;
    to_guest_i32(shape.len(), "matrix element count")?;
    kernel.set_dimensions(rows, cols)?;
    confirm_length(kernel, shape.len())
}

/// Bounds-checked window onto the guest buffer for one invocation.
pub struct GuestMemoryView<'k, K: GuestKernel + ?Sized> {
    kernel: &'k mut K,
    base: usize,
    width: usize,
    len: usize,
}

impl<'k, K: GuestKernel + ?Sized> GuestMemoryView<'k, K> {
    /// Fetch the current buffer address and open a view of `len` elements of
    /// type `element`.
    ///
    /// # Errors
    /// [`BridgeError::Unsupported`] for element types the host cannot encode,
    /// [`BridgeError::OutOfBounds`] if the range does not fit guest memory.
    pub fn resolve(kernel: &'k mut K, element: ElementType, len: usize) -> BridgeResult<Self> {
        if !element.is_supported() {
            return Err(BridgeError::Unsupported(format!(
                "{} buffer elements",
                element.as_str()
            )));
        }
        let ptr = kernel.buffer_ptr()?;
        let base = usize::try_from(ptr).map_err(|_| {
            BridgeError::OutOfBounds(format!("guest reported negative buffer pointer {}", ptr))
        })?;
        let view = Self {
            kernel,
            base,
            width: element.width(),
            len,
        };
        view.byte_range(0, len)?;
        Ok(view)
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte range of `count` elements starting at element `start`.
    fn byte_range(&self, start: usize, count: usize) -> BridgeResult<Range<usize>> {
        let end_index = start
            .checked_add(count)
            .filter(|end| *end <= self.len)
            .ok_or_else(|| {
                BridgeError::OutOfBounds(format!(
                    "elements {}..{} outside buffer of {} elements",
                    start,
                    start.saturating_add(count),
                    self.len
                ))
            })?;

        let overflow =
            || BridgeError::OutOfBounds("buffer address overflows host usize".to_string());
        let from = start
            .checked_mul(self.width)
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(overflow)?;
        let to = end_index
            .checked_mul(self.width)
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(overflow)?;

        let memory_size = self.kernel.memory_size();
        if to > memory_size {
            return Err(BridgeError::OutOfBounds(format!(
                "bytes {}..{} outside guest memory of {} bytes",
                from, to, memory_size
            )));
        }
        Ok(from..to)
    }

    pub fn read_element(&self, index: usize) -> BridgeResult<f64> {
        let range = self.byte_range(index, 1)?;
        let mut bytes = [0u8; ELEMENT_WIDTH];
        self.kernel.read_memory(range.start, &mut bytes)?;
        Ok(decode_f64(bytes))
    }

    pub fn write_element(&mut self, index: usize, value: f64) -> BridgeResult<()> {
        let range = self.byte_range(index, 1)?;
        self.kernel.write_memory(range.start, &encode_f64(value))
    }

    /// Encode every value element-wise and transfer them as one contiguous block.
    ///
    /// `values` must fill the view exactly.
    pub fn write_all(&mut self, values: &[f64]) -> BridgeResult<()> {
        if values.len() != self.len {
            return Err(BridgeError::OutOfBounds(format!(
                "{} values for a buffer of {} elements",
                values.len(),
                self.len
            )));
        }
        let range = self.byte_range(0, self.len)?;
        let mut bytes = Vec::with_capacity(range.len());
        for value in values {
            bytes.extend_from_slice(&encode_f64(*value));
        }
        self.kernel.write_memory(range.start, &bytes)
    }

    /// Decode the whole buffer.
    pub fn read_all(&self) -> BridgeResult<Vec<f64>> {
        let range = self.byte_range(0, self.len)?;
        let mut bytes = vec![0u8; range.len()];
        self.kernel.read_memory(range.start, &mut bytes)?;
        Ok(bytes
            .chunks_exact(self.width)
            .map(|chunk| {
                let mut element = [0u8; ELEMENT_WIDTH];
                element.copy_from_slice(chunk);
                decode_f64(element)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_support::{Event, RecordingKernel};
    use crate::promql::{Labels, Point, Series};

    fn series(points: &[f64]) -> Series {
        Series::new(
            Labels::new(),
            points
                .iter()
                .enumerate()
                .map(|(t, v)| Point::new(t as i64, *v))
                .collect(),
        )
    }

    #[test]
    fn test_encoding_is_little_endian_ieee754() {
        assert_eq!(encode_f64(1.0), [0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
        assert_eq!(encode_f64(-2.0), [0, 0, 0, 0, 0, 0, 0x00, 0xc0]);
        for value in [0.0, -0.0, 3.5, f64::MAX, f64::MIN_POSITIVE, f64::INFINITY] {
            assert_eq!(encode_f64(value), value.to_bits().to_le_bytes());
            assert_eq!(decode_f64(encode_f64(value)).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_nan_payload_survives_encoding() {
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        assert_eq!(decode_f64(encode_f64(nan)).to_bits(), nan.to_bits());
    }

    #[test]
    fn test_matrix_shape_rectangular() {
        let matrix = vec![series(&[1.0, 2.0, 3.0]), series(&[4.0, 5.0, 6.0])];
        let shape = MatrixShape::of(&matrix).unwrap();
        assert_eq!(shape, MatrixShape { rows: 2, cols: 3 });
        assert_eq!(shape.len(), 6);
        assert_eq!(shape.row_of(4), 1);
        assert_eq!(shape.col_of(4), 1);
        assert!(shape.is_last_column(2));
        assert!(shape.is_last_column(5));
        assert!(!shape.is_last_column(3));
    }

    #[test]
    fn test_matrix_shape_uneven_total() {
        let matrix = vec![series(&[1.0, 2.0]), series(&[3.0])];
        assert!(matches!(
            MatrixShape::of(&matrix),
            Err(BridgeError::IrregularMatrix(_))
        ));
    }

    #[test]
    fn test_matrix_shape_even_total_but_ragged() {
        let matrix = vec![series(&[1.0, 2.0, 3.0]), series(&[4.0])];
        match MatrixShape::of(&matrix) {
            Err(BridgeError::IrregularMatrix(msg)) => assert!(msg.contains("row 0")),
            other => panic!("Expected IrregularMatrix, got {:?}", other),
        }
    }

    #[test]
    fn test_matrix_shape_empty_rows() {
        let matrix = vec![series(&[]), series(&[])];
        assert!(matches!(
            MatrixShape::of(&matrix),
            Err(BridgeError::IrregularMatrix(_))
        ));
        assert!(MatrixShape::of(&Vec::new()).is_err());
    }

    #[test]
    fn test_size_vector_calls_resize_then_length() {
        let mut kernel = RecordingKernel::vector();
        assert_eq!(size_vector(&mut kernel, 5).unwrap(), 5);
        assert_eq!(kernel.events(), vec![Event::Resize(5), Event::Length]);
    }

    #[test]
    fn test_size_vector_rejects_misreported_length() {
        let mut kernel = RecordingKernel::vector().with_reported_length(3);
        match size_vector(&mut kernel, 5) {
            Err(BridgeError::SizeNegotiationFailed {
                requested,
                reported,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(reported, 3);
            }
            other => panic!("Expected SizeNegotiationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_size_matrix_reports_product() {
        for (rows, cols) in [(1, 1), (2, 3), (7, 4)] {
            let mut kernel = RecordingKernel::matrix(0);
            let shape = MatrixShape { rows, cols };
            assert_eq!(size_matrix(&mut kernel, shape).unwrap(), rows * cols);
            assert_eq!(
                kernel.events(),
                vec![
                    Event::SetDimensions(rows as i32, cols as i32),
                    Event::Length
                ]
            );
        }
    }

    #[test]
    fn test_size_vector_rejects_length_beyond_i32() {
        let mut kernel = RecordingKernel::vector();
        let result = size_vector(&mut kernel, i32::MAX as usize + 1);
        assert!(matches!(result, Err(BridgeError::Unsupported(_))));
        assert!(kernel.events().is_empty());
    }

    #[test]
    fn test_round_trip_without_apply_is_bit_exact() {
        for n in [0usize, 1, 3, 64] {
            let mut kernel = RecordingKernel::vector();
            size_vector(&mut kernel, n).unwrap();
            let values: Vec<f64> = (0..n).map(|i| (i as f64) * -1.25 + 0.1).collect();

            let mut view = GuestMemoryView::resolve(&mut kernel, ElementType::F64, n).unwrap();
            view.write_all(&values).unwrap();
            let read_back = view.read_all().unwrap();

            let expected: Vec<u64> = values.iter().map(|v| v.to_bits()).collect();
            let actual: Vec<u64> = read_back.iter().map(|v| v.to_bits()).collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_element_access_is_bounds_checked() {
        let mut kernel = RecordingKernel::vector();
        size_vector(&mut kernel, 2).unwrap();
        let mut view = GuestMemoryView::resolve(&mut kernel, ElementType::F64, 2).unwrap();

        view.write_element(1, 42.0).unwrap();
        assert_eq!(view.read_element(1).unwrap(), 42.0);
        assert!(matches!(
            view.write_element(2, 1.0),
            Err(BridgeError::OutOfBounds(_))
        ));
        assert!(matches!(
            view.read_element(usize::MAX),
            Err(BridgeError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_element_address_uses_base_and_width() {
        let mut kernel = RecordingKernel::vector().with_buffer_ptr(128);
        let log = kernel.event_log();
        let mut view = GuestMemoryView::resolve(&mut kernel, ElementType::F64, 4).unwrap();
        assert_eq!(view.base(), 128);
        view.write_element(3, 7.0).unwrap();
        assert_eq!(
            log.lock().unwrap().last(),
            Some(&Event::Write {
                offset: 128 + 3 * ELEMENT_WIDTH,
                bytes: ELEMENT_WIDTH
            })
        );
    }

    #[test]
    fn test_view_outside_guest_memory_is_rejected() {
        let mut kernel = RecordingKernel::vector().with_buffer_ptr(4096 - 8);
        assert!(GuestMemoryView::resolve(&mut kernel, ElementType::F64, 1).is_ok());

        let mut kernel = RecordingKernel::vector().with_buffer_ptr(4096 - 8);
        assert!(matches!(
            GuestMemoryView::resolve(&mut kernel, ElementType::F64, 2),
            Err(BridgeError::OutOfBounds(_))
        ));

        let mut kernel = RecordingKernel::vector().with_buffer_ptr(-8);
        assert!(matches!(
            GuestMemoryView::resolve(&mut kernel, ElementType::F64, 1),
            Err(BridgeError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_view_rejects_non_float_elements() {
        for element in [ElementType::F32, ElementType::I64, ElementType::U8] {
            let mut kernel = RecordingKernel::vector();
            let log = kernel.event_log();
            match GuestMemoryView::resolve(&mut kernel, element, 1) {
                Err(BridgeError::Unsupported(what)) => assert!(what.contains(element.as_str())),
                Err(other) => panic!("Expected Unsupported, got {:?}", other),
                Ok(_) => panic!("Expected Unsupported for {}", element.as_str()),
            }
            assert!(log.lock().unwrap().is_empty());
        }
    }

    #[test]
    fn test_write_all_requires_exact_length() {
        let mut kernel = RecordingKernel::vector();
        let mut view = GuestMemoryView::resolve(&mut kernel, ElementType::F64, 3).unwrap();
        assert!(view.write_all(&[1.0, 2.0]).is_err());
    }
}
