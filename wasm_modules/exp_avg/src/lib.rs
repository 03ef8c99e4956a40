// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Exponential moving average over a range vector.
//!
//! Matrix kernel: each row is one series, oldest point first. The smoothed
//! value is written into the row's last column, which is the only slot the
//! host reads back. Scalar argument 0 is the smoothing factor `alpha`.
//!
//! The buffer is a fixed static region; the host must not ask for more than
//! `MAX_LENGTH` elements.

use core::ptr::addr_of_mut;

const MAX_LENGTH: usize = 4096;
const SCALAR_ARGS: usize = 1;

static mut BUFFER: [f64; MAX_LENGTH] = [0.0; MAX_LENGTH];
static mut SCALARS: [f64; SCALAR_ARGS] = [0.5];
static mut ROWS: usize = 0;
static mut COLS: usize = 0;

fn buffer() -> &'static mut [f64; MAX_LENGTH] {
    // Single-threaded guest; the host serializes every call into this instance.
    unsafe { &mut *addr_of_mut!(BUFFER) }
}

#[no_mangle]
pub extern "C" fn input_type() -> i32 {
    2
}

#[no_mangle]
pub extern "C" fn user_level_type() -> i32 {
    10
}

#[no_mangle]
pub extern "C" fn scalar_args_count() -> i32 {
    SCALAR_ARGS as i32
}

#[no_mangle]
pub extern "C" fn set_dimensions(rows: i32, cols: i32) {
    let rows = rows.max(0) as usize;
    let cols = cols.max(0) as usize;
    // An oversized request leaves length() at 0 so the host sees the refusal.
    let (rows, cols) = match rows.checked_mul(cols) {
        Some(len) if len <= MAX_LENGTH => (rows, cols),
        _ => (0, 0),
    };
    unsafe {
        ROWS = rows;
        COLS = cols;
    }
    buffer()[..rows * cols].fill(0.0);
}

#[no_mangle]
pub extern "C" fn length() -> i32 {
    unsafe { (ROWS * COLS) as i32 }
}

#[no_mangle]
pub extern "C" fn set_scalar_arg(index: i32, value: f64) {
    if (0..SCALAR_ARGS as i32).contains(&index) {
        unsafe { (*addr_of_mut!(SCALARS))[index as usize] = value };
    }
}

#[no_mangle]
pub extern "C" fn get_wasm_memory_buffer_ptr() -> i32 {
    buffer().as_ptr() as i32
}

#[no_mangle]
pub extern "C" fn apply() {
    let (rows, cols, alpha) = unsafe { (ROWS, COLS, (*addr_of_mut!(SCALARS))[0]) };
    if cols == 0 {
        return;
    }
    for row in buffer()[..rows * cols].chunks_mut(cols) {
        let mut average = row[0];
        for value in &row[1..] {
            average = alpha * value + (1.0 - alpha) * average;
        }
        row[cols - 1] = average;
    }
}
