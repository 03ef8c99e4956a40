// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test kernels: an in-process recording fake and WAT sources for real modules.

use crate::errors::{BridgeError, BridgeResult};
use crate::traits::GuestKernel;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FAKE_MEMORY_BYTES: usize = 4096;

/// Guest-visible operations observed by a [`RecordingKernel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InputType,
    UserLevelType,
    ScalarArgsCount,
    Resize(i32),
    SetDimensions(i32, i32),
    Length,
    SetScalarArg(i32, f64),
    BufferPtr,
    Write { offset: usize, bytes: usize },
    Read { offset: usize, bytes: usize },
    ApplyStarted,
    ApplyFinished,
}

impl Event {
    /// Negotiation queries happen once at registration and are usually noise in
    /// invocation assertions.
    pub fn is_negotiation(&self) -> bool {
        matches!(
            self,
            Event::InputType | Event::UserLevelType | Event::ScalarArgsCount
        )
    }
}

/// In-place kernel body: `(buffer, cols, scalar_args)`.
pub type ApplyFn = fn(&mut [f64], usize, &[f64]);

/// A guest kernel living entirely in host memory that records every call.
pub struct RecordingKernel {
    input_type: i32,
    element_type: i32,
    scalar_args_count: i32,
    length: i32,
    cols: usize,
    reported_length: Option<i32>,
    buffer_ptr: i32,
    relocation_step: i32,
    scalar_args: Vec<f64>,
    memory: Vec<u8>,
    apply: ApplyFn,
    apply_delay: Option<Duration>,
    trap_on_apply: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

fn identity(_buffer: &mut [f64], _cols: usize, _scalars: &[f64]) {}

impl RecordingKernel {
    fn new(input_type: i32, scalar_args_count: i32) -> Self {
        Self {
            input_type,
            element_type: 10,
            scalar_args_count,
            length: 0,
            cols: 1,
            reported_length: None,
            buffer_ptr: 64,
            relocation_step: 0,
            scalar_args: Vec::new(),
            memory: vec![0; FAKE_MEMORY_BYTES],
            apply: identity,
            apply_delay: None,
            trap_on_apply: false,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn vector() -> Self {
        Self::new(1, 0)
    }

    pub fn matrix(scalar_args_count: i32) -> Self {
        Self::new(2, scalar_args_count)
    }

    pub fn with_input_type(mut self, code: i32) -> Self {
        self.input_type = code;
        self
    }

    pub fn with_element_type(mut self, code: i32) -> Self {
        self.element_type = code;
        self
    }

    pub fn with_scalar_args_count(mut self, count: i32) -> Self {
        self.scalar_args_count = count;
        self
    }

    /// Make `length()` lie.
    pub fn with_reported_length(mut self, length: i32) -> Self {
        self.reported_length = Some(length);
        self
    }

    pub fn with_buffer_ptr(mut self, ptr: i32) -> Self {
        self.buffer_ptr = ptr;
        self
    }

    /// Move the buffer `step` bytes on every sizing call and again when
    /// `apply` writes its results. The old location keeps its stale bytes.
    pub fn with_relocating_buffer(mut self, step: i32) -> Self {
        self.relocation_step = step;
        self
    }

    pub fn with_apply(mut self, apply: ApplyFn) -> Self {
        self.apply = apply;
        self
    }

    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    pub fn trapping(mut self) -> Self {
        self.trap_on_apply = true;
        self
    }

    /// Shared handle to the event log, usable after the kernel is boxed away.
    pub fn event_log(&self) -> Arc<Mutex<Vec<Event>>> {
        Arc::clone(&self.events)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Events of a shared log with negotiation queries filtered out.
pub fn invocation_events(log: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| !e.is_negotiation())
        .cloned()
        .collect()
}

impl GuestKernel for RecordingKernel {
    fn input_type(&mut self) -> BridgeResult<i32> {
        self.record(Event::InputType);
        Ok(self.input_type)
    }

    fn user_level_type(&mut self) -> BridgeResult<i32> {
        self.record(Event::UserLevelType);
        Ok(self.element_type)
    }

    fn scalar_args_count(&mut self) -> BridgeResult<i32> {
        self.record(Event::ScalarArgsCount);
        Ok(self.scalar_args_count)
    }

    fn resize(&mut self, length: i32) -> BridgeResult<()> {
        self.record(Event::Resize(length));
        self.buffer_ptr += self.relocation_step;
        self.length = length;
        self.cols = 1;
        Ok(())
    }

    fn set_dimensions(&mut self, rows: i32, cols: i32) -> BridgeResult<()> {
        self.record(Event::SetDimensions(rows, cols));
        self.buffer_ptr += self.relocation_step;
        self.length = rows * cols;
        self.cols = cols.max(1) as usize;
        self.scalar_args = vec![0.0; self.scalar_args_count.max(0) as usize];
        Ok(())
    }

    fn length(&mut self) -> BridgeResult<i32> {
        self.record(Event::Length);
        Ok(self.reported_length.unwrap_or(self.length))
    }

    fn set_scalar_arg(&mut self, index: i32, value: f64) -> BridgeResult<()> {
        self.record(Event::SetScalarArg(index, value));
        let index = index as usize;
        if self.scalar_args.len() <= index {
            self.scalar_args.resize(index + 1, 0.0);
        }
        self.scalar_args[index] = value;
        Ok(())
    }

    fn buffer_ptr(&mut self) -> BridgeResult<i32> {
        self.record(Event::BufferPtr);
        Ok(self.buffer_ptr)
    }

    fn apply(&mut self) -> BridgeResult<()> {
        self.record(Event::ApplyStarted);
        if let Some(delay) = self.apply_delay {
            std::thread::sleep(delay);
        }
        if self.trap_on_apply {
            return Err(BridgeError::GuestTrap {
                export: "apply".to_string(),
                message: "wasm trap: wasm `unreachable` instruction executed".to_string(),
            });
        }

        let base = self.buffer_ptr as usize;
        let len = self.length.max(0) as usize;
        let mut values: Vec<f64> = (0..len)
            .map(|i| {
                let start = base + i * 8;
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&self.memory[start..start + 8]);
                f64::from_le_bytes(bytes)
            })
            .collect();
        (self.apply)(&mut values, self.cols, &self.scalar_args);

        self.buffer_ptr += self.relocation_step;
        let base = self.buffer_ptr as usize;
        for (i, value) in values.iter().enumerate() {
            let start = base + i * 8;
            self.memory[start..start + 8].copy_from_slice(&value.to_le_bytes());
        }

        self.record(Event::ApplyFinished);
        Ok(())
    }

    fn memory_size(&self) -> usize {
        self.memory.len()
    }

    fn read_memory(&self, offset: usize, buf: &mut [u8]) -> BridgeResult<()> {
        self.record(Event::Read {
            offset,
            bytes: buf.len(),
        });
        let end = offset + buf.len();
        if end > self.memory.len() {
            return Err(BridgeError::OutOfBounds(format!("fake read to {}", end)));
        }
        buf.copy_from_slice(&self.memory[offset..end]);
        Ok(())
    }

    fn write_memory(&mut self, offset: usize, data: &[u8]) -> BridgeResult<()> {
        self.record(Event::Write {
            offset,
            bytes: data.len(),
        });
        let end = offset + data.len();
        if end > self.memory.len() {
            return Err(BridgeError::OutOfBounds(format!("fake write to {}", end)));
        }
        self.memory[offset..end].copy_from_slice(data);
        Ok(())
    }
}

/// Sums each row into its last column.
pub fn row_sum(buffer: &mut [f64], cols: usize, _scalars: &[f64]) {
    for row in buffer.chunks_mut(cols) {
        let sum: f64 = row.iter().sum();
        if let Some(last) = row.last_mut() {
            *last = sum;
        }
    }
}

/// Vector kernel computing `-x / 2` in WAT. Buffer at offset 1024.
pub const NEG_HALF_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $len (mut i32) (i32.const 0))
  (func (export "input_type") (result i32) (i32.const 1))
  (func (export "user_level_type") (result i32) (i32.const 10))
  (func (export "resize") (param $n i32) (global.set $len (local.get $n)))
  (func (export "length") (result i32) (global.get $len))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 1024))
  (func (export "apply") (local $i i32) (local $addr i32)
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (global.get $len)))
        (local.set $addr (i32.add (i32.const 1024) (i32.shl (local.get $i) (i32.const 3))))
        (f64.store (local.get $addr)
          (f64.div (f64.neg (f64.load (local.get $addr))) (f64.const 2)))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next))))
)
"#;

/// Vector kernel whose `apply` is a no-op. Buffer at offset 512.
pub const IDENTITY_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $len (mut i32) (i32.const 0))
  (func (export "input_type") (result i32) (i32.const 1))
  (func (export "user_level_type") (result i32) (i32.const 10))
  (func (export "resize") (param $n i32) (global.set $len (local.get $n)))
  (func (export "length") (result i32) (global.get $len))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 512))
  (func (export "apply"))
)
"#;

/// Matrix kernel writing `row_sum * scale + offset` into each row's last
/// column, where scale/offset are scalar args 0/1 when declared. Scalars live
/// at offset 0, the buffer at offset 2048.
pub fn weighted_row_sum_wat(scalar_args_count: i32) -> String {
    let (scale, offset) = match scalar_args_count {
        0 => ("(f64.const 1)", "(f64.const 0)"),
        1 => ("(f64.load (i32.const 0))", "(f64.const 0)"),
        _ => ("(f64.load (i32.const 0))", "(f64.load (i32.const 8))"),
    };
    format!(
        r#"
(module
  (memory (export "memory") 1)
  (global $rows (mut i32) (i32.const 0))
  (global $cols (mut i32) (i32.const 0))
  (func (export "input_type") (result i32) (i32.const 2))
  (func (export "user_level_type") (result i32) (i32.const 10))
  (func (export "scalar_args_count") (result i32) (i32.const {count}))
  (func (export "set_dimensions") (param $r i32) (param $c i32)
    (global.set $rows (local.get $r))
    (global.set $cols (local.get $c)))
  (func (export "length") (result i32) (i32.mul (global.get $rows) (global.get $cols)))
  (func (export "set_scalar_arg") (param $i i32) (param $v f64)
    (f64.store (i32.shl (local.get $i) (i32.const 3)) (local.get $v)))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 2048))
  (func (export "apply") (local $r i32) (local $c i32) (local $sum f64) (local $addr i32)
    (block $rows_done
      (loop $row
        (br_if $rows_done (i32.ge_u (local.get $r) (global.get $rows)))
        (local.set $sum (f64.const 0))
        (local.set $c (i32.const 0))
        (block $cols_done
          (loop $col
            (br_if $cols_done (i32.ge_u (local.get $c) (global.get $cols)))
            (local.set $addr
              (i32.add (i32.const 2048)
                (i32.shl
                  (i32.add (i32.mul (local.get $r) (global.get $cols)) (local.get $c))
                  (i32.const 3))))
            (local.set $sum (f64.add (local.get $sum) (f64.load (local.get $addr))))
            (local.set $c (i32.add (local.get $c) (i32.const 1)))
            (br $col)))
        (f64.store (local.get $addr)
          (f64.add (f64.mul (local.get $sum) {scale}) {offset}))
        (local.set $r (i32.add (local.get $r) (i32.const 1)))
        (br $row))))
)
"#,
        count = scalar_args_count,
        scale = scale,
        offset = offset,
    )
}

/// Vector kernel declaring an arbitrary element type code.
pub fn element_type_wat(code: i32) -> String {
    format!(
        r#"
(module
  (memory (export "memory") 1)
  (func (export "input_type") (result i32) (i32.const 1))
  (func (export "user_level_type") (result i32) (i32.const {code}))
  (func (export "resize") (param i32))
  (func (export "length") (result i32) (i32.const 0))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 0))
  (func (export "apply"))
)
"#,
        code = code
    )
}

/// Vector kernel that traps in `apply`.
pub const TRAPPING_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $len (mut i32) (i32.const 0))
  (func (export "input_type") (result i32) (i32.const 1))
  (func (export "user_level_type") (result i32) (i32.const 10))
  (func (export "resize") (param $n i32) (global.set $len (local.get $n)))
  (func (export "length") (result i32) (global.get $len))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 0))
  (func (export "apply") unreachable)
)
"#;

/// Vector kernel whose buffer pointer sits at the very end of its only page.
pub const EDGE_POINTER_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $len (mut i32) (i32.const 0))
  (func (export "input_type") (result i32) (i32.const 1))
  (func (export "user_level_type") (result i32) (i32.const 10))
  (func (export "resize") (param $n i32) (global.set $len (local.get $n)))
  (func (export "length") (result i32) (global.get $len))
  (func (export "get_wasm_memory_buffer_ptr") (result i32) (i32.const 65528))
  (func (export "apply"))
)
"#;

/// Compile `wat` and write the binary to `dir/file_name`.
pub fn write_module(dir: &Path, file_name: &str, wat: &str) {
    let bytes = wat::parse_str(wat).unwrap();
    std::fs::write(dir.join(file_name), bytes).unwrap();
}
