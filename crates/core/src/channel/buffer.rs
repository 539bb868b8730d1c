//! Fixed-capacity byte buffers shared with the transform module.
//!
//! A zero byte marks logical end-of-string: decoding never scans past it.

use crate::error::TransformError;

/// Pre-allocated input buffer plus the logical length of its content.
#[derive(Debug)]
pub struct InputBuffer {
    bytes: Box<[u8]>,
    len: usize,
}

impl InputBuffer {
    /// Allocates a zeroed buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Copies `source` in and records its length.
    ///
    /// Fails with `InputOverflow` instead of truncating. An empty source is a
    /// valid zero-length document.
    pub fn write(&mut self, source: &[u8]) -> Result<(), TransformError> {
        if source.len() > self.bytes.len() {
            return Err(TransformError::InputOverflow {
                len: source.len(),
                capacity: self.bytes.len(),
            });
        }
        self.bytes[..source.len()].copy_from_slice(source);
        self.len = source.len();
        Ok(())
    }

    /// The logical content, `len` bytes long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Logical length signalled to the module.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the logical content is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total buffer capacity.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

/// Pre-allocated output buffer the module writes its result into.
#[derive(Debug)]
pub struct OutputBuffer {
    bytes: Box<[u8]>,
}

impl OutputBuffer {
    /// Allocates a zeroed buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Writable view handed to the module.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Total buffer capacity.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The first `written` bytes, as reported by the module on completion.
    pub fn filled(&self, written: usize) -> Result<&[u8], TransformError> {
        self.bytes
            .get(..written)
            .ok_or(TransformError::OutputOverflow {
                needed: written,
                capacity: self.bytes.len(),
            })
    }
}

/// Bytes up to (not including) the first zero byte.
pub fn decode_terminated(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Copies a module result into `output`, returning the written length.
///
/// A result exactly as long as the buffer fits; one byte more fails with
/// `OutputOverflow` and leaves nothing written.
pub fn write_output(output: &mut [u8], result: &[u8]) -> Result<usize, TransformError> {
    if result.len() > output.len() {
        return Err(TransformError::OutputOverflow {
            needed: result.len(),
            capacity: output.len(),
        });
    }
    output[..result.len()].copy_from_slice(result);
    Ok(result.len())
}
