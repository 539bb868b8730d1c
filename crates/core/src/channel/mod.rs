//! Bounded-buffer channel to an isolated text-transform module.
//!
//! The caller writes source bytes into a per-call input buffer and signals the
//! logical length; the module fills a per-call output buffer and reports how
//! many bytes it wrote, or fails. Everything above this module works on text.

/// Fixed-capacity input/output buffers and zero-terminated decoding.
pub mod buffer;
/// Markdown module backed by markdown-rs.
pub mod markdown;

use crate::error::TransformError;
use buffer::{InputBuffer, OutputBuffer, decode_terminated};
use std::sync::Mutex;

/// Default capacity for both buffers (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// The isolated side of the channel.
///
/// `input` holds exactly the logical content (possibly empty). The module
/// writes its result into `output` and returns the number of bytes written,
/// failing with `OutputOverflow` when the result does not fit.
pub trait TransformModule: Send {
    /// Runs one transform to completion.
    fn invoke(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError>;
}

impl<F> TransformModule for F
where
    F: FnMut(&[u8], &mut [u8]) -> Result<usize, TransformError> + Send,
{
    fn invoke(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        (self)(input, output)
    }
}

/// Capacities of the per-call buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferCapacities {
    /// Input buffer size in bytes.
    pub input: usize,
    /// Output buffer size in bytes.
    pub output: usize,
}

impl Default for BufferCapacities {
    fn default() -> Self {
        Self {
            input: DEFAULT_BUFFER_CAPACITY,
            output: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Serializes calls into a single module instance through bounded buffers.
pub struct TransformChannel {
    module: Mutex<Box<dyn TransformModule>>,
    capacities: BufferCapacities,
}

impl TransformChannel {
    /// Wraps `module` behind buffers of the given capacities.
    pub fn new(module: impl TransformModule + 'static, capacities: BufferCapacities) -> Self {
        Self {
            module: Mutex::new(Box::new(module)),
            capacities,
        }
    }

    /// Buffer capacities used for each call.
    pub fn capacities(&self) -> BufferCapacities {
        self.capacities
    }

    /// Transforms `source` into a fragment.
    ///
    /// Blocks until the module completes. A failed call is returned as is and
    /// never retried.
    pub fn transform(&self, source: &str) -> Result<String, TransformError> {
        let mut input = InputBuffer::with_capacity(self.capacities.input);
        input.write(source.as_bytes())?;
        let mut output = OutputBuffer::with_capacity(self.capacities.output);

        let written = {
            let mut module = self
                .module
                .lock()
                .map_err(|_| TransformError::module("transform module poisoned by an earlier panic"))?;
            module.invoke(input.as_bytes(), output.as_mut_slice())?
        };

        log::debug!(
            "transform: {} input bytes -> {} output bytes",
            input.len(),
            written
        );

        let bytes = decode_terminated(output.filled(written)?);
        String::from_utf8(bytes.to_vec())
            .map_err(|err| TransformError::module(format!("output is not valid UTF-8: {err}")))
    }
}

impl std::fmt::Debug for TransformChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformChannel")
            .field("capacities", &self.capacities)
            .finish_non_exhaustive()
    }
}
