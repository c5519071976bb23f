//! Deferred-verification block transforms
//!
//! `BlockTransform` is the minimal streaming interface over one direction of
//! a block cipher: whole blocks through `process_block`, the padded or
//! unpadded tail through `process_final_block`.
//!
//! `AuthenticatedTransform` wraps one and holds a verification callback
//! until the final block has been produced. This is the streaming shape of
//! decrypt-then-verify: nothing has to be buffered, but callers MUST treat
//! every byte as untrusted until the final call returns Ok.

use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Input length {got} is not a multiple of the {expected}-byte block size")]
    BlockSize { expected: usize, got: usize },

    #[error("Bad padding in final block")]
    Padding,

    #[error("Transform already finalised")]
    AlreadyFinalised,

    #[error("Content verification failed after final block")]
    VerificationFailed,
}

// ── Block transform interface ────────────────────────────────────────────────

/// One direction of a block cipher, fed incrementally.
pub trait BlockTransform {
    /// Granularity accepted by `process_block`, in bytes.
    fn input_block_size(&self) -> usize;

    /// Bytes produced per input block.
    fn output_block_size(&self) -> usize;

    /// Whether `process_block` accepts several blocks per call.
    fn transforms_many_blocks(&self) -> bool;

    /// Transform whole blocks. Input length must be a multiple of
    /// `input_block_size`; zero blocks is fine.
    fn process_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError>;

    /// Transform the final piece (any length), applying or stripping
    /// padding. At most one call per instance.
    fn process_final_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError>;
}

// ── Authenticated wrapper ────────────────────────────────────────────────────

/// Runs exactly once, after the wrapped transform has produced its final
/// block. Failure becomes the result of `process_final_block`.
pub type Verification = Box<dyn FnOnce() -> Result<(), TransformError> + Send>;

/// Decorator that defers a verification step to the end of a streaming
/// transform.
///
/// Non-final blocks pass straight through to the inner transform. The final
/// call lets the inner transform finish first, THEN runs the verification,
/// and only a passing verification releases the final output. Output from
/// earlier `process_block` calls is already in the caller's hands by then;
/// it must not be acted on until the final call returns Ok.
///
/// Instances are single-use: `process_final_block` consumes `self`, so a
/// finished transform cannot be fed again.
pub struct AuthenticatedTransform<T: BlockTransform> {
    inner: T,
    verification: Verification,
}

impl<T: BlockTransform> AuthenticatedTransform<T> {
    pub fn new(inner: T, verification: Verification) -> Self {
        Self { inner, verification }
    }

    // Capability passthrough: callers see exactly the inner transform's
    // block behaviour.
    pub fn input_block_size(&self) -> usize {
        self.inner.input_block_size()
    }

    pub fn output_block_size(&self) -> usize {
        self.inner.output_block_size()
    }

    pub fn transforms_many_blocks(&self) -> bool {
        self.inner.transforms_many_blocks()
    }

    /// Delegates unchanged; no verification happens here.
    pub fn process_block(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        self.inner.process_block(input)
    }

    /// Inner final block first, then the verification callback.
    pub fn process_final_block(mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let output = self.inner.process_final_block(input)?;
        (self.verification)()?;
        Ok(output)
    }
}
