//! Error taxonomy for the FTL core.
//!
//! Most failure modes here are expected, everyday signals (an LBA past the
//! end of the device, a trim of an already-trimmed range) rather than bugs.
//! The one kind that is fatal is [`FtlError::AllocationExhausted`]: it means
//! the allocator could not produce a free line even after a forced GC retry,
//! which the design treats as an abort condition rather than something to
//! paper over.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtlError {
    /// An LBA/LPN range fell (partially or fully) outside the device. Never fatal:
    /// callers clamp or skip and continue.
    #[error("lba range out of bounds: start={start} end={end} tt_pgs={tt_pgs}")]
    OutOfRange { start: u64, end: u64, tt_pgs: u64 },

    /// A write pointer could not obtain a free line even after one forced GC retry.
    #[error("allocation exhausted for {class:?} lines: no free line after forced gc")]
    AllocationExhausted { class: crate::backend::line::LineClass },

    /// An internal consistency check failed — a bug, not an expected runtime condition.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A command arrived with a shape the timing model doesn't recognize.
    /// Logged and treated as zero latency, never fatal.
    #[error("timing anomaly: {0}")]
    TimingAnomaly(String),
}

pub type FtlResult<T> = Result<T, FtlError>;
