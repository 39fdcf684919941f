//! # Engine Setup Errors
//!
//! The audio path never fails: out-of-range parameters are clamped and an
//! unprepared engine simply leaves the block alone. The only operations
//! that can be refused are the ones that run off the real-time path and
//! allocate, namely [`DelayEngine::prepare`](crate::dsp::engine::DelayEngine::prepare).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EngineError {
    /// The host handed us a sample rate we can't size a buffer from.
    #[error("unsupported sample rate {0} Hz")]
    InvalidSampleRate(f32),

    /// The configured ring buffer can't hold the longest allowed delay,
    /// so the read cursor could lap the write cursor.
    #[error("a {buffer_seconds} s buffer cannot hold a {max_delay_ms} ms delay")]
    BufferTooShort {
        buffer_seconds: f32,
        max_delay_ms: f32,
    },
}
