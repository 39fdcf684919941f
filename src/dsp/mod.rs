//! # DSP Building Blocks
//!
//! - **`cooker`**: converts ms/% parameters into the sample counts and gains
//!   the per-sample loop runs on, and works out where each read cursor sits.
//! - **`delay_line`**: one channel's ring buffer plus its write/read cursors.
//! - **`engine`**: owns the left and right lines, handles the
//!   prepare/reset/release lifecycle and runs the block loop, including
//!   cross-routed taps.

pub mod cooker;
pub mod delay_line;
pub mod engine;
