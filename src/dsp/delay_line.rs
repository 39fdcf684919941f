//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! fixed number of samples. One of these exists per channel.
//!
//! ## How the Ring Works
//!
//! Picture a circular tape loop with two heads. The write head records the
//! incoming signal; the read head plays back from a point `delay_len`
//! samples behind it. Both heads move forward one slot per sample and wrap
//! to slot 0 at the end of the buffer, so the distance between them (the
//! delay) never changes until the cursors are retargeted.
//!
//! ```text
//!            read_pos          write_pos
//!               │                  │
//!   ┌───┬───┬───▼───┬───┬───┬───┬──▼┬───┬───┐
//!   │   │   │ y[n]  │   │   │   │x[n]   │   │  ← buffer_len slots
//!   └───┴───┴───────┴───┴───┴───┴───┴───┴───┘
//!               ◄──── delay_len ────►
//! ```
//!
//! Unlike an interpolating line, the read position here is a stored cursor
//! rather than something recomputed every sample. That keeps the per-sample
//! cost to two loads, one store and two increments, at the price of a
//! single-sample jump whenever the delay time changes.

use std::num::NonZeroUsize;

use super::cooker::read_index;

/// A fixed-size ring buffer with its own write and read cursors.
///
/// The buffer is allocated once in `prepare()` and never resized, so the
/// audio thread never allocates.
pub struct DelayLine {
    /// The circular buffer storing audio samples. All values start at
    /// 0.0 (silence).
    buffer: Vec<f32>,

    /// Where the next incoming sample will be stored.
    write_pos: usize,

    /// Where the next delayed sample will be read from. Kept at
    /// `(write_pos - delay_len) mod buffer_len` by [`retarget`](Self::retarget).
    read_pos: usize,

    buffer_len: usize,
}

impl DelayLine {
    /// Create a silent delay line of `length` samples with both cursors at
    /// slot 0.
    ///
    /// `NonZeroUsize` rules out an empty ring, where the cursor wrap
    /// arithmetic would have nowhere to go.
    pub fn new(length: NonZeroUsize) -> Self {
        Self {
            buffer: vec![0.0; length.get()],
            write_pos: 0,
            read_pos: 0,
            buffer_len: length.get(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer_len
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Move the read cursor so it sits `delay_len` samples behind the write
    /// cursor. The write cursor and the stored audio are left alone.
    ///
    /// `delay_len` is capped at the ring length.
    pub fn retarget(&mut self, delay_len: usize) {
        self.read_pos = read_index(
            self.write_pos,
            delay_len.min(self.buffer_len),
            self.buffer_len,
        );
    }

    /// The sample under this line's read cursor.
    #[inline]
    pub fn tap(&self) -> f32 {
        self.buffer[self.read_pos]
    }

    /// The sample at an arbitrary slot. Cross mode uses this to read one
    /// line's history at another line's read cursor. `index` must come
    /// from a line of the same length.
    #[inline]
    pub fn sample_at(&self, index: usize) -> f32 {
        self.buffer[index]
    }

    /// Store a sample at the write cursor.
    ///
    /// **Important:** This does NOT advance the cursors. Call
    /// [`advance()`](Self::advance) once the current sample has been read
    /// and written, so the old value can be read before it's overwritten.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
    }

    /// Advance both cursors by one sample, wrapping to 0 at the end.
    #[inline]
    pub fn advance(&mut self) {
        self.write_pos = wrap_increment(self.write_pos, self.buffer_len);
        self.read_pos = wrap_increment(self.read_pos, self.buffer_len);
    }

    /// Silence the whole buffer and put both cursors back at slot 0.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 0;
    }

    #[cfg(test)]
    pub(crate) fn is_silent(&self) -> bool {
        self.buffer.iter().all(|s| *s == 0.0)
    }
}

// Cheaper than `%` on the hot path: the index only ever moves by one.
#[inline]
fn wrap_increment(index: usize, len: usize) -> usize {
    let next = index + 1;
    if next >= len {
        0
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: usize) -> DelayLine {
        DelayLine::new(NonZeroUsize::new(len).unwrap())
    }

    /// A sample written now comes back out of the tap `delay_len` samples
    /// later.
    #[test]
    fn test_write_and_read_after_delay() {
        let mut dl = line(100);
        dl.retarget(3);

        let mut out = Vec::new();
        for input in [0.75, 0.0, 0.0, 0.0, 0.0] {
            out.push(dl.tap());
            dl.write(input);
            dl.advance();
        }

        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.75, 0.0]);
    }

    /// Retargeting only moves the read cursor.
    #[test]
    fn test_retarget_keeps_write_cursor() {
        let mut dl = line(10);
        for _ in 0..4 {
            dl.write(1.0);
            dl.advance();
        }

        dl.retarget(6);
        assert_eq!(dl.write_pos(), 4);
        assert_eq!(dl.read_pos(), 8);

        dl.retarget(2);
        assert_eq!(dl.write_pos(), 4);
        assert_eq!(dl.read_pos(), 2);
    }

    /// Both cursors wrap to 0 together at the end of the ring.
    #[test]
    fn test_wrapping() {
        let mut dl = line(4);
        dl.retarget(1);
        assert_eq!(dl.read_pos(), 3);

        for i in 0..6 {
            dl.write(i as f32);
            dl.advance();
        }

        // After 6 writes into size-4 buffer:
        //   write_pos = 6 % 4 = 2, read_pos one behind it
        //   Buffer contents: [4.0, 5.0, 2.0, 3.0]
        assert_eq!(dl.write_pos(), 2);
        assert_eq!(dl.read_pos(), 1);
        assert!((dl.tap() - 5.0).abs() < 1e-6, "Expected 5.0, got {}", dl.tap());
        assert!((dl.sample_at(2) - 2.0).abs() < 1e-6);
    }

    /// Asking for more delay than the ring holds reads the oldest slot,
    /// which is the write cursor itself.
    #[test]
    fn test_retarget_caps_at_ring_length() {
        let mut dl = line(8);
        dl.write(0.0);
        dl.advance();

        dl.retarget(1_000);
        assert_eq!(dl.read_pos(), dl.write_pos());
    }

    #[test]
    fn test_clear() {
        let mut dl = line(10);
        dl.retarget(4);
        dl.write(0.5);
        dl.advance();

        dl.clear();

        assert!(dl.is_silent());
        assert_eq!(dl.write_pos(), 0);
        assert_eq!(dl.read_pos(), 0);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut dl = line(16);
        dl.retarget(5);

        for _ in 0..64 {
            assert!(dl.tap().abs() < 1e-6);
            dl.write(0.0);
            dl.advance();
        }
    }
}
