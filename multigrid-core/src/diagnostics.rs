//! Recoverable-error accounting for a decode run.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters accumulated while decoding a word stream.
///
/// Decoding never aborts on malformed telemetry; every anomaly lands in
/// one of these counters and the partial output is still returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecodeDiagnostics {
    /// Words examined.
    pub words: u64,
    /// Frames completed and emitted as rows.
    pub frames: u64,
    /// Out-of-sequence words (data or end-of-event outside an open frame,
    /// header inside one). Each discards at most the in-progress frame.
    pub framing_errors: u64,
    /// Words matching no known signature.
    pub unknown_words: u64,
    /// Position lookups that fell outside every calibration interval.
    pub uncalibrated_hits: u64,
    /// Words belonging to a frame still open when the buffer ended.
    pub truncated_words: u64,
    /// Bytes at the end of a buffer too short to form a word.
    pub stray_tail_bytes: u64,
}

impl DecodeDiagnostics {
    /// Adds another set of counters into this one.
    pub fn merge(&mut self, other: &DecodeDiagnostics) {
        self.words += other.words;
        self.frames += other.frames;
        self.framing_errors += other.framing_errors;
        self.unknown_words += other.unknown_words;
        self.uncalibrated_hits += other.uncalibrated_hits;
        self.truncated_words += other.truncated_words;
        self.stray_tail_bytes += other.stray_tail_bytes;
    }

    /// Returns true if no anomaly counter is set.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.framing_errors == 0
            && self.unknown_words == 0
            && self.uncalibrated_hits == 0
            && self.truncated_words == 0
            && self.stray_tail_bytes == 0
    }
}

impl fmt::Display for DecodeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} words, {} frames, {} framing errors, {} unknown words, \
             {} uncalibrated hits, {} truncated words, {} stray tail bytes",
            self.words,
            self.frames,
            self.framing_errors,
            self.unknown_words,
            self.uncalibrated_hits,
            self.truncated_words,
            self.stray_tail_bytes
        )
    }
}
