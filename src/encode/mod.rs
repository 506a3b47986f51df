//! Clip encoding and final concatenation.

/// Encoder and concatenator contracts.
pub(crate) mod backend;
/// `ffmpeg`-based implementation of both contracts.
pub(crate) mod ffmpeg;
