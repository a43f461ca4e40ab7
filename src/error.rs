//! Error types for pktdump.
//!
//! Two unrelated error surfaces live here:
//!
//! - [`Truncated`] - raised by the byte cursor when a read would pass the end
//!   of the captured data. It propagates through every printer with `?` up to
//!   the per-packet print loop, which emits the `[|proto]` marker and moves
//!   on to the next packet. Nothing between the failing read and that loop
//!   needs to handle it.
//! - [`enum@Error`] / [`PcapError`] - errors from opening and reading capture
//!   files. These surface to the CLI via `anyhow`.
//!
//! "Invalid" (in-bounds but self-contradictory packet structure) is
//! deliberately *not* an error type: a printer that detects it writes the
//! ` (invalid)` marker through the emitter and returns normally, so sibling
//! records keep decoding. Conflating the two would lose the distinction
//! between a short capture and a lying packet.

use thiserror::Error;

/// The captured data ended before the declared structure did.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("captured data ends before the declared structure")]
pub struct Truncated;

/// Result alias for anything that reads packet bytes.
pub type DecodeResult<T> = std::result::Result<T, Truncated>;

/// Main error type for pktdump operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading or parsing a capture file
    #[error("PCAP error: {0}")]
    Pcap(#[from] PcapError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to capture file reading.
#[derive(Error, Debug)]
pub enum PcapError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Invalid capture file format
    #[error("Invalid capture format: {reason}")]
    InvalidFormat { reason: String },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
