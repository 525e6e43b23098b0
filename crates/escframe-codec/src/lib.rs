//! Sentinel-delimited framing for raw byte streams.
//!
//! Serial links, pipes, and sockets deliver bytes with no message boundaries.
//! escframe delimits messages with `STX`/`ETX` sentinel bytes, escapes payload
//! bytes that collide with a sentinel, and optionally appends a CRC-32 trailer
//! so receivers can detect corruption:
//!
//! ```text
//! STX  <payload-byte | ESC,!sentinel-byte>*  [escaped 4-byte BE CRC-32]  ETX
//! ```
//!
//! Both sides run on fixed-capacity buffers sized at compile time — no
//! allocation, no I/O, no internal retries. [`Encoder`] builds one frame at a
//! time; [`Decoder`] is a byte-by-byte state machine that resynchronizes
//! across noise, restarts, and corruption on its own.
//!
//! [`FrameReader`] and [`FrameWriter`] wrap the codec around blocking
//! `std::io` streams for callers that do not need the incremental API.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod writer;

pub use decoder::{DecodeOutcome, Decoder};
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError, FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

/// Start-of-frame sentinel (ASCII STX).
pub const STX: u8 = 0x02;

/// End-of-frame sentinel (ASCII ETX).
pub const ETX: u8 = 0x03;

/// Escape marker (ASCII ESC).
pub const ESC: u8 = 0x1b;

/// Size of the serialized CRC-32 trailer in bytes.
pub const CRC_LENGTH: usize = 4;

/// Integrity mode, fixed at construction of each encoder/decoder.
///
/// Cooperating encoder and decoder instances must agree on the mode; there is
/// no in-band negotiation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegrityCheck {
    /// Append (encoder) / verify (decoder) a CRC-32 trailer.
    #[default]
    With,
    /// No trailer, no verification.
    Without,
}

/// True for byte values that must be escaped inside a frame.
#[inline]
pub const fn needs_escape(value: u8) -> bool {
    matches!(value, STX | ETX | ESC)
}

/// Encoder buffer capacity that fits any payload up to `max_payload` bytes:
/// STX + worst case of every payload and CRC byte escaped + ETX.
pub const fn encoded_capacity(max_payload: usize) -> usize {
    1 + 2 * (max_payload + CRC_LENGTH) + 1
}

/// Decoder buffer capacity for payloads up to `max_payload` bytes. The
/// decoder stores the unescaped payload plus the CRC trailer before
/// validation.
pub const fn decoded_capacity(max_payload: usize) -> usize {
    max_payload + CRC_LENGTH
}
