/// Errors detected while building a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The CRC trailer (or closing sentinel) does not fit in the output
    /// buffer. The frame is left partially written; `reset()` before reuse.
    #[error("insufficient room for frame trailer ({written} of {capacity} bytes used)")]
    InsufficientRoom { written: usize, capacity: usize },
}

/// Errors detected while reconstructing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload buffer is full. The decoder state is left untouched so the
    /// caller may reset explicitly or abandon the stream; the failing byte is
    /// not consumed.
    #[error("decode buffer exhausted ({capacity} bytes)")]
    BufferExhausted { capacity: usize },

    /// The CRC-32 trailer did not match the collected payload. The decoder
    /// has already reset itself and will resynchronize on the next STX.
    #[error("CRC-32 mismatch (received {received:#010x}, computed {computed:#010x})")]
    IntegrityFailure { received: u32, computed: u32 },

    /// The frame ended before a complete CRC-32 trailer was collected.
    /// The decoder has already reset itself.
    #[error("frame shorter than CRC-32 trailer ({collected} bytes collected)")]
    TruncatedFrame { collected: usize },

    /// A literal sentinel followed the escape marker, which no encoder
    /// produces. The decoder has already reset itself.
    #[error("invalid escape sequence (ESC followed by {value:#04x})")]
    InvalidEscape { value: u8 },
}

/// Errors surfaced by the stream adapters.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The codec rejected the frame being written.
    #[error("frame encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// The codec rejected bytes read from the stream.
    #[error("frame decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The payload exceeds the writer's compile-time capacity.
    #[error("payload too large ({size} bytes, {written} fit)")]
    PayloadTooLarge { size: usize, written: usize },

    /// An I/O error occurred while reading or writing the stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was transferred.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
