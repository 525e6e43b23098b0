use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::decoder::{DecodeOutcome, Decoder};
use crate::error::{DecodeError, FrameError, Result};
use crate::IntegrityCheck;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Staged bytes are drained through a [`Decoder`] with capacity `CAP`;
/// callers always get complete, validated payloads. Corruption and CRC
/// failures surface as errors but leave the reader usable: the decoder has
/// already resynchronized, so the next `read_frame` scans on.
pub struct FrameReader<T, const CAP: usize> {
    inner: T,
    decoder: Decoder<CAP>,
    buf: BytesMut,
}

impl<T: Read, const CAP: usize> FrameReader<T, CAP> {
    /// Create a frame reader with the given integrity mode.
    pub fn new(inner: T, integrity: IntegrityCheck) -> Self {
        Self {
            inner,
            decoder: Decoder::new(integrity),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// On a frame that exceeds the decoder's capacity the reader resets the
    /// decoder and skips the offending byte before reporting the error, so a
    /// subsequent call resynchronizes on the next start sentinel.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            while !self.buf.is_empty() {
                match self.decoder.put(&self.buf) {
                    DecodeOutcome::Frame { payload, consumed } => {
                        let payload = Bytes::copy_from_slice(payload);
                        self.buf.advance(consumed);
                        return Ok(payload);
                    }
                    DecodeOutcome::Pending { consumed } => {
                        self.buf.advance(consumed);
                    }
                    DecodeOutcome::Failed { error, consumed } => {
                        self.buf.advance(consumed);
                        if let DecodeError::BufferExhausted { .. } = error {
                            // The codec leaves retry-in-place to the caller;
                            // a stream reader cannot grow the buffer, so drop
                            // the frame and resynchronize instead.
                            self.decoder.reset();
                            self.buf.advance(1);
                        }
                        return Err(FrameError::Decode(error));
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
