use std::io::{ErrorKind, Write};

use crate::encoder::Encoder;
use crate::error::{FrameError, Result};
use crate::IntegrityCheck;

/// Writes complete frames to any `Write` stream.
///
/// Each `send` produces one whole frame through an [`Encoder`] with capacity
/// `CAP` and writes it with short-write and `Interrupted`/`WouldBlock`
/// retries.
pub struct FrameWriter<T, const CAP: usize> {
    inner: T,
    encoder: Encoder<CAP>,
}

impl<T: Write, const CAP: usize> FrameWriter<T, CAP> {
    /// Create a frame writer with the given integrity mode.
    pub fn new(inner: T, integrity: IntegrityCheck) -> Self {
        Self {
            inner,
            encoder: Encoder::new(integrity),
        }
    }

    /// Encode and send one payload as a complete frame (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.encoder.reset();
        let written = self.encoder.put(payload);
        if written < payload.len() {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                written,
            });
        }
        let frame = self.encoder.finalize()?;

        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
