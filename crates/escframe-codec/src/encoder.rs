use crate::error::EncodeError;
use crate::{needs_escape, IntegrityCheck, CRC_LENGTH, ESC, ETX, STX};

/// Builds one escaped, optionally CRC-terminated frame in a fixed buffer.
///
/// `CAP` is the wire buffer size; size it with
/// [`encoded_capacity`](crate::encoded_capacity) so that any payload up to
/// the intended maximum fits even when every byte needs escaping:
///
/// ```
/// use escframe_codec::{encoded_capacity, Encoder, IntegrityCheck};
///
/// let mut encoder = Encoder::<{ encoded_capacity(64) }>::new(IntegrityCheck::With);
/// assert_eq!(encoder.put(b"hello"), 5);
/// let frame = encoder.finalize().unwrap();
/// assert_eq!(frame[0], 0x02);
/// ```
///
/// The start sentinel is pre-written at construction and after every
/// `reset()`, so the write cursor is always at least 1. One trailing slot is
/// reserved for the end sentinel at all times.
#[derive(Debug)]
pub struct Encoder<const CAP: usize> {
    buf: [u8; CAP],
    len: usize,
    crc: crc32fast::Hasher,
    integrity: IntegrityCheck,
}

impl<const CAP: usize> Encoder<CAP> {
    /// Create an encoder ready to accept payload bytes.
    pub fn new(integrity: IntegrityCheck) -> Self {
        const { assert!(CAP >= 2, "capacity must fit STX and ETX") }
        let mut encoder = Self {
            buf: [0; CAP],
            len: 0,
            crc: crc32fast::Hasher::new(),
            integrity,
        };
        encoder.reset();
        encoder
    }

    /// Discard any in-progress frame and start a new one.
    pub fn reset(&mut self) {
        self.len = 0;
        self.crc = crc32fast::Hasher::new();
        self.buf[self.len] = STX;
        self.len += 1;
    }

    /// Append payload bytes, escaping sentinels.
    ///
    /// Returns the number of payload bytes appended. A short count means the
    /// buffer could not fit the next byte (plus the reserved ETX slot); the
    /// already-appended prefix stays in place.
    pub fn put(&mut self, bytes: &[u8]) -> usize {
        for (offset, &value) in bytes.iter().enumerate() {
            if !self.push_escaped(value) {
                return offset;
            }
            // CRC runs over the original, unescaped byte.
            if self.integrity == IntegrityCheck::With {
                self.crc.update(&[value]);
            }
        }
        bytes.len()
    }

    /// Append the CRC trailer (mode `With`) and the end sentinel, and return
    /// the completed frame.
    ///
    /// The returned view borrows the internal buffer and is invalidated by
    /// the next `put`/`reset`/`finalize`. On `InsufficientRoom` the buffer is
    /// left partially written; `reset()` before reuse.
    pub fn finalize(&mut self) -> Result<&[u8], EncodeError> {
        if self.integrity == IntegrityCheck::With {
            let crc = self.crc.clone().finalize();
            // Big-endian on the wire regardless of host order.
            for byte in crc.to_be_bytes() {
                if !self.push_escaped(byte) {
                    return Err(EncodeError::InsufficientRoom {
                        written: self.len,
                        capacity: CAP,
                    });
                }
            }
        }
        if self.len >= CAP {
            return Err(EncodeError::InsufficientRoom {
                written: self.len,
                capacity: CAP,
            });
        }
        self.buf[self.len] = ETX;
        self.len += 1;
        Ok(&self.buf[..self.len])
    }

    /// Bytes written so far, including the start sentinel.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no payload byte has been appended since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len == 1
    }

    /// The integrity mode this encoder was constructed with.
    pub fn integrity(&self) -> IntegrityCheck {
        self.integrity
    }

    fn can_fit(&self, count: usize) -> bool {
        // The last slot belongs to ETX.
        self.len + count <= CAP - 1
    }

    fn push_escaped(&mut self, value: u8) -> bool {
        if needs_escape(value) {
            if !self.can_fit(2) {
                return false;
            }
            self.buf[self.len] = ESC;
            self.buf[self.len + 1] = !value;
            self.len += 2;
        } else {
            if !self.can_fit(1) {
                return false;
            }
            self.buf[self.len] = value;
            self.len += 1;
        }
        true
    }
}
