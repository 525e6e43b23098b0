use tracing::trace;

use crate::error::DecodeError;
use crate::{IntegrityCheck, CRC_LENGTH, ESC, ETX, STX};

/// Decoder state, advanced one input byte at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Discarding everything until a start sentinel arrives.
    WaitOnStx,
    /// Collecting payload bytes.
    Accepting,
    /// The previous byte was the escape marker.
    Escaped,
}

/// Result of feeding bytes to a [`Decoder`].
///
/// `consumed` is the number of input bytes processed, counted from the start
/// of the chunk passed to [`Decoder::put`]; callers resume feeding at that
/// offset. It is *not* the number of bytes accepted into the payload.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeOutcome<'a> {
    /// A frame completed and passed validation. `payload` borrows the
    /// decoder's buffer and excludes the CRC trailer.
    Frame { payload: &'a [u8], consumed: usize },
    /// No frame yet; the whole chunk was consumed. The normal steady state
    /// while scanning a stream.
    Pending { consumed: usize },
    /// A frame failed. On [`DecodeError::BufferExhausted`] the failing byte
    /// is not consumed and the decoder keeps its state; every other failure
    /// consumes the byte and has already reset the decoder.
    Failed {
        error: DecodeError,
        consumed: usize,
    },
}

/// Reconstructs frames from a raw byte stream, resynchronizing across noise,
/// restarts, and corruption.
///
/// `CAP` is the payload buffer size; size it with
/// [`decoded_capacity`](crate::decoded_capacity) so the CRC trailer fits
/// alongside the largest expected payload.
///
/// ```
/// use escframe_codec::{decoded_capacity, DecodeOutcome, Decoder, IntegrityCheck};
///
/// let mut decoder = Decoder::<{ decoded_capacity(64) }>::new(IntegrityCheck::Without);
/// match decoder.put(&[0x02, 0x2A, 0x03]) {
///     DecodeOutcome::Frame { payload, consumed } => {
///         assert_eq!(payload, [0x2A]);
///         assert_eq!(consumed, 3);
///     }
///     other => panic!("expected a frame, got {other:?}"),
/// }
/// ```
///
/// A successful frame does not implicitly reset the decoder: the returned
/// payload stays valid until the next call, and the next frame's start
/// sentinel restarts collection on its own. Callers that want a clean slate
/// call [`Decoder::reset`].
#[derive(Debug)]
pub struct Decoder<const CAP: usize> {
    buf: [u8; CAP],
    len: usize,
    state: State,
    integrity: IntegrityCheck,
}

impl<const CAP: usize> Decoder<CAP> {
    /// Create a decoder waiting for a start sentinel.
    pub fn new(integrity: IntegrityCheck) -> Self {
        Self {
            buf: [0; CAP],
            len: 0,
            state: State::WaitOnStx,
            integrity,
        }
    }

    /// Discard any collected bytes and wait for the next start sentinel.
    pub fn reset(&mut self) {
        self.len = 0;
        self.state = State::WaitOnStx;
    }

    /// The integrity mode this decoder was constructed with.
    pub fn integrity(&self) -> IntegrityCheck {
        self.integrity
    }

    /// Feed raw stream bytes, stopping at the first byte that completes a
    /// frame or fails.
    ///
    /// Each byte is processed independently; see [`DecodeOutcome`] for the
    /// resume contract.
    pub fn put(&mut self, bytes: &[u8]) -> DecodeOutcome<'_> {
        for (offset, &value) in bytes.iter().enumerate() {
            match self.state {
                State::WaitOnStx => {
                    if value == STX {
                        self.state = State::Accepting;
                    }
                }
                State::Accepting => match value {
                    STX => {
                        // Spurious or duplicate start: begin a new frame here.
                        if self.len > 0 {
                            trace!(discarded = self.len, "restarting frame on STX");
                        }
                        self.len = 0;
                    }
                    ETX => match self.validate() {
                        Ok(length) => {
                            return DecodeOutcome::Frame {
                                payload: &self.buf[..length],
                                consumed: offset + 1,
                            };
                        }
                        Err(error) => {
                            trace!(%error, collected = self.len, "frame rejected");
                            self.reset();
                            return DecodeOutcome::Failed {
                                error,
                                consumed: offset + 1,
                            };
                        }
                    },
                    ESC => self.state = State::Escaped,
                    _ => {
                        if self.len >= CAP {
                            return DecodeOutcome::Failed {
                                error: DecodeError::BufferExhausted { capacity: CAP },
                                consumed: offset,
                            };
                        }
                        self.buf[self.len] = value;
                        self.len += 1;
                    }
                },
                State::Escaped => match value {
                    STX => {
                        // An escape corrupted into a start sentinel: resync
                        // by beginning a new frame immediately.
                        trace!(discarded = self.len, "resynchronizing on escaped STX");
                        self.len = 0;
                        self.state = State::Accepting;
                    }
                    ETX | ESC => {
                        trace!(value, "literal sentinel after escape marker");
                        self.reset();
                        return DecodeOutcome::Failed {
                            error: DecodeError::InvalidEscape { value },
                            consumed: offset + 1,
                        };
                    }
                    _ => {
                        if self.len >= CAP {
                            return DecodeOutcome::Failed {
                                error: DecodeError::BufferExhausted { capacity: CAP },
                                consumed: offset,
                            };
                        }
                        self.buf[self.len] = !value;
                        self.len += 1;
                        self.state = State::Accepting;
                    }
                },
            }
        }

        DecodeOutcome::Pending {
            consumed: bytes.len(),
        }
    }

    /// Check the collected bytes at end-of-frame; returns the payload length.
    fn validate(&self) -> Result<usize, DecodeError> {
        if self.integrity == IntegrityCheck::Without {
            return Ok(self.len);
        }

        if self.len < CRC_LENGTH {
            return Err(DecodeError::TruncatedFrame {
                collected: self.len,
            });
        }

        let body = self.len - CRC_LENGTH;
        let mut trailer = [0u8; CRC_LENGTH];
        trailer.copy_from_slice(&self.buf[body..self.len]);
        let received = u32::from_be_bytes(trailer);
        let computed = crc32fast::hash(&self.buf[..body]);

        if received == computed {
            Ok(body)
        } else {
            Err(DecodeError::IntegrityFailure { received, computed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoded_capacity;

    const NON_SENTINEL: u8 = 42;

    fn frame(decoder: &mut Decoder<100>, bytes: &[u8]) -> Vec<u8> {
        match decoder.put(bytes) {
            DecodeOutcome::Frame { payload, consumed } => {
                assert_eq!(consumed, bytes.len());
                payload.to_vec()
            }
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn empty_frame_without_integrity() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        assert_eq!(frame(&mut decoder, &[STX, ETX]), Vec::<u8>::new());
    }

    #[test]
    fn empty_frame_with_integrity_is_truncated() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::With);
        match decoder.put(&[STX, ETX]) {
            DecodeOutcome::Failed { error, consumed } => {
                assert_eq!(error, DecodeError::TruncatedFrame { collected: 0 });
                assert_eq!(consumed, 2);
            }
            other => panic!("expected a failure, got {other:?}"),
        }
        // Implicit reset: a well-formed frame decodes right after.
        let crc = crc32fast::hash(&[NON_SENTINEL]).to_be_bytes();
        let mut wire = vec![STX, NON_SENTINEL];
        wire.extend_from_slice(&crc);
        wire.push(ETX);
        assert_eq!(frame(&mut decoder, &wire), [NON_SENTINEL]);
    }

    #[test]
    fn plain_payload() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        assert_eq!(
            frame(&mut decoder, &[STX, NON_SENTINEL, ETX]),
            [NON_SENTINEL]
        );
    }

    #[test]
    fn escaped_sentinels_reconstruct() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, ESC, !STX, ESC, !ESC, ESC, !ETX, ETX];
        assert_eq!(frame(&mut decoder, &wire), [STX, ESC, ETX]);
    }

    #[test]
    fn byte_at_a_time_feed() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, ESC, !STX, NON_SENTINEL, ETX];
        for &byte in &wire[..wire.len() - 1] {
            assert_eq!(decoder.put(&[byte]), DecodeOutcome::Pending { consumed: 1 });
        }
        match decoder.put(&[ETX]) {
            DecodeOutcome::Frame { payload, consumed } => {
                assert_eq!(payload, [STX, NON_SENTINEL]);
                assert_eq!(consumed, 1);
            }
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn noise_before_start_is_discarded() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let mut wire = vec![0xFF, NON_SENTINEL, ETX, ESC];
        wire.extend_from_slice(&[STX, NON_SENTINEL, ETX]);
        assert_eq!(frame(&mut decoder, &wire), [NON_SENTINEL]);
    }

    #[test]
    fn duplicate_stx_restarts_collection() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, STX, NON_SENTINEL, ETX];
        assert_eq!(frame(&mut decoder, &wire), [NON_SENTINEL]);
    }

    #[test]
    fn stx_mid_payload_discards_collected_bytes() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, 0x10, 0x11, STX, NON_SENTINEL, ETX];
        assert_eq!(frame(&mut decoder, &wire), [NON_SENTINEL]);
    }

    #[test]
    fn escaped_stx_resynchronizes() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, 0x10, ESC, STX, NON_SENTINEL, ETX];
        assert_eq!(frame(&mut decoder, &wire), [NON_SENTINEL]);
    }

    #[test]
    fn literal_etx_after_escape_is_corruption() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        match decoder.put(&[STX, 0x10, ESC, ETX]) {
            DecodeOutcome::Failed { error, consumed } => {
                assert_eq!(error, DecodeError::InvalidEscape { value: ETX });
                assert_eq!(consumed, 4);
            }
            other => panic!("expected a failure, got {other:?}"),
        }
        // Full reset: collection only restarts on a fresh STX.
        assert_eq!(
            frame(&mut decoder, &[STX, NON_SENTINEL, ETX]),
            [NON_SENTINEL]
        );
    }

    #[test]
    fn literal_esc_after_escape_is_corruption() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        match decoder.put(&[STX, ESC, ESC]) {
            DecodeOutcome::Failed { error, .. } => {
                assert_eq!(error, DecodeError::InvalidEscape { value: ESC });
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[test]
    fn overflow_reports_exhaustion_without_reset() {
        const N: usize = 5;
        let mut decoder = Decoder::<N>::new(IntegrityCheck::Without);
        assert_eq!(decoder.put(&[STX]), DecodeOutcome::Pending { consumed: 1 });
        for _ in 0..N {
            assert_eq!(
                decoder.put(&[NON_SENTINEL]),
                DecodeOutcome::Pending { consumed: 1 }
            );
        }

        // The (N+1)th byte does not fit and is not consumed.
        assert_eq!(
            decoder.put(&[NON_SENTINEL]),
            DecodeOutcome::Failed {
                error: DecodeError::BufferExhausted { capacity: N },
                consumed: 0,
            }
        );

        // Exhaustion is not a reset: ETX still completes the N collected bytes.
        match decoder.put(&[ETX]) {
            DecodeOutcome::Frame { payload, consumed } => {
                assert_eq!(payload, [NON_SENTINEL; N]);
                assert_eq!(consumed, 1);
            }
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn overflow_in_escaped_state_keeps_state() {
        const N: usize = 2;
        let mut decoder = Decoder::<N>::new(IntegrityCheck::Without);
        let outcome = decoder.put(&[STX, NON_SENTINEL, NON_SENTINEL, ESC, !STX]);
        assert_eq!(
            outcome,
            DecodeOutcome::Failed {
                error: DecodeError::BufferExhausted { capacity: N },
                consumed: 4,
            }
        );
        // No reset happened: the decoder is still mid-escape, so a following
        // ETX reads as the invalid sequence ESC,ETX.
        match decoder.put(&[ETX]) {
            DecodeOutcome::Failed { error, .. } => {
                assert_eq!(error, DecodeError::InvalidEscape { value: ETX });
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[test]
    fn exact_capacity_payload_completes() {
        const N: usize = 5;
        let mut decoder = Decoder::<N>::new(IntegrityCheck::Without);
        let mut wire = vec![STX];
        wire.extend_from_slice(&[NON_SENTINEL; N]);
        wire.push(ETX);
        match decoder.put(&wire) {
            DecodeOutcome::Frame { payload, .. } => assert_eq!(payload.len(), N),
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn put_stops_at_frame_boundary() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let wire = [STX, 0x10, ETX, STX, 0x11, ETX];
        let consumed = match decoder.put(&wire) {
            DecodeOutcome::Frame { payload, consumed } => {
                assert_eq!(payload, [0x10]);
                consumed
            }
            other => panic!("expected a frame, got {other:?}"),
        };
        assert_eq!(consumed, 3);
        assert_eq!(frame_at(&mut decoder, &wire[consumed..]), vec![0x11]);
    }

    fn frame_at(decoder: &mut Decoder<100>, bytes: &[u8]) -> Vec<u8> {
        match decoder.put(bytes) {
            DecodeOutcome::Frame { payload, .. } => payload.to_vec(),
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn crc_mismatch_resets_decoder() {
        let payload = b"FOOBAR";
        let mut wire = vec![STX];
        wire.extend_from_slice(payload);
        let mut crc = crc32fast::hash(payload).to_be_bytes();
        crc[0] ^= 0x01;
        wire.extend_from_slice(&crc);
        wire.push(ETX);

        let mut decoder = Decoder::<100>::new(IntegrityCheck::With);
        match decoder.put(&wire) {
            DecodeOutcome::Failed { error, consumed } => {
                assert!(matches!(error, DecodeError::IntegrityFailure { .. }));
                assert_eq!(consumed, wire.len());
            }
            other => panic!("expected a failure, got {other:?}"),
        }

        // Decoder recovered: the clean frame decodes.
        let mut clean = vec![STX];
        clean.extend_from_slice(payload);
        clean.extend_from_slice(&crc32fast::hash(payload).to_be_bytes());
        clean.push(ETX);
        assert_eq!(frame(&mut decoder, &clean), payload);
    }

    #[test]
    fn crc_trailer_is_stripped_from_payload() {
        let payload = [0x44u8, 0x55];
        let mut wire = vec![STX];
        wire.extend_from_slice(&payload);
        wire.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        wire.push(ETX);

        let mut decoder = Decoder::<{ decoded_capacity(16) }>::new(IntegrityCheck::With);
        match decoder.put(&wire) {
            DecodeOutcome::Frame { payload: got, .. } => assert_eq!(got, payload),
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn successful_frame_does_not_reset() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        let _ = frame(&mut decoder, &[STX, 0x10, ETX]);
        // Without an explicit reset, the next STX restarts collection.
        assert_eq!(frame_at(&mut decoder, &[STX, 0x11, ETX]), vec![0x11]);
    }

    #[test]
    fn reset_returns_to_wait_state() {
        let mut decoder = Decoder::<100>::new(IntegrityCheck::Without);
        assert_eq!(
            decoder.put(&[STX, 0x10]),
            DecodeOutcome::Pending { consumed: 2 }
        );
        decoder.reset();
        // Bytes before the next STX are ignored again.
        assert_eq!(
            decoder.put(&[0x11, ETX]),
            DecodeOutcome::Pending { consumed: 2 }
        );
        assert_eq!(frame(&mut decoder, &[STX, 0x12, ETX]), [0x12]);
    }
}
