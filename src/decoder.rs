//! Streaming decoder: reconstructs a sequence of `Vec64`s from a bit stream
//! produced by [`crate::encoder::Encoder`].
//!
//! Mirrors the deferred-error convention of [`crate::bitio`]: `next` returns
//! a plain `bool`, and any error that ended the stream early is retrieved
//! separately via `err`. A clean end-of-stream leaves `err` as `None`.

use std::io::Read;

use crate::bitio::BitReader;
use crate::error::{BitIoError, DecodeError};
use crate::vector::Vec64;

const SHIFT_SIZE: u8 = 6;
const NUM_VALUE_BITS_SIZE: u8 = 6;
const EOF_SHIFT_BITS: u8 = (1 << SHIFT_SIZE) - 1; // 63
const EOF_NUM_VALUE_BITS: u8 = (1 << NUM_VALUE_BITS_SIZE) - 1; // 63
const FLOAT_BITS: u8 = 64;

#[derive(Clone, Copy, Default)]
struct ElementState {
    prev_bits: u64,
    lshift: u8,
    num_value_bits: u8,
}

/// Reconstructs a sequence of `span`-wide `Vec64`s read from `R`.
pub struct Decoder<R: Read> {
    reader: BitReader<R>,
    state: Vec<ElementState>,
    out: Vec64,
    first: bool,
    /// Sticky decode-level error (distinct from the bit reader's own sticky
    /// I/O error slot), e.g. `PartialVector`.
    err: Option<DecodeError>,
}

impl<R: Read> Decoder<R> {
    /// Creates a new decoder for vectors of the given `span`, reading from `source`.
    pub fn new(source: R, span: usize) -> Self {
        assert!(span >= 1, "span must be at least 1");
        Decoder {
            reader: BitReader::new(source),
            state: vec![ElementState::default(); span],
            out: Vec64::new(span),
            first: true,
            err: None,
        }
    }

    /// Span this decoder was constructed with.
    pub fn span(&self) -> usize {
        self.state.len()
    }

    /// Decodes the next vector into the internal buffer, retrievable via
    /// [`Self::current`].
    ///
    /// Returns `true` on success. Returns `false` on end-of-stream, whether
    /// clean or due to an error — check [`Self::err`] to tell them apart.
    /// Once an error has been latched, further calls are no-ops that keep
    /// returning `false`.
    pub fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        let ok = if self.first { self.read_first_vector() } else { self.read_delta_vector() };
        if !ok {
            if let Some(e) = self.reader.err() {
                self.err = Some(DecodeError::Io(e.clone()));
            }
        }
        ok
    }

    /// The deferred error, if any. `None` after a clean end-of-stream.
    pub fn err(&self) -> Option<&DecodeError> {
        self.err.as_ref()
    }

    /// View of the last successfully decoded vector. Valid only after `next`
    /// returned `true`; overwritten by the following call to `next`.
    pub fn current(&self) -> &Vec64 {
        &self.out
    }

    fn read_first_vector(&mut self) -> bool {
        for i in 0..self.state.len() {
            let bits = self.reader.read_bits(FLOAT_BITS);
            if self.reader.err().is_some() {
                if i == 0 {
                    self.reader.clear_eof();
                }
                return false;
            }
            self.out.as_words_mut()[i] = bits;
            self.state[i].prev_bits = bits;
        }
        self.first = false;
        true
    }

    fn read_delta_vector(&mut self) -> bool {
        let span = self.state.len();
        let mut i = 0;
        while i < span {
            let repeat = self.reader.read_bool();
            if self.bail_on_eof(i) {
                return false;
            }
            if repeat {
                let bits = self.state[i].prev_bits;
                self.out.as_words_mut()[i] = bits;
                i += 1;
                continue;
            }

            let reuse_window = self.reader.read_bool();
            if self.bail_on_eof(i) {
                return false;
            }

            if !reuse_window {
                let window = self.reader.read_bits(SHIFT_SIZE + NUM_VALUE_BITS_SIZE);
                if self.bail_on_eof(i) {
                    return false;
                }
                let lshift = (window >> NUM_VALUE_BITS_SIZE) as u8;
                let num_value_bits = (window & u64::from(EOF_NUM_VALUE_BITS)) as u8;

                if lshift == EOF_SHIFT_BITS && num_value_bits == EOF_NUM_VALUE_BITS {
                    if i != 0 {
                        self.err = Some(DecodeError::PartialVector);
                        return false;
                    }
                    log::debug!("EOF marker recognised, re-synchronizing");
                    self.reader.align();
                    self.first = true;
                    return self.read_first_vector();
                }

                self.state[i].lshift = lshift;
                self.state[i].num_value_bits = num_value_bits;
            }

            let msb = self.reader.read_bits(self.state[i].num_value_bits + 1);
            if self.bail_on_eof(i) {
                return false;
            }
            let diff = msb << self.state[i].lshift;
            let bits = self.state[i].prev_bits ^ diff;
            self.state[i].prev_bits = bits;
            self.out.as_words_mut()[i] = bits;
            i += 1;
        }
        true
    }

    /// Returns `true` (meaning "bail out of this vector") if the bit reader
    /// has latched an error. At position 0 a clean EOF is cleared rather
    /// than left sticky, since it's not truncation.
    fn bail_on_eof(&mut self, i: usize) -> bool {
        if self.reader.err().is_none() {
            return false;
        }
        if i == 0 && matches!(self.reader.err(), Some(BitIoError::UnexpectedEof)) {
            self.reader.clear_eof();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    fn encode(span: usize, vectors: &[Vec<f64>]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf, span);
        for v in vectors {
            enc.put(&Vec64::from_f64(v)).unwrap();
        }
        enc.close().unwrap();
        buf
    }

    fn decode_all(span: usize, bytes: &[u8]) -> (Vec<Vec<f64>>, Option<DecodeError>) {
        let mut dec = Decoder::new(bytes, span);
        let mut out = Vec::new();
        while dec.next() {
            out.push(dec.current().to_f64_vec());
        }
        (out, dec.err().cloned())
    }

    #[test]
    fn s1_exact_roundtrip() {
        let vectors = vec![vec![1.0, 2.0], vec![1.0, 2.0]];
        let bytes = encode(2, &vectors);
        let (decoded, err) = decode_all(2, &bytes);
        assert!(err.is_none());
        assert_eq!(decoded, vectors);
    }

    #[test]
    fn s2_truncated_first_vector_is_truncation_error() {
        // span=2: only 8 bytes (one word) of a 2-word first vector.
        let mut dec = Decoder::new(&[0u8; 8][..], 2);
        assert!(!dec.next());
        assert!(matches!(dec.err(), Some(DecodeError::Io(BitIoError::UnexpectedEof))));
    }

    #[test]
    fn s3_truncated_delta_vector() {
        // span=10: 10 consecutive 8-byte words (valid first vector) followed
        // by a single stray 0xFF byte then end of stream.
        let mut bytes = Vec::new();
        for w in 0u64..10 {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
        bytes.push(0xFF);

        let mut dec = Decoder::new(bytes.as_slice(), 10);
        assert!(dec.next());
        assert!(!dec.next());
        assert!(matches!(dec.err(), Some(DecodeError::Io(BitIoError::UnexpectedEof))));
    }

    #[test]
    fn empty_stream_yields_no_vectors_and_no_error() {
        let mut dec = Decoder::new(&[][..], 4);
        assert!(!dec.next());
        assert!(dec.err().is_none());
    }

    #[test]
    fn concatenated_streams_resynchronize() {
        let span = 3;
        let xs = vec![vec![1.0, 2.0, 3.0], vec![1.5, 2.5, 3.5]];
        let ys = vec![vec![9.0, 9.0, 9.0], vec![10.0, 11.0, 12.0]];

        let mut combined = encode(span, &xs);
        combined.extend(encode(span, &ys));

        let (decoded, err) = decode_all(span, &combined);
        assert!(err.is_none());
        let mut expected = xs;
        expected.extend(ys);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn partial_vector_at_eof_is_an_error() {
        // First vector, then position 0 repeats, then the reserved EOF
        // header is jammed into position 1 instead of position 0.
        let span = 2;
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf, span);
        enc.put(&Vec64::from_f64(&[1.0, 2.0])).unwrap();
        drop(enc);

        let mut bytes = buf;
        let mut w = crate::bitio::BitWriter::new(Vec::new());
        w.write_bool(true); // position 0: repeat
        w.write_bool(false); // position 1: ctl0 = changed
        w.write_bool(false); // position 1: ctl1 = new window
        w.write_bits(0b111111_111111, 12); // reserved EOF header
        w.close().unwrap();
        bytes.extend(w.into_sink());

        let mut dec = Decoder::new(bytes.as_slice(), span);
        assert!(dec.next());
        assert!(!dec.next());
        assert!(matches!(dec.err(), Some(DecodeError::PartialVector)));
    }
}
