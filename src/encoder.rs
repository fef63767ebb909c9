//! Streaming encoder: compresses a sequence of `Vec64`s into a bit stream.
//!
//! See the crate-level documentation for the wire format. Each position in
//! the vector is compressed independently against its own previous value,
//! using the same three-way repeat/reuse-window/new-window scheme the
//! Gorilla paper uses for values.

use std::io::Write;

use crate::bitio::BitWriter;
use crate::error::EncodeError;
use crate::vector::Vec64;

const SHIFT_SIZE: u8 = 6;
const NUM_VALUE_BITS_SIZE: u8 = 6;
const EOF_SHIFT_BITS: u8 = (1 << SHIFT_SIZE) - 1; // 63
const EOF_NUM_VALUE_BITS: u8 = (1 << NUM_VALUE_BITS_SIZE) - 1; // 63
const FLOAT_BITS: u8 = 64;

/// Sentinel `lead` value meaning "no window established yet"; forces the
/// first non-zero diff at this position to open a new window.
const NO_WINDOW: u8 = 0xFF;

#[derive(Clone, Copy)]
struct ElementState {
    prev_bits: u64,
    lead: u8,
    trail: u8,
}

impl ElementState {
    fn initial() -> Self {
        ElementState { prev_bits: 0, lead: NO_WINDOW, trail: 0 }
    }
}

/// Compresses a sequence of `span`-wide `Vec64`s written over `W`.
pub struct Encoder<W: Write> {
    writer: BitWriter<W>,
    state: Vec<ElementState>,
    first: bool,
}

impl<W: Write> Encoder<W> {
    /// Creates a new encoder for vectors of the given `span`, writing to `sink`.
    pub fn new(sink: W, span: usize) -> Self {
        assert!(span >= 1, "span must be at least 1");
        Encoder {
            writer: BitWriter::new(sink),
            state: vec![ElementState::initial(); span],
            first: true,
        }
    }

    /// Span this encoder was constructed with.
    pub fn span(&self) -> usize {
        self.state.len()
    }

    /// Rebinds this encoder to a new sink, resetting all per-position window
    /// state without reallocating the state vector.
    pub fn reset(&mut self, sink: W) {
        for s in self.state.iter_mut() {
            *s = ElementState::initial();
        }
        self.writer = BitWriter::new(sink);
        self.first = true;
    }

    /// Encodes one vector. `vec.len()` must equal `span`.
    pub fn put(&mut self, vec: &Vec64) -> Result<(), EncodeError> {
        if vec.len() != self.state.len() {
            return Err(EncodeError::BadArity { expected: self.state.len(), got: vec.len() });
        }

        if self.first {
            for (i, &bits) in vec.as_words().iter().enumerate() {
                self.writer.write_bits(bits, FLOAT_BITS);
                self.state[i].prev_bits = bits;
            }
            self.first = false;
            return self.flush_err();
        }

        for (i, &xbits) in vec.as_words().iter().enumerate() {
            let diff = xbits ^ self.state[i].prev_bits;
            let ctl0 = diff == 0;
            self.writer.write_bool(ctl0);
            if ctl0 {
                continue;
            }

            let leading = diff.leading_zeros() as u8;
            let trailing = diff.trailing_zeros() as u8;
            // Wrapping: mirrors Go's uint8 wraparound when `lead` is still the
            // `NO_WINDOW` sentinel (no window opened yet at this position).
            let num_value_bits =
                FLOAT_BITS.wrapping_sub(self.state[i].lead).wrapping_sub(self.state[i].trail);
            let new_num_value_bits = FLOAT_BITS - leading - trailing;
            let size_new_win = SHIFT_SIZE + NUM_VALUE_BITS_SIZE + new_num_value_bits;
            let ctl1 = trailing >= self.state[i].trail
                && leading >= self.state[i].lead
                && num_value_bits <= size_new_win;
            self.writer.write_bool(ctl1);

            if ctl1 {
                self.writer.write_bits(diff >> self.state[i].trail, num_value_bits);
                self.state[i].prev_bits = xbits;
                continue;
            }

            let encoded_num_value_bits = new_num_value_bits - 1;
            if trailing == EOF_SHIFT_BITS && encoded_num_value_bits == EOF_NUM_VALUE_BITS {
                return Err(EncodeError::ReservedEofWindow);
            }
            log::trace!(
                "position {i}: opening new window (trailing={trailing}, value_bits={new_num_value_bits})"
            );
            let window =
                (u64::from(trailing) << NUM_VALUE_BITS_SIZE) | u64::from(encoded_num_value_bits);
            self.writer.write_bits(window, SHIFT_SIZE + NUM_VALUE_BITS_SIZE);
            self.writer.write_bits(diff >> trailing, new_num_value_bits);
            self.state[i].lead = leading;
            self.state[i].trail = trailing;
            self.state[i].prev_bits = xbits;
        }

        self.flush_err()
    }

    /// Writes the EOF marker and flushes the final byte to the sink.
    pub fn close(mut self) -> Result<W, EncodeError> {
        const NUM_CONTROL_BITS: u8 = 2;
        const EOF_BITS: u64 =
            (EOF_NUM_VALUE_BITS as u64) | ((EOF_SHIFT_BITS as u64) << NUM_VALUE_BITS_SIZE);
        self.writer
            .write_bits(EOF_BITS, NUM_CONTROL_BITS + SHIFT_SIZE + NUM_VALUE_BITS_SIZE);
        self.writer.close().map_err(EncodeError::Io)?;
        Ok(self.writer.into_sink())
    }

    fn flush_err(&self) -> Result<(), EncodeError> {
        match self.writer.err() {
            Some(e) => Err(EncodeError::Io(e.clone())),
            None => Ok(()),
        }
    }
}
