//! # vecxor
//!
//! A streaming codec for sequences of fixed-width vectors of 64-bit IEEE-754
//! floats, generalizing Facebook's Gorilla time-series compressor
//! (*"Gorilla: A Fast, Scalable, In-Memory Time Series Database"*, VLDB 2015)
//! from a single value per tick to an arbitrary-width vector per tick, with
//! each position in the vector compressed independently against its own
//! history.
//!
//! ## Algorithm overview
//!
//! Gorilla's value encoding exploits the fact that adjacent floating-point
//! readings are frequently identical or close: a diff computed by XOR-ing
//! consecutive bit patterns tends to have long runs of leading and trailing
//! zero bits. This crate encodes each vector position's diff against its own
//! previous value using three cases, cheapest first:
//!
//! - **Repeat** (`1`): this position is unchanged from the last vector.
//! - **Reuse window** (`01` + significant bits): the diff fits inside the
//!   leading/trailing zero window already in use for this position.
//! - **New window** (`00` + 6-bit left shift + 6-bit value-bit count +
//!   significant bits): the window is widened to fit this diff.
//!
//! A reserved window header (shift and bit-count both `63`) marks the end of
//! a stream; reading one path-reuses [`decoder::Decoder`] to resynchronize
//! onto an immediately following stream, so independently encoded streams can
//! be concatenated and decoded in one pass.
//!
//! ## Example
//!
//! ```rust
//! use vecxor::{Decoder, Encoder, Vec64};
//!
//! let span = 3;
//! let mut buf = Vec::new();
//! let mut encoder = Encoder::new(&mut buf, span);
//! encoder.put(&Vec64::from_f64(&[1.0, 2.0, 3.0])).unwrap();
//! encoder.put(&Vec64::from_f64(&[1.0, 2.5, 3.0])).unwrap();
//! encoder.close().unwrap();
//!
//! let mut decoder = Decoder::new(buf.as_slice(), span);
//! let mut points = Vec::new();
//! while decoder.next() {
//!     points.push(decoder.current().to_f64_vec());
//! }
//! assert!(decoder.err().is_none());
//! assert_eq!(points, vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.5, 3.0]]);
//! ```
//!
//! ## Lossy quantization
//!
//! [`quantize::lossy_float64`] zeros as many trailing mantissa bits as
//! possible while keeping a value within a caller-supplied absolute error
//! bound, which in turn widens the zero windows the encoder above can reuse.
//!
//! ## Background draining
//!
//! [`drain::enum_borrow`] decodes a stream on a background thread, handing
//! off each vector over a bounded channel while recycling buffers through a
//! [`vector::VecPool`], mirroring the reference implementation's pooled
//! consumer pattern.

pub mod bitio;
pub mod decoder;
pub mod drain;
pub mod encoder;
pub mod error;
pub mod quantize;
pub mod vector;

pub use decoder::Decoder;
pub use drain::{enum_borrow, CancelToken};
pub use encoder::Encoder;
pub use error::{BitIoError, DecodeError, DrainError, EncodeError};
pub use quantize::lossy_float64;
pub use vector::{Vec64, VecPool};
