//! Background drain helper: repeatedly decodes vectors and delivers them on
//! a bounded channel, respecting cancellation.
//!
//! Grounded on the reference implementation's `EnumBorrow(ctx, out, pool)`,
//! adapted from a goroutine + `context.Context` to a `std::thread` +
//! `mpsc::sync_channel` + `Arc<AtomicBool>`, since no async runtime appears
//! anywhere in this codebase's dependency set.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;

use crate::decoder::Decoder;
use crate::error::DrainError;
use crate::vector::{Vec64, VecPool};

/// A handle used to request cancellation of an in-flight drain.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Observed by the drain loop between vectors.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains `decoder` into `out`, copying each decoded vector into a buffer
/// borrowed from `pool`. Returns `Ok(())` on clean end-of-stream, or the
/// decode/cancellation error that ended the drain early.
///
/// Checks `cancel` between vectors (not mid-decode) and before blocking to
/// send on `out`.
pub fn enum_borrow<R: Read>(
    decoder: &mut Decoder<R>,
    cancel: &CancelToken,
    out: &SyncSender<Vec64>,
    pool: &VecPool,
) -> Result<(), DrainError> {
    while decoder.next() {
        if cancel.is_cancelled() {
            return Err(DrainError::Cancelled);
        }

        let mut carrier = pool.get();
        carrier.copy_from_words(decoder.current().as_words());

        loop {
            if cancel.is_cancelled() {
                pool.put(carrier);
                return Err(DrainError::Cancelled);
            }
            match out.try_send(carrier) {
                Ok(()) => break,
                Err(TrySendError::Full(v)) => {
                    carrier = v;
                    std::thread::yield_now();
                }
                Err(TrySendError::Disconnected(v)) => {
                    pool.put(v);
                    log::warn!("drain: receiver disconnected");
                    return Err(DrainError::Cancelled);
                }
            }
        }
    }

    if let Some(e) = decoder.err() {
        return Err(DrainError::Decode(e.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use std::sync::mpsc::sync_channel;

    fn encode(span: usize, vectors: &[Vec<f64>]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf, span);
        for v in vectors {
            enc.put(&Vec64::from_f64(v)).unwrap();
        }
        enc.close().unwrap();
        buf
    }

    #[test]
    fn drains_all_vectors_in_order() {
        let span = 2;
        let vectors = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let bytes = encode(span, &vectors);

        let mut dec = Decoder::new(bytes.as_slice(), span);
        let pool = VecPool::new(span);
        let (tx, rx) = sync_channel(1);
        let cancel = CancelToken::new();

        let handle = std::thread::scope(|s| {
            let h = s.spawn(|| enum_borrow(&mut dec, &cancel, &tx, &pool));
            let mut received = Vec::new();
            for v in rx.iter() {
                received.push(v.to_f64_vec());
                pool.put(v);
            }
            (h.join().unwrap(), received)
        });

        let (result, received) = handle;
        assert!(result.is_ok());
        assert_eq!(received, vectors);
    }

    #[test]
    fn cancellation_is_observed_between_vectors() {
        let span = 1;
        let vectors: Vec<Vec<f64>> = (0..1000).map(|i| vec![i as f64]).collect();
        let bytes = encode(span, &vectors);

        let mut dec = Decoder::new(bytes.as_slice(), span);
        let pool = VecPool::new(span);
        let (tx, rx) = sync_channel(0);
        let cancel = CancelToken::new();

        let cancel_for_thread = cancel.clone();
        let result = std::thread::scope(|s| {
            let h = s.spawn(|| enum_borrow(&mut dec, &cancel_for_thread, &tx, &pool));
            // Receive exactly one vector, then cancel.
            let _first = rx.recv().unwrap();
            cancel.cancel();
            // Drain any remaining in-flight sends so the helper isn't stuck.
            while rx.try_recv().is_ok() {}
            h.join().unwrap()
        });

        assert!(matches!(result, Err(DrainError::Cancelled)));
    }
}
