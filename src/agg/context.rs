//! The host-provided surface every aggregation transition/combine call is
//! threaded through: a single PRNG (shared by every skiplist belonging to
//! one aggregate, so results depend only on input order) and a cancellation
//! flag checked at each outer loop iteration of a long-running operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::{Error, Result};

/// Skiplist node levels never exceed this height.
pub const SKIPLIST_MAXLEVEL: u32 = 24;

/// Owns the PRNG and cancellation flag threaded through one aggregate's
/// transition/combine calls. Constructed explicitly by the caller — there
/// is no global mutable state to initialize first.
#[derive(Debug, Clone)]
pub struct AggregationContext {
    rng: ChaCha8Rng,
    cancelled: Arc<AtomicBool>,
}

impl AggregationContext {
    /// A context seeded deterministically: the same seed always produces
    /// the same sequence of skiplist levels for the same input order.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns a per-worker context for parallel aggregation: a fresh,
    /// independently-seeded PRNG (levels are *not* shared across workers)
    /// sharing this context's cancellation flag.
    pub fn fork_worker(&mut self) -> Self {
        let seed = self.rng.next_u64();
        tracing::debug!(seed, "forked aggregation worker context");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        tracing::info!("aggregation context cancelled");
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::OperationCancelled);
        }
        Ok(())
    }

    /// Simulates up to `SKIPLIST_MAXLEVEL` coin flips without spinning the
    /// RNG once per flip: the level is the position of the lowest zero bit
    /// in a `SKIPLIST_MAXLEVEL`-bit draw from the shared PRNG (a draw of
    /// all-ones — vanishingly unlikely — saturates at `SKIPLIST_MAXLEVEL`).
    pub fn random_level(&mut self) -> u32 {
        let mask = (1u64 << SKIPLIST_MAXLEVEL) - 1;
        let bits = !(self.rng.next_u64() & mask);
        let level = bits.trailing_zeros() + 1;
        level.min(SKIPLIST_MAXLEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_the_same_level_sequence() {
        let mut a = AggregationContext::new(42);
        let mut b = AggregationContext::new(42);
        let levels_a: Vec<u32> = (0..50).map(|_| a.random_level()).collect();
        let levels_b: Vec<u32> = (0..50).map(|_| b.random_level()).collect();
        assert_eq!(levels_a, levels_b);
    }

    #[test]
    fn random_level_never_exceeds_the_max() {
        let mut ctx = AggregationContext::new(7);
        for _ in 0..1000 {
            assert!(ctx.random_level() <= SKIPLIST_MAXLEVEL);
            assert!(ctx.random_level() >= 1);
        }
    }

    #[test]
    fn cancellation_flag_is_observed_after_being_set() {
        let ctx = AggregationContext::new(1);
        assert!(ctx.check_cancelled().is_ok());
        ctx.cancel();
        assert!(ctx.check_cancelled().is_err());
    }

    #[test]
    fn forked_workers_share_cancellation_but_not_rng_state() {
        let mut ctx = AggregationContext::new(1);
        let worker = ctx.fork_worker();
        ctx.cancel();
        assert!(worker.check_cancelled().is_err());
    }
}
