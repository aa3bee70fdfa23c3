//! Set of child slots already claimed by a parent.
//!
//! Owned by one run and passed to the resolver by reference. Each slot is an
//! atomic flag, so `try_claim` is an atomic insert-if-absent: of any number of
//! concurrent claims on one child, exactly one succeeds.

use crate::index::ChildSlot;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct ExclusivitySet {
    claimed: Vec<AtomicBool>,
    count: AtomicUsize,
}

impl ExclusivitySet {
    /// Empty set for children `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            claimed: (0..capacity).map(|_| AtomicBool::new(false)).collect(),
            count: AtomicUsize::new(0),
        }
    }

    /// Claim `slot`. Returns `true` only for the first claim.
    ///
    /// Slots outside the capacity are never claimable.
    pub fn try_claim(&self, slot: ChildSlot) -> bool {
        let Some(flag) = self.claimed.get(slot) else {
            return false;
        };
        let won = flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
        won
    }

    pub fn is_claimed(&self, slot: ChildSlot) -> bool {
        self.claimed
            .get(slot)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    pub fn claimed_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.claimed.len()
    }

    /// Release every claim.
    pub fn clear(&mut self) {
        for flag in &mut self.claimed {
            *flag.get_mut() = false;
        }
        *self.count.get_mut() = 0;
    }
}

impl std::fmt::Debug for ExclusivitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusivitySet")
            .field("capacity", &self.capacity())
            .field("claimed", &self.claimed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_claim_once() {
        let set = ExclusivitySet::with_capacity(4);
        assert!(set.try_claim(2));
        assert!(!set.try_claim(2));
        assert!(set.is_claimed(2));
        assert!(!set.is_claimed(1));
        assert_eq!(set.claimed_count(), 1);
    }

    #[test]
    fn test_out_of_range_slot() {
        let set = ExclusivitySet::with_capacity(1);
        assert!(!set.try_claim(5));
        assert!(!set.is_claimed(5));
        assert_eq!(set.claimed_count(), 0);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let set = ExclusivitySet::with_capacity(64);
        let wins: usize = (0..1024usize)
            .into_par_iter()
            .filter(|i| set.try_claim(i % 64))
            .count();
        assert_eq!(wins, 64);
        assert_eq!(set.claimed_count(), 64);
    }

    #[test]
    fn test_clear() {
        let mut set = ExclusivitySet::with_capacity(3);
        set.try_claim(0);
        set.try_claim(1);
        set.clear();
        assert_eq!(set.claimed_count(), 0);
        assert!(set.try_claim(0));
    }
}
