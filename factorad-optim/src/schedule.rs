/// Gates the diagonal of one parameter so its entries become trainable one
/// at a time, in index order.
///
/// At iteration `i` the first `min(i / interval, n)` diagonal entries may
/// update; the rest stay at their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagonalUnlock {
    /// Index of the gated parameter in the optimizer's parameter list.
    pub parameter: usize,
    /// Iterations between successive unlocks.
    pub interval: usize,
}

impl DiagonalUnlock {
    pub fn new(parameter: usize, interval: usize) -> Self {
        DiagonalUnlock {
            parameter,
            interval,
        }
    }

    /// Number of diagonal entries trainable at `iteration` for an `n × n`
    /// parameter. A zero interval unlocks everything immediately.
    pub fn unlocked_count(&self, iteration: usize, n: usize) -> usize {
        match iteration.checked_div(self.interval) {
            Some(k) => k.min(n),
            None => n,
        }
    }

    /// Whether diagonal entry `d` may update at `iteration`.
    #[inline]
    pub fn is_unlocked(&self, d: usize, iteration: usize, n: usize) -> bool {
        d < self.unlocked_count(iteration, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocks_in_index_order() {
        let s = DiagonalUnlock::new(1, 1000);
        assert_eq!(s.unlocked_count(0, 3), 0);
        assert_eq!(s.unlocked_count(999, 3), 0);
        assert_eq!(s.unlocked_count(1000, 3), 1);
        assert_eq!(s.unlocked_count(2500, 3), 2);
        assert_eq!(s.unlocked_count(1_000_000, 3), 3);
        assert!(s.is_unlocked(0, 1000, 3));
        assert!(!s.is_unlocked(1, 1000, 3));
    }

    #[test]
    fn zero_interval_unlocks_all() {
        assert_eq!(DiagonalUnlock::new(0, 0).unlocked_count(0, 4), 4);
    }
}
