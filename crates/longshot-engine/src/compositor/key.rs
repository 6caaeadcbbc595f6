use core::cmp::Ordering;

use super::ZIndex;

/// Paint-order key for layers.
///
/// `z` ascending (back to front), then `seq` ascending, so layers sharing a
/// z composite in the order they were added.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct SortKey {
    pub z: ZIndex,
    pub seq: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(z: ZIndex, seq: u32) -> Self {
        Self { z, seq }
    }
}

impl Ord for SortKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.z.cmp(&other.z).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for SortKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_dominates_sequence() {
        let back = SortKey::new(ZIndex(0), 9);
        let front = SortKey::new(ZIndex(1), 0);
        assert!(back < front);
    }

    #[test]
    fn sequence_breaks_ties() {
        assert!(SortKey::new(ZIndex(3), 1) < SortKey::new(ZIndex(3), 2));
    }
}
