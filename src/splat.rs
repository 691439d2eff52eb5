//! Bulk updates ("splats") of a batch of `(id, value)` pairs.
//!
//! Every splat validates the whole batch first, then clones the receiver and
//! writes into the clone. The receiver is never touched, so readers holding it
//! keep a consistent snapshot.
//!
//! Two algorithms produce bit-identical results:
//!
//! - [`BitSlicedBitmap::splat_naive`] does one read-modify-write per plane per
//!   id, `len * (depth + 1)` word writes in total.
//! - [`BitSlicedBitmap::splat_batched`] gathers every id that falls in the
//!   same word and writes each plane word once, `words * (depth + 1)` word
//!   writes where `words` is the number of distinct words touched. It needs
//!   ids grouped by word in ascending order.

use alloc::vec;
use alloc::vec::Vec;

use tracing::debug;

use crate::bitmap::{BitSlicedBitmap, locate, value_bit};
use crate::error::{Error, Result};

/// Selects the algorithm used by [`BitSlicedBitmap::splat`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Per-id, per-plane writes. Accepts ids in any order.
    Naive,
    /// Word-batched writes. Ids must be grouped by word in ascending order.
    #[default]
    Batched,
    /// Stably sorts the batch by id, then runs the batched algorithm. Accepts
    /// ids in any order at the cost of an allocation and an `O(n log n)` sort.
    SortedBatched,
}

impl Strategy {
    /// Short name used in log events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Naive => "naive",
            Strategy::Batched => "batched",
            Strategy::SortedBatched => "sorted_batched",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    Any,
    GroupedByWord,
}

/// Checks a batch against `bitmap` without modifying anything.
fn validate(bitmap: &BitSlicedBitmap, ids: &[u64], values: &[u64], order: Order) -> Result<()> {
    if ids.len() != values.len() {
        return Err(Error::LengthMismatch {
            ids: ids.len(),
            values: values.len(),
        });
    }

    let size = bitmap.size();
    let mut previous: Option<u64> = None;
    for (index, &id) in ids.iter().enumerate() {
        if id >= size {
            return Err(Error::OutOfRange { id, size });
        }
        if order == Order::GroupedByWord {
            if let Some(previous) = previous.filter(|&p| locate(id).0 < locate(p).0) {
                return Err(Error::PreconditionViolation {
                    index,
                    previous,
                    id,
                });
            }
        }
        previous = Some(id);
    }
    Ok(())
}

impl BitSlicedBitmap {
    /// Returns a copy of `self` with `values[i]` stored at `ids[i]` for every
    /// `i`, using the algorithm selected by `strategy`.
    ///
    /// Values are truncated to `depth()` bits. When an id repeats, the last
    /// value wins.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if `ids` and `values` differ in length,
    /// [`Error::OutOfRange`] if any id is `>= size()`, and, for
    /// [`Strategy::Batched`] only, [`Error::PreconditionViolation`] if ids are
    /// not grouped by word in ascending order.
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::{BitSlicedBitmap, Strategy};
    ///
    /// let bm = BitSlicedBitmap::new(3, 200).unwrap();
    /// let next = bm.splat(Strategy::SortedBatched, &[150, 3], &[5, 6]).unwrap();
    /// assert_eq!(next.get(150), Some(5));
    /// assert_eq!(next.get(3), Some(6));
    /// assert!(bm.is_empty());
    /// ```
    pub fn splat(&self, strategy: Strategy, ids: &[u64], values: &[u64]) -> Result<Self> {
        match strategy {
            Strategy::Naive => self.splat_naive(ids, values),
            Strategy::Batched => self.splat_batched(ids, values),
            Strategy::SortedBatched => self.splat_sorted(ids, values),
        }
    }

    /// Per-id splat: for every pair, each value plane word is set or cleared
    /// individually and the existence bit is set.
    ///
    /// Ids may come in any order.
    ///
    /// # Errors
    /// See [`splat`](Self::splat).
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::BitSlicedBitmap;
    ///
    /// let bm = BitSlicedBitmap::new(4, 16).unwrap();
    /// let next = bm.splat_naive(&[9, 1, 9], &[3, 4, 12]).unwrap();
    /// assert_eq!(next.get(1), Some(4));
    /// assert_eq!(next.get(9), Some(12));
    /// ```
    pub fn splat_naive(&self, ids: &[u64], values: &[u64]) -> Result<Self> {
        validate(self, ids, values, Order::Any)?;

        let mut nb = self.clone();
        let depth = nb.depth();
        let stride = nb.word_count();
        let words = nb.words_mut();
        for (&id, &value) in ids.iter().zip(values) {
            let (word, mask) = locate(id);
            for j in 0..depth {
                let target = &mut words[j * stride + word];
                if value_bit(value, j) != 0 {
                    *target |= mask;
                } else {
                    *target &= !mask;
                }
            }
            words[depth * stride + word] |= mask;
        }

        debug!(
            algorithm = Strategy::Naive.as_str(),
            batch = ids.len(),
            plane_writes = ids.len().saturating_mul(depth + 1),
            "splat complete"
        );
        Ok(nb)
    }

    /// Word-batched splat: all pairs landing in the same word are gathered
    /// into one accumulator per plane, which is then written with a single
    /// masked store per plane.
    ///
    /// Ids must be grouped by word in ascending word order; sorted ascending
    /// ids always qualify. Within a word any order is accepted and the last
    /// value for a repeated id wins.
    ///
    /// # Errors
    /// See [`splat`](Self::splat).
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::{BitSlicedBitmap, Error};
    ///
    /// let bm = BitSlicedBitmap::new(2, 256).unwrap();
    /// let next = bm.splat_batched(&[0, 5, 70, 200], &[1, 2, 3, 0]).unwrap();
    /// assert_eq!(next.get(70), Some(3));
    ///
    /// let err = bm.splat_batched(&[70, 5], &[1, 1]).unwrap_err();
    /// assert!(matches!(err, Error::PreconditionViolation { index: 1, .. }));
    /// ```
    pub fn splat_batched(&self, ids: &[u64], values: &[u64]) -> Result<Self> {
        validate(self, ids, values, Order::GroupedByWord)?;

        let mut nb = self.clone();
        let flushed = nb.write_grouped(ids.iter().copied().zip(values.iter().copied()));

        debug!(
            algorithm = Strategy::Batched.as_str(),
            batch = ids.len(),
            plane_writes = flushed.saturating_mul(nb.depth() + 1),
            "splat complete"
        );
        Ok(nb)
    }

    /// Sorts a copy of the batch by id, keeping the relative order of repeated
    /// ids, and runs the batched algorithm on it.
    fn splat_sorted(&self, ids: &[u64], values: &[u64]) -> Result<Self> {
        validate(self, ids, values, Order::Any)?;

        let mut pairs: Vec<(u64, u64)> = ids.iter().copied().zip(values.iter().copied()).collect();
        pairs.sort_by_key(|&(id, _)| id);

        let mut nb = self.clone();
        let flushed = nb.write_grouped(pairs);

        debug!(
            algorithm = Strategy::SortedBatched.as_str(),
            batch = ids.len(),
            plane_writes = flushed.saturating_mul(nb.depth() + 1),
            "splat complete"
        );
        Ok(nb)
    }

    /// Runs the accumulator over pairs already grouped by word and validated.
    /// Returns the number of words flushed.
    fn write_grouped(&mut self, pairs: impl IntoIterator<Item = (u64, u64)>) -> usize {
        let mut set = vec![0u64; self.depth()];
        let mut mask = 0u64;
        let mut current: Option<usize> = None;
        let mut flushed = 0;

        for (id, value) in pairs {
            let (word, bit) = locate(id);
            if current != Some(word) {
                if let Some(previous) = current {
                    self.apply(previous, mask, &mut set);
                    flushed += 1;
                }
                mask = 0;
                current = Some(word);
            }
            for (j, acc) in set.iter_mut().enumerate() {
                if value_bit(value, j) != 0 {
                    *acc |= bit;
                } else {
                    *acc &= !bit;
                }
            }
            mask |= bit;
        }

        if let Some(previous) = current {
            self.apply(previous, mask, &mut set);
            flushed += 1;
        }
        flushed
    }

    /// Writes one accumulated word: in each value plane the bits under `mask`
    /// are replaced by the bits of `set[j]`, which is then zeroed for reuse.
    /// The `mask` bits are set in the existence plane.
    ///
    /// `set[j]` must have no bits outside `mask`.
    pub(crate) fn apply(&mut self, word: usize, mask: u64, set: &mut [u64]) {
        let depth = self.depth();
        let stride = self.word_count();
        debug_assert_eq!(set.len(), depth);

        let words = self.words_mut();
        for (j, acc) in set.iter_mut().enumerate() {
            debug_assert_eq!(*acc & !mask, 0, "accumulator bits outside mask");
            let target = &mut words[j * stride + word];
            *target = (*target & !mask) | *acc;
            *acc = 0;
        }
        words[depth * stride + word] |= mask;
    }
}
