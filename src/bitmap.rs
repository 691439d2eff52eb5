use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::iter::FusedIterator;

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Number of slots held by one storage word.
pub const WORD_BITS: u64 = u64::BITS as u64;

/// Computes the number of 64-bit words one plane needs for `size` slots.
///
/// # Examples
/// ```
/// use bit_sliced::words_for;
///
/// assert_eq!(words_for(0), 0);
/// assert_eq!(words_for(64), 1);
/// assert_eq!(words_for(65), 2);
/// ```
pub const fn words_for(size: u64) -> u64 {
    size.div_ceil(WORD_BITS)
}

/// Splits a slot id into its word index and the single-bit mask inside that
/// word.
#[inline]
pub(crate) const fn locate(id: u64) -> (usize, u64) {
    ((id / WORD_BITS) as usize, 1 << (id % WORD_BITS))
}

/// Bit `j` of `value`, with every position past the width of `u64` reading
/// as zero.
#[inline]
pub(crate) const fn value_bit(value: u64, j: usize) -> u64 {
    if j < u64::BITS as usize {
        (value >> j) & 1
    } else {
        0
    }
}

/// A bit-sliced bitmap: `depth` value planes plus one existence plane over
/// `size` slots.
///
/// Plane `j < depth` holds bit `j` of every slot's value. Plane `depth` is
/// the existence plane; a set bit means the slot has a recorded value. All
/// planes live in one plane-major allocation of `(depth + 1) * word_count`
/// words, plane `i` covering words `[i * word_count, (i + 1) * word_count)`.
///
/// Cloning copies the whole allocation; nothing is shared between a bitmap
/// and its clone.
#[derive(PartialEq, Eq, Hash)]
pub struct BitSlicedBitmap {
    depth: usize,
    size: u64,
    word_count: usize,
    words: Vec<u64>,
}

impl BitSlicedBitmap {
    /// Creates an empty bitmap holding values of `depth` bits for `size`
    /// slots.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the backing buffer size cannot be
    /// represented.
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::BitSlicedBitmap;
    ///
    /// let bm = BitSlicedBitmap::new(6, 100).unwrap();
    /// assert_eq!(bm.word_count(), 2);
    /// assert_eq!(bm.words().len(), 7 * 2);
    /// assert_eq!(bm.get(3), None);
    /// ```
    pub fn new(depth: usize, size: u64) -> Result<Self> {
        let invalid = Error::InvalidArgument { depth, size };
        let word_count = usize::try_from(words_for(size)).map_err(|_| invalid)?;
        let total = depth
            .checked_add(1)
            .and_then(|planes| planes.checked_mul(word_count))
            .ok_or(invalid)?;
        // a Vec may not span more than isize::MAX bytes
        match total.checked_mul(size_of::<u64>()) {
            Some(bytes) if bytes <= isize::MAX as usize => {}
            _ => return Err(invalid),
        }

        debug!(depth, size, word_count, "allocating bit-sliced bitmap");
        Ok(Self {
            depth,
            size,
            word_count,
            words: vec![0; total],
        })
    }

    /// Number of value bits stored per slot.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of addressable slots.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of words in each plane.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// The whole backing allocation, plane by plane.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Returns plane `j`. Plane `depth()` is the existence plane.
    ///
    /// # Panics
    /// Panics if `j > depth()`.
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::BitSlicedBitmap;
    ///
    /// let bm = BitSlicedBitmap::new(2, 128)
    ///     .unwrap()
    ///     .splat_naive(&[1], &[0b10])
    ///     .unwrap();
    /// assert_eq!(bm.plane(0), &[0, 0]);
    /// assert_eq!(bm.plane(1), &[0b10, 0]);
    /// assert_eq!(bm.plane(2), bm.existence());
    /// ```
    #[inline]
    pub fn plane(&self, j: usize) -> &[u64] {
        let range = self.plane_range(j);
        &self.words[range]
    }

    /// Mutable access to plane `j` for an owner writing bits directly.
    ///
    /// # Panics
    /// Panics if `j > depth()`.
    #[inline]
    pub fn plane_mut(&mut self, j: usize) -> &mut [u64] {
        let range = self.plane_range(j);
        &mut self.words[range]
    }

    /// The existence plane.
    #[inline]
    pub fn existence(&self) -> &[u64] {
        self.plane(self.depth)
    }

    /// Returns `true` if slot `id` has a recorded value.
    ///
    /// # Panics
    /// Panics if `id >= size()`.
    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        assert!(id < self.size, "Slot id {id} out of bounds");
        let (word, mask) = locate(id);
        self.existence()[word] & mask != 0
    }

    /// Reconstructs the value stored for `id`, or `None` when the slot has no
    /// recorded value.
    ///
    /// Planes past bit 63 cannot contribute to a `u64` and are ignored.
    ///
    /// # Panics
    /// Panics if `id >= size()`.
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::BitSlicedBitmap;
    ///
    /// let bm = BitSlicedBitmap::new(4, 10)
    ///     .unwrap()
    ///     .splat_batched(&[2, 7], &[9, 0x35])
    ///     .unwrap();
    /// assert_eq!(bm.get(2), Some(9));
    /// assert_eq!(bm.get(7), Some(0x5)); // truncated to 4 bits
    /// assert_eq!(bm.get(8), None);
    /// ```
    pub fn get(&self, id: u64) -> Option<u64> {
        if !self.contains(id) {
            return None;
        }
        let (word, mask) = locate(id);
        let value = (0..self.depth.min(u64::BITS as usize))
            .filter(|&j| self.plane(j)[word] & mask != 0)
            .fold(0u64, |acc, j| acc | 1u64 << j);
        Some(value)
    }

    /// Returns an iterator over `(id, value)` for every slot with a recorded
    /// value, in ascending id order.
    ///
    /// # Examples
    /// ```
    /// use bit_sliced::BitSlicedBitmap;
    ///
    /// let bm = BitSlicedBitmap::new(8, 300)
    ///     .unwrap()
    ///     .splat_naive(&[250, 4], &[1, 2])
    ///     .unwrap();
    /// let pairs: Vec<_> = bm.iter().collect();
    /// assert_eq!(pairs, [(4, 2), (250, 1)]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            bitmap: self,
            word_idx: 0,
            current: self.existence().first().copied().unwrap_or(0),
        }
    }

    /// Number of slots with a recorded value.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no slot has a recorded value.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Mutable view of the whole allocation for the splat algorithms.
    #[inline]
    pub(crate) fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    #[inline]
    fn plane_range(&self, j: usize) -> core::ops::Range<usize> {
        assert!(
            j <= self.depth,
            "Plane {j} out of bounds for depth {}",
            self.depth
        );
        j * self.word_count..(j + 1) * self.word_count
    }
}

impl Clone for BitSlicedBitmap {
    fn clone(&self) -> Self {
        trace!(words = self.words.len(), "cloning bit-sliced bitmap");
        Self {
            depth: self.depth,
            size: self.size,
            word_count: self.word_count,
            words: self.words.clone(),
        }
    }
}

impl Debug for BitSlicedBitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "BitSlicedBitmap(depth: {}, size: {}, words/plane: {})",
            self.depth, self.size, self.word_count
        )?;
        for j in 0..=self.depth {
            if j == self.depth {
                write!(f, "  exists:")?;
            } else {
                write!(f, "  {j:>6}:")?;
            }
            for word in self.plane(j) {
                write!(f, " {word:016x}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<'bitmap> IntoIterator for &'bitmap BitSlicedBitmap {
    type Item = (u64, u64);
    type IntoIter = Iter<'bitmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the `(id, value)` pairs of present slots.
///
/// Returned by [`BitSlicedBitmap::iter()`].
#[derive(Clone, Copy)]
pub struct Iter<'bitmap> {
    bitmap: &'bitmap BitSlicedBitmap,
    word_idx: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let existence = self.bitmap.existence();
        while self.word_idx < existence.len() {
            if self.current != 0 {
                let tz = u64::from(self.current.trailing_zeros());
                let id = self.word_idx as u64 * WORD_BITS + tz;
                if id >= self.bitmap.size {
                    self.current = 0;
                    return None;
                }
                self.current &= self.current - 1; // unset LSB
                let value = self.bitmap.get(id)?;
                return Some((id, value));
            }

            self.word_idx += 1;
            self.current = existence.get(self.word_idx).copied().unwrap_or(0);
        }
        None
    }
}

impl FusedIterator for Iter<'_> {}
