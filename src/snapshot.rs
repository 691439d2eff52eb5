use alloc::sync::Arc;

use spin::{Mutex, RwLock};
use tracing::trace;

use crate::bitmap::BitSlicedBitmap;
use crate::error::Result;
use crate::splat::Strategy;

/// Holds the published version of a bitmap.
///
/// Readers call [`load`] and keep reading the returned snapshot for as long
/// as they like; later publications never change it. Building a new version
/// (a splat) and making it visible ([`publish`]) are separate steps, and the
/// swap itself happens under a short write lock so no reader ever observes a
/// half-built bitmap.
///
/// # Examples
/// ```
/// use bit_sliced::{BitSlicedBitmap, SnapshotCell, Strategy};
///
/// let cell = SnapshotCell::new(BitSlicedBitmap::new(4, 128).unwrap());
/// let before = cell.load();
///
/// cell.update(Strategy::Batched, &[10, 11], &[7, 8]).unwrap();
///
/// assert_eq!(before.get(10), None);
/// assert_eq!(cell.load().get(10), Some(7));
/// ```
///
/// [`load`]: SnapshotCell::load
/// [`publish`]: SnapshotCell::publish
pub struct SnapshotCell {
    current: RwLock<Arc<BitSlicedBitmap>>,
    writer: Mutex<()>,
}

impl SnapshotCell {
    /// Creates a cell whose first published version is `bitmap`.
    pub fn new(bitmap: BitSlicedBitmap) -> Self {
        Self {
            current: RwLock::new(Arc::new(bitmap)),
            writer: Mutex::new(()),
        }
    }

    /// Returns the currently published version.
    #[inline]
    pub fn load(&self) -> Arc<BitSlicedBitmap> {
        Arc::clone(&self.current.read())
    }

    /// Makes `bitmap` the published version and returns the one it replaced.
    pub fn publish(&self, bitmap: BitSlicedBitmap) -> Arc<BitSlicedBitmap> {
        let next = Arc::new(bitmap);
        let previous = core::mem::replace(&mut *self.current.write(), next);
        trace!(
            readers = Arc::strong_count(&previous) - 1,
            "published new bitmap version"
        );
        previous
    }

    /// Splats the batch onto the published version and publishes the result.
    ///
    /// Concurrent updates are serialized so none of them is lost. Readers are
    /// never blocked by the splat itself, only by the final swap.
    ///
    /// # Errors
    /// Propagates the splat's validation error; nothing is published then.
    pub fn update(
        &self,
        strategy: Strategy,
        ids: &[u64],
        values: &[u64],
    ) -> Result<Arc<BitSlicedBitmap>> {
        let _writer = self.writer.lock();
        let next = self.load().splat(strategy, ids, values)?;
        self.publish(next);
        Ok(self.load())
    }

    /// Consumes the cell and returns the published version.
    pub fn into_inner(self) -> Arc<BitSlicedBitmap> {
        self.current.into_inner()
    }
}

impl core::fmt::Debug for SnapshotCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotCell")
            .field("current", &*self.load())
            .finish()
    }
}
