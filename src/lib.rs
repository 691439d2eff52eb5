//! A bit-sliced bitmap written in pure Rust.
//! `no_std` with `alloc`, no `unsafe`.
//!
//! A [`BitSlicedBitmap`] stores, for each of `size` slots, an optional
//! unsigned value of up to `depth` bits. Instead of one array of integers it
//! keeps `depth + 1` bitplanes: plane `j` holds bit `j` of every value, and the
//! last plane records which slots hold a value at all.
//!
//! The structure supports one pattern: construct, snapshot, bulk-update.
//! Every update ("splat") returns a fresh copy and leaves the receiver
//! untouched, so older versions stay readable while a new one is built.
//!
//! # Examples
//! ```
//! use bit_sliced::BitSlicedBitmap;
//!
//! let empty = BitSlicedBitmap::new(6, 64).unwrap();
//! let ids: Vec<u64> = (0..64).collect();
//! let bm = empty.splat_batched(&ids, &ids).unwrap();
//!
//! assert_eq!(bm.plane(0), &[0xAAAA_AAAA_AAAA_AAAA]);
//! assert_eq!(bm.existence(), &[u64::MAX]);
//! assert_eq!(bm.get(42), Some(42));
//! assert!(empty.is_empty());
//! ```
//!
//! # Features
//!
//! - Single plane-major allocation of `(depth + 1) * ceil(size / 64)` words
//! - Two interchangeable update algorithms, see [`Strategy`]:
//!   - `splat_naive` (any id order, one write per plane per id)
//!   - `splat_batched` (ids grouped by word, one write per plane per word)
//! - Batch validation before any copy is made ([`Error`])
//! - [`SnapshotCell`] for publishing new versions to concurrent readers
//! - Structured events through `tracing`

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod bitmap;
mod error;
mod snapshot;
mod splat;
#[cfg(test)]
mod tests_splat;

pub use bitmap::{BitSlicedBitmap, Iter, WORD_BITS, words_for};
pub use error::{Error, Result};
pub use snapshot::SnapshotCell;
pub use splat::Strategy;
