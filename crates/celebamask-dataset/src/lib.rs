#![warn(missing_docs)]

//! # CelebAMask Dataset
//!
//! Loading, splitting and preprocessing for the CelebAMask face-parsing
//! dataset: paired face images and semantic segmentation masks, yielded as
//! channel-first float tensors ready for a training loop.
//!
//! The crate exposes a small [`Dataset`] abstraction (index in, item out),
//! generic wrappers under [`transform`], and the concrete
//! [`vision::CelebAMaskDataset`] built on top of them. Batching, shuffling
//! and multi-worker prefetching are the responsibility of the surrounding
//! training framework; every method here is reentrant so a batch loader may
//! call [`Dataset::get`] from several workers at once.

mod dataset;

/// Generic dataset wrappers: lazy mapping, length replication, rng options.
pub mod transform;

/// The CelebAMask dataset, its paired augmentation and pixel-level ops.
pub mod vision;

pub use dataset::*;
