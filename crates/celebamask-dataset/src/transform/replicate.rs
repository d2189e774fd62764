use std::marker::PhantomData;

use derive_new::new;

use crate::Dataset;

/// Presents a dataset as if it had at least `min_size` items by wrapping
/// indices modulo the source length.
///
/// Training loops that draw a fixed `batch size × device count` number of
/// samples per step never run out of indices this way: set `min_size` to that
/// product and indices past the real size cycle back to the start. With
/// `min_size` at or below the source length the wrapper is a no-op.
#[derive(new)]
pub struct ReplicateDataset<D, I> {
    dataset: D,
    min_size: usize,
    input: PhantomData<I>,
}

impl<D, I> Dataset<I> for ReplicateDataset<D, I>
where
    D: Dataset<I>,
    I: Send + Sync,
{
    fn get(&self, index: usize) -> Option<I> {
        if index >= self.len() || self.dataset.is_empty() {
            return None;
        }

        self.dataset.get(index % self.dataset.len())
    }

    fn len(&self) -> usize {
        usize::max(self.dataset.len(), self.min_size)
    }
}
