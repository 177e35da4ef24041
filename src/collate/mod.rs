//! Batch assembly for numeric training.

mod batch;

pub use batch::{Batch, Collator};

use crate::error::{PipelineError, Result};
use crate::sequence::SupervisedExample;

/// Groups an example stream into chunks of `batch_size`; the last chunk may be shorter.
pub struct Batches<I> {
    examples: I,
    batch_size: usize,
}

impl<I: Iterator<Item = SupervisedExample>> Iterator for Batches<I> {
    type Item = Vec<SupervisedExample>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<_> = self.examples.by_ref().take(self.batch_size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

pub fn batches<I>(examples: I, batch_size: usize) -> Result<Batches<I::IntoIter>>
where
    I: IntoIterator<Item = SupervisedExample>,
{
    if batch_size == 0 {
        return Err(PipelineError::InvalidBatchSize);
    }
    Ok(Batches {
        examples: examples.into_iter(),
        batch_size,
    })
}
