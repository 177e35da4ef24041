//! Collation: variable-length examples → one fixed-shape, padded batch.
//! Shapes: id matrices [B, T], seasonal [B, T, 4], vectors [B]; T is this batch's longest history.

use crate::error::{PipelineError, Result};
use crate::sequence::{SupervisedExample, SEASONAL_DIM};
use crate::vocab::{SharedVocabulary, Vocabulary, PAD_ID};
use ndarray::{Array1, Array2, Array3};

/// Padded numeric batch; row `i` of every array belongs to input example `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub action_hist: Array2<i64>,
    pub product_hist: Option<Array2<i64>>,
    pub seasonal: Array3<f32>,
    pub lengths: Array1<i64>,
    pub target_actions: Array1<i64>,
    pub target_products: Option<Array1<i64>>,
}

impl Batch {
    pub fn batch_size(&self) -> usize {
        self.action_hist.nrows()
    }

    pub fn max_len(&self) -> usize {
        self.action_hist.ncols()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Collator {
    grow: bool,
}

impl Collator {
    /// `grow` applies to history and target tokens alike
    pub fn new(grow: bool) -> Self {
        Self { grow }
    }

    pub fn grows(&self) -> bool {
        self.grow
    }

    /// Collate `examples` in order. Product arrays are produced only when `products` is given.
    ///
    /// Every example is checked before any vocabulary is touched, so a failed call leaves
    /// the vocabularies as they were.
    pub fn collate(
        &self,
        examples: &[SupervisedExample],
        actions: &mut Vocabulary,
        mut products: Option<&mut Vocabulary>,
    ) -> Result<Batch> {
        if examples.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        for (index, ex) in examples.iter().enumerate() {
            check_parallel(index, ex)?;
        }

        let batch_size = examples.len();
        let max_len = examples
            .iter()
            .map(SupervisedExample::history_len)
            .max()
            .unwrap_or(0);
        let pad = i64::from(PAD_ID);

        let mut action_hist = Array2::from_elem((batch_size, max_len), pad);
        let mut seasonal = Array3::<f32>::zeros((batch_size, max_len, SEASONAL_DIM));
        let mut lengths = Array1::<i64>::zeros(batch_size);
        let mut target_actions = Array1::<i64>::zeros(batch_size);
        let mut product_hist = products
            .as_ref()
            .map(|_| Array2::from_elem((batch_size, max_len), pad));
        let mut target_products = products.as_ref().map(|_| Array1::from_elem(batch_size, pad));

        for (i, ex) in examples.iter().enumerate() {
            let ids = actions.encode(&ex.history_actions, self.grow);
            for (j, id) in ids.iter().enumerate() {
                action_hist[[i, j]] = i64::from(*id);
            }
            lengths[i] = ids.len() as i64;
            target_actions[i] =
                i64::from(actions.assign_or_lookup(Some(ex.target_action.as_str()), self.grow));

            for (j, feats) in ex.history_seasonal.iter().enumerate() {
                for (k, v) in feats.iter().enumerate() {
                    seasonal[[i, j, k]] = *v;
                }
            }

            if let (Some(vocab), Some(hist), Some(targets), Some(past)) = (
                products.as_deref_mut(),
                product_hist.as_mut(),
                target_products.as_mut(),
                ex.history_products.as_ref(),
            ) {
                let ids = vocab.encode_optional(past, self.grow);
                for (j, id) in ids.iter().enumerate() {
                    hist[[i, j]] = i64::from(*id);
                }
                targets[i] = i64::from(vocab.assign_or_lookup(ex.target_product.as_deref(), self.grow));
            }
        }

        Ok(Batch {
            action_hist,
            product_hist,
            seasonal,
            lengths,
            target_actions,
            target_products,
        })
    }

    /// Same as [`Collator::collate`] over shared vocabularies. The two write locks are taken
    /// in address order, whichever role each handle plays. The two handles must not point at
    /// the same vocabulary.
    pub fn collate_shared(
        &self,
        examples: &[SupervisedExample],
        actions: &SharedVocabulary,
        products: Option<&SharedVocabulary>,
    ) -> Result<Batch> {
        if products.map(|p| p.same_as(actions)).unwrap_or(false) {
            return Err(PipelineError::Config(
                "action and product vocabularies must be distinct".to_string(),
            ));
        }
        let (mut action_guard, mut product_guard) = match products {
            Some(p) if p.lock_order() < actions.lock_order() => {
                let product_guard = p.write();
                (actions.write(), Some(product_guard))
            }
            Some(p) => {
                let action_guard = actions.write();
                (action_guard, Some(p.write()))
            }
            None => (actions.write(), None),
        };
        self.collate(examples, &mut action_guard, product_guard.as_deref_mut())
    }
}

fn check_parallel(index: usize, ex: &SupervisedExample) -> Result<()> {
    let actions = ex.history_actions.len();
    let seasonal = ex.history_seasonal.len();
    if seasonal != 0 && seasonal != actions {
        return Err(PipelineError::RaggedExample {
            index,
            field: "seasonal",
            actions,
            found: seasonal,
        });
    }
    if let Some(ref products) = ex.history_products {
        if products.len() != actions {
            return Err(PipelineError::RaggedExample {
                index,
                field: "product",
                actions,
                found: products.len(),
            });
        }
    }
    Ok(())
}
