// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives Adam over the training reviews for a fixed number of
// epochs using Burn's DataLoader.
//
// Key points:
//   - Training runs on an AutodiffBackend (Autodiff<NdArray> or
//     Autodiff<Wgpu>) so the loss can be back-propagated
//   - model.valid() returns the model on B::InnerBackend, where
//     dropout is the identity; validation runs there
//   - Batches are taken in dataset order, the last one may be short
//   - No early stopping: every requested epoch runs
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::sigmoid, backend::AutodiffBackend},
};

use crate::data::{batcher::ReviewBatcher, dataset::ReviewDataset};
use crate::error::{PipelineError, Result};
use crate::infra::metrics::EpochMetrics;
use crate::ml::evaluator::evaluate;
use crate::ml::model::{count_correct, SentimentModel};

/// Owns the model and the optimizer state while training.
///
/// Repeated calls to [`fit`](Self::fit) continue from the current
/// parameters, optimizer moments and epoch count.
pub struct TrainingController<B: AutodiffBackend, O> {
    model:         SentimentModel<B>,
    optim:         O,
    learning_rate: f64,
    device:        B::Device,
    epochs_done:   usize,
}

impl<B, O> TrainingController<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SentimentModel<B>, B>,
{
    /// `optim` is usually `AdamConfig::new().init()`.
    pub fn new(model: SentimentModel<B>, optim: O, learning_rate: f64, device: B::Device) -> Self {
        Self { model, optim, learning_rate, device, epochs_done: 0 }
    }

    pub fn model(&self) -> &SentimentModel<B> { &self.model }

    pub fn into_model(self) -> SentimentModel<B> { self.model }

    pub fn epochs_done(&self) -> usize { self.epochs_done }

    pub fn fit(
        &mut self,
        train:      &ReviewDataset,
        epochs:     usize,
        batch_size: usize,
        validation: Option<&ReviewDataset>,
    ) -> Result<Vec<EpochMetrics>> {
        self.fit_with_callback(train, epochs, batch_size, validation, |_, _| Ok(()))
    }

    /// Like [`fit`](Self::fit), calling `on_epoch` after every epoch.
    /// An error from the callback aborts the run.
    pub fn fit_with_callback<F>(
        &mut self,
        train:        &ReviewDataset,
        epochs:       usize,
        batch_size:   usize,
        validation:   Option<&ReviewDataset>,
        mut on_epoch: F,
    ) -> Result<Vec<EpochMetrics>>
    where
        F: FnMut(&SentimentModel<B>, &EpochMetrics) -> Result<()>,
    {
        if batch_size == 0 {
            return Err(PipelineError::config("batch size must be positive"));
        }
        if epochs > 0 && train.sample_count() == 0 {
            return Err(PipelineError::data("training set is empty"));
        }
        if let Some(val) = validation {
            if val.sample_count() == 0 {
                return Err(PipelineError::data("validation set is empty"));
            }
        }

        let loader = DataLoaderBuilder::new(ReviewBatcher::<B>::new(self.device.clone()))
            .batch_size(batch_size)
            .build(train.clone());

        let mut history = Vec::with_capacity(epochs);

        for _ in 0..epochs {
            let epoch = self.epochs_done + 1;

            // ── Training phase ────────────────────────────────────────────────
            let mut loss_sum = 0.0f64;
            let mut correct  = 0usize;
            let mut total    = 0usize;

            for (batch_idx, batch) in loader.iter().enumerate() {
                let n = batch.labels.dims()[0];
                let (loss, logits) = self.model.forward_loss(batch.tokens, batch.labels.clone());

                let loss_val = finite_loss(loss.clone().into_scalar().elem::<f64>(), epoch, batch_idx)?;
                loss_sum += loss_val * n as f64;
                correct  += count_correct(sigmoid(logits.detach()), batch.labels);
                total    += n;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &self.model);
                self.model = self.optim.step(self.learning_rate, self.model.clone(), grads);
            }

            // ── Validation phase ──────────────────────────────────────────────
            let (val_loss, val_accuracy) = match validation {
                Some(val) => {
                    let eval = evaluate(&self.model.valid(), val, batch_size, &self.device)?;
                    // A bad validation loss reports the batch index past the last training batch
                    let loss = finite_loss(eval.loss, epoch, total.div_ceil(batch_size))?;
                    (Some(loss), Some(eval.accuracy))
                }
                None => (None, None),
            };

            let metrics = EpochMetrics {
                epoch,
                train_loss:     loss_sum / total as f64,
                train_accuracy: correct as f64 / total as f64,
                val_loss,
                val_accuracy,
            };
            self.epochs_done = epoch;
            tracing::info!("{}", metrics);

            on_epoch(&self.model, &metrics)?;
            history.push(metrics);
        }

        Ok(history)
    }
}

fn finite_loss(loss: f64, epoch: usize, batch: usize) -> Result<f64> {
    if loss.is_finite() {
        Ok(loss)
    } else {
        tracing::warn!("Non-finite loss at epoch {} batch {}: {}", epoch, batch, loss);
        Err(PipelineError::Numerical { epoch, batch, loss })
    }
}
