// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a model on held-out reviews:
//   accuracy = (# reviews whose thresholded probability matches
//               the true label) / (# reviews)
//
// Pass a model on a non-autodiff backend (`model.valid()`):
// there dropout is the identity and no gradients are tracked.

use burn::{
    data::dataloader::DataLoaderBuilder,
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::data::{batcher::ReviewBatcher, dataset::ReviewDataset};
use crate::error::{PipelineError, Result};
use crate::ml::model::{count_correct, SentimentModel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean binary cross-entropy per review
    pub loss:     f64,
    /// In [0, 1]
    pub accuracy: f64,
    pub correct:  usize,
    pub total:    usize,
}

pub fn evaluate<B: Backend>(
    model:      &SentimentModel<B>,
    dataset:    &ReviewDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Evaluation> {
    if dataset.sample_count() == 0 {
        return Err(PipelineError::data("cannot evaluate on an empty set"));
    }
    if batch_size == 0 {
        return Err(PipelineError::config("batch size must be positive"));
    }

    let loader = DataLoaderBuilder::new(ReviewBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset.clone());

    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let n = batch.labels.dims()[0];
        let (loss, logits) = model.forward_loss(batch.tokens, batch.labels.clone());

        // The loss is a batch mean; weight it so the result is per review
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;
        correct  += count_correct(sigmoid(logits), batch.labels);
        total    += n;
    }

    let evaluation = Evaluation {
        loss:     loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
        correct,
        total,
    };
    tracing::debug!(
        "Evaluated {} reviews: loss={:.4} accuracy={:.4}",
        total, evaluation.loss, evaluation.accuracy
    );
    Ok(evaluation)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::Label;
    use crate::data::preprocessor::SequencePreprocessor;
    use crate::data::synthetic::SyntheticReviewSource;
    use crate::domain::traits::ReviewSource;
    use crate::ml::stage::{ModelConfig, StackSizes};

    type TestBackend = burn::backend::NdArray;

    /// Fraction of `probabilities` whose thresholded label equals `labels`.
    fn accuracy(probabilities: &[f32], labels: &[Label]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let correct = probabilities
            .iter()
            .zip(labels)
            .filter(|(&p, &l)| Label::from_probability(p) == l)
            .count();
        correct as f64 / labels.len() as f64
    }

    /// P(positive) for every review of `dataset`, in order.
    fn predict_probabilities<B: Backend>(
        model:      &SentimentModel<B>,
        dataset:    &ReviewDataset,
        batch_size: usize,
        device:     &B::Device,
    ) -> Result<Vec<f32>> {
        if batch_size == 0 {
            return Err(PipelineError::config("batch size must be positive"));
        }

        let loader = DataLoaderBuilder::new(ReviewBatcher::<B>::new(device.clone()))
            .batch_size(batch_size)
            .build(dataset.clone());

        let mut out = Vec::with_capacity(dataset.sample_count());
        for batch in loader.iter() {
            let probs = model
                .probabilities(batch.tokens)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| PipelineError::data(format!("cannot read predictions: {e:?}")))?;
            out.extend(probs);
        }
        Ok(out)
    }

    #[test]
    fn test_accuracy_counts_matches() {
        let labels = [Label::Positive, Label::Negative, Label::Positive, Label::Negative];
        assert_eq!(accuracy(&[0.9, 0.1, 0.2, 0.7], &labels), 0.5);
        assert_eq!(accuracy(&[0.9, 0.1, 0.6, 0.4], &labels), 1.0);
        assert_eq!(accuracy(&[0.5, 0.5, 0.5, 0.5], &labels), 0.5);
    }

    #[test]
    fn test_evaluate_matches_thresholded_predictions() {
        let device = Default::default();
        let sizes = StackSizes { vocab_size: 40, seq_len: 10, embedding_dim: 4, hidden: 6,
                                 ..StackSizes::default() };
        let split = SyntheticReviewSource::new(13, 3, 14, 5).load(40).unwrap();
        let pre = SequencePreprocessor::new(10).unwrap();
        let test = ReviewDataset::new(pre.normalize_all(&split.test), 10, 40).unwrap();
        let before = test.samples().to_vec();

        let model = ModelConfig::baseline(&sizes).unwrap().init::<TestBackend>(&device);
        let eval = evaluate(&model, &test, 4, &device).unwrap();

        assert_eq!(eval.total, 13);
        assert!((0.0..=1.0).contains(&eval.accuracy));
        assert!(eval.loss.is_finite());

        let probs = predict_probabilities(&model, &test, 5, &device).unwrap();
        assert_eq!(probs.len(), 13);
        let expected = accuracy(&probs, &test.labels());
        assert!((eval.accuracy - expected).abs() < 1e-12);
        assert_eq!(eval.accuracy, eval.correct as f64 / 13.0);

        // Read-only: same answer twice, data untouched
        let again = evaluate(&model, &test, 13, &device).unwrap();
        assert_eq!(again.correct, eval.correct);
        assert_eq!(test.samples(), &before[..]);
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let device = Default::default();
        let sizes = StackSizes { vocab_size: 10, seq_len: 3, embedding_dim: 2, hidden: 2,
                                 ..StackSizes::default() };
        let model = ModelConfig::baseline(&sizes).unwrap().init::<TestBackend>(&device);
        let empty = ReviewDataset::new(Vec::new(), 3, 10).unwrap();
        assert!(matches!(
            evaluate(&model, &empty, 4, &device),
            Err(PipelineError::Data(_))
        ));
    }
}
