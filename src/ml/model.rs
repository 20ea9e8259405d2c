use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        loss::BinaryCrossEntropyLossConfig,
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::ml::stage::{ModelConfig, Stage};

impl ModelConfig {
    /// Build the module described by this (already validated) stack.
    ///
    /// Parameters come from the backend's RNG; seed the backend first
    /// for a reproducible initialisation.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentModel<B> {
        let mut embedding       = None;
        let mut sequence_layers = Vec::new();
        let mut lstm            = None;
        let mut head_dropouts   = Vec::new();
        let mut output          = None;

        for stage in self.stages() {
            match *stage {
                Stage::Embedding { vocab_size, width } => {
                    embedding = Some(EmbeddingConfig::new(vocab_size, width).init(device));
                }
                Stage::Convolution { channels_in, filters, kernel } => {
                    let conv = Conv1dConfig::new(channels_in, filters, kernel)
                        .with_padding(PaddingConfig1d::Same)
                        .init(device);
                    sequence_layers.push(SequenceLayer::convolution(conv));
                }
                Stage::Pooling { factor } => {
                    let pool = MaxPool1dConfig::new(factor).with_stride(factor).init();
                    sequence_layers.push(SequenceLayer::pooling(pool));
                }
                Stage::Dropout { prob } => {
                    let dropout = DropoutConfig::new(prob).init();
                    if lstm.is_none() {
                        sequence_layers.push(SequenceLayer::dropout(dropout));
                    } else {
                        head_dropouts.push(dropout);
                    }
                }
                Stage::Recurrent { input, hidden } => {
                    lstm = Some(LstmConfig::new(input, hidden, true).init(device));
                }
                Stage::Output { input } => {
                    output = Some(LinearConfig::new(input, 1).init(device));
                }
            }
        }

        SentimentModel {
            embedding: embedding.expect("validated stacks start with an embedding"),
            sequence_layers,
            lstm: lstm.expect("validated stacks contain a recurrent stage"),
            head_dropouts,
            output: output.expect("validated stacks end with an output"),
        }
    }
}

// ─── SequenceLayer ────────────────────────────────────────────────────────────
/// One stage between the embedding and the LSTM. Exactly one of the
/// fields is set. Operates on [batch, len, channels].
#[derive(Module, Debug)]
pub struct SequenceLayer<B: Backend> {
    conv:    Option<Conv1d<B>>,
    pool:    Option<MaxPool1d>,
    dropout: Option<Dropout>,
}

impl<B: Backend> SequenceLayer<B> {
    fn convolution(conv: Conv1d<B>) -> Self {
        Self { conv: Some(conv), pool: None, dropout: None }
    }

    fn pooling(pool: MaxPool1d) -> Self {
        Self { conv: None, pool: Some(pool), dropout: None }
    }

    fn dropout(dropout: Dropout) -> Self {
        Self { conv: None, pool: None, dropout: Some(dropout) }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        // Conv1d and MaxPool1d expect channels before length
        if let Some(conv) = &self.conv {
            relu(conv.forward(x.swap_dims(1, 2))).swap_dims(1, 2)
        } else if let Some(pool) = &self.pool {
            pool.forward(x.swap_dims(1, 2)).swap_dims(1, 2)
        } else if let Some(dropout) = &self.dropout {
            dropout.forward(x)
        } else {
            x
        }
    }
}

// ─── SentimentModel ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SentimentModel<B: Backend> {
    pub embedding:       Embedding<B>,
    pub sequence_layers: Vec<SequenceLayer<B>>,
    pub lstm:            Lstm<B>,
    pub head_dropouts:   Vec<Dropout>,
    pub output:          Linear<B>,
}

impl<B: Backend> SentimentModel<B> {
    /// tokens: [batch, seq_len] → logits: [batch]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch_size, _] = tokens.dims();

        let mut x = self.embedding.forward(tokens); // [batch, seq_len, width]
        for layer in &self.sequence_layers {
            x = layer.forward(x);
        }

        // Only the final hidden state leaves the recurrent stage
        let (_, state) = self.lstm.forward(x, None);
        let mut h = state.hidden; // [batch, hidden]
        for dropout in &self.head_dropouts {
            h = dropout.forward(h);
        }

        self.output.forward(h).reshape([batch_size])
    }

    /// tokens: [batch, seq_len] → P(positive): [batch]
    pub fn probabilities(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        sigmoid(self.forward(tokens))
    }

    /// Binary cross-entropy of the batch, computed on logits.
    pub fn forward_loss(
        &self,
        tokens: Tensor<B, 2, Int>,
        labels: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let logits = self.forward(tokens);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), labels);
        (loss, logits)
    }
}

/// Number of predictions that agree with `labels`, where a
/// probability strictly above 0.5 means positive.
pub fn count_correct<B: Backend>(probabilities: Tensor<B, 1>, labels: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = probabilities
        .greater_elem(0.5)
        .int()
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::stage::StackSizes;

    type TestBackend = burn::backend::NdArray;

    fn sizes() -> StackSizes {
        StackSizes { vocab_size: 30, seq_len: 6, embedding_dim: 4, hidden: 5,
                     filters: 3, kernel: 3, pool: 2, dropout: 0.5 }
    }

    fn tokens(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::from_data(
            TensorData::new(vec![0i64, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 29], [2, 6]),
            device,
        )
    }

    #[test]
    fn test_every_reference_stack_produces_one_logit_per_review() {
        let device = Default::default();
        for cfg in [
            ModelConfig::baseline(&sizes()).unwrap(),
            ModelConfig::with_dropout(&sizes()).unwrap(),
            ModelConfig::convolutional(&sizes()).unwrap(),
        ] {
            let model = cfg.init::<TestBackend>(&device);
            let logits = model.forward(tokens(&device));
            assert_eq!(logits.dims(), [2]);

            let probs: Vec<f32> = model.probabilities(tokens(&device)).into_data().to_vec().unwrap();
            assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_stage_layout() {
        let device = Default::default();
        let model = ModelConfig::with_dropout(&sizes()).unwrap().init::<TestBackend>(&device);
        assert_eq!(model.sequence_layers.len(), 1);
        assert_eq!(model.head_dropouts.len(), 1);

        let model = ModelConfig::convolutional(&sizes()).unwrap().init::<TestBackend>(&device);
        assert_eq!(model.sequence_layers.len(), 2);
        assert!(model.head_dropouts.is_empty());
    }

    #[test]
    fn test_pooling_halves_length_and_conv_keeps_it() {
        let device = Default::default();
        let model = ModelConfig::convolutional(&sizes()).unwrap().init::<TestBackend>(&device);

        let x = model.embedding.forward(tokens(&device));
        assert_eq!(x.dims(), [2, 6, 4]);
        let x = model.sequence_layers[0].forward(x);
        assert_eq!(x.dims(), [2, 6, 3]);
        let x = model.sequence_layers[1].forward(x);
        assert_eq!(x.dims(), [2, 3, 3]);
    }

    #[test]
    fn test_dropout_is_identity_without_autodiff() {
        // The inner (non-autodiff) backend is the evaluation/inference mode
        let device = Default::default();
        let layer = SequenceLayer::<TestBackend>::dropout(DropoutConfig::new(0.5).init());
        let x = Tensor::<TestBackend, 3>::ones([2, 4, 3], &device);
        let y: Vec<f32> = layer.forward(x.clone()).into_data().to_vec().unwrap();
        let x: Vec<f32> = x.into_data().to_vec().unwrap();
        assert_eq!(x, y);

        let model = ModelConfig::with_dropout(&sizes()).unwrap().init::<TestBackend>(&device);
        let a: Vec<f32> = model.forward(tokens(&device)).into_data().to_vec().unwrap();
        let b: Vec<f32> = model.forward(tokens(&device)).into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_correct_thresholds_at_one_half() {
        let device = Default::default();
        let probs = Tensor::<TestBackend, 1>::from_data(
            TensorData::new(vec![0.9f32, 0.2, 0.5, 0.6], [4]), &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 0, 1, 0], [4]), &device);
        // 0.5 is not above the threshold, so it counts as negative
        assert_eq!(count_correct(probs, labels), 2);
    }

    #[test]
    fn test_forward_loss_is_finite() {
        let device = Default::default();
        let model = ModelConfig::baseline(&sizes()).unwrap().init::<TestBackend>(&device);
        let labels = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 0], [2]), &device);
        let (loss, logits) = model.forward_loss(tokens(&device), labels);
        assert_eq!(logits.dims(), [2]);
        let loss: f64 = loss.into_scalar().elem::<f64>();
        assert!(loss.is_finite() && loss > 0.0);
    }
}
