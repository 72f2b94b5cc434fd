use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Relu,
    },
    prelude::*,
    tensor::activation::log_softmax,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Features per input row, 784 for a flattened 28x28 image
    pub input_size:    usize,
    /// Number of classes
    pub output_size:   usize,
    /// Width of every hidden layer, in order
    pub hidden_layers: Vec<usize>,
    /// Probability of zeroing a hidden activation during training
    #[config(default = 0.5)]
    pub dropout:       f64,
}

impl ClassifierConfig {
    /// Build the network:
    ///
    ///   input_size → hidden_layers[0] → … → hidden_layers[n-1] → output_size
    ///
    /// With no hidden layers the classifier is a single linear map.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        let widths: Vec<usize> = std::iter::once(self.input_size)
            .chain(self.hidden_layers.iter().copied())
            .collect();

        let hidden_layers: Vec<Linear<B>> = widths
            .windows(2)
            .map(|w| LinearConfig::new(w[0], w[1]).init(device))
            .collect();

        let last_width = widths[widths.len() - 1];
        let output     = LinearConfig::new(last_width, self.output_size).init(device);

        Classifier {
            hidden_layers,
            output,
            activation: Relu::new(),
            dropout:    DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Feed-forward classifier: each hidden layer is linear → ReLU → dropout,
/// the output layer produces one raw score per class.
#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub hidden_layers: Vec<Linear<B>>,
    pub output:        Linear<B>,
    pub activation:    Relu,
    pub dropout:       Dropout,
}

impl<B: Backend> Classifier<B> {
    /// images: [batch, input_size] → logits: [batch, output_size]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = images;
        for layer in &self.hidden_layers {
            x = self.dropout.forward(self.activation.forward(layer.forward(x)));
        }
        self.output.forward(x)
    }

    /// Log class probabilities, each row's exp() sums to 1
    pub fn forward_log_probs(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        log_softmax(self.forward(images), 1)
    }

    /// Mean cross-entropy loss of a batch together with its logits.
    ///
    /// Cross-entropy on logits equals negative log likelihood on
    /// forward_log_probs, so either view of the network trains the same.
    pub fn forward_classification(
        &self,
        images:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }

    pub fn input_size(&self) -> usize {
        self.hidden_layers
            .first()
            .unwrap_or(&self.output)
            .weight
            .val()
            .dims()[0]
    }

    pub fn output_size(&self) -> usize {
        self.output.weight.val().dims()[1]
    }

    /// Hidden widths read back from the layer shapes
    pub fn hidden_sizes(&self) -> Vec<usize> {
        self.hidden_layers
            .iter()
            .map(|l| l.weight.val().dims()[1])
            .collect()
    }

    /// (input_size, output_size, hidden widths)
    pub fn architecture(&self) -> (usize, usize, Vec<usize>) {
        (self.input_size(), self.output_size(), self.hidden_sizes())
    }

    /// Architecture as a config, e.g. for rebuilding an identical network
    pub fn config(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.input_size(), self.output_size(), self.hidden_sizes())
            .with_dropout(self.dropout.prob)
    }
}
