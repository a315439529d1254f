use burn::{
    config::Config,
    module::{Module, Param},
    nn::{
        conv::{Conv1d, Conv1dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig1d,
    },
    tensor::{
        activation::relu,
        backend::Backend,
        module::conv1d,
        ops::ConvOptions,
        Distribution, Tensor,
    },
};

use super::gradient;

/// Configuration for a [ConvPool] filter bank
#[derive(Config, Debug)]
pub struct ConvPoolConfig {
    /// Features per token
    pub channels_in: usize,

    /// Filter widths, one bank of filters per width
    #[config(default = "vec![3, 4, 5]")]
    pub widths: Vec<usize>,

    /// Filters per width
    #[config(default = 100)]
    pub filters: usize,

    /// Reverse the gradient flowing into the input and the filter weights
    #[config(default = false)]
    pub reverse_gradient: bool,
}

/// Convolution over time with several filter widths, each followed by ReLU and max-pooling over
/// the whole sequence
#[derive(Module, Debug)]
pub struct ConvPool<B: Backend> {
    /// One `[filters, channels_in, width]` kernel per width
    weights: Vec<Param<Tensor<B, 3>>>,

    /// One `[filters]` bias per width
    biases: Vec<Param<Tensor<B, 1>>>,

    /// Whether the gradient is reversed on the way back
    reverse_gradient: bool,
}

impl ConvPoolConfig {
    /// Initialize the filters from `N(0, 0.1)` with a constant 0.1 bias
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvPool<B> {
        let weights = self
            .widths
            .iter()
            .map(|&width| {
                Param::from_tensor(Tensor::random(
                    [self.filters, self.channels_in, width],
                    Distribution::Normal(0.0, 0.1),
                    device,
                ))
            })
            .collect();

        let biases = self
            .widths
            .iter()
            .map(|_| Param::from_tensor(Tensor::full([self.filters], 0.1, device)))
            .collect();

        ConvPool {
            weights,
            biases,
            reverse_gradient: self.reverse_gradient,
        }
    }

    /// Size of the pooled feature
    pub fn output_size(&self) -> usize {
        self.widths.len() * self.filters
    }
}

impl<B: Backend> ConvPool<B> {
    /// `[batch, seq_length, channels_in]` to `[batch, widths * filters]`
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, seq_len, _] = input.dims();

        let input = self.maybe_reverse(input).swap_dims(1, 2);

        let pools = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(weight, bias)| {
                let weight = self.maybe_reverse(weight.val());
                let bias = self.maybe_reverse(bias.val());
                let [filters, _, width] = weight.dims();

                let conv = conv1d(
                    input.clone(),
                    weight,
                    Some(bias),
                    ConvOptions::new([1], [width / 2], [1], 1),
                );

                // An even width pads one step more on the left than SAME padding, drop that window
                let offset = width / 2 - (width - 1) / 2;
                let conv = conv.narrow(2, offset, seq_len);

                relu(conv).max_dim(2).reshape([batch_size, filters])
            })
            .collect();

        Tensor::cat(pools, 1)
    }

    fn maybe_reverse<const D: usize>(&self, tensor: Tensor<B, D>) -> Tensor<B, D> {
        if self.reverse_gradient {
            gradient::reverse(tensor, 1.0)
        } else {
            tensor
        }
    }
}

/// Configuration for a [ConvBlock]
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// Features per token
    pub channels_in: usize,

    /// Output features per token
    #[config(default = 310)]
    pub filters: usize,

    /// Odd kernel width; the sequence length is preserved
    #[config(default = 3)]
    pub kernel_size: usize,

    /// Apply batch normalization before the activation
    #[config(default = true)]
    pub batch_norm: bool,
}

/// A same-length convolution with He-normal initialization, optional batch norm and ReLU
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv1d<B>,
    norm: Option<BatchNorm<B, 1>>,
}

impl ConvBlockConfig {
    /// Initialize the block
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        let conv = Conv1dConfig::new(self.channels_in, self.filters, self.kernel_size)
            .with_padding(PaddingConfig1d::Explicit(self.kernel_size / 2))
            .with_initializer(Initializer::KaimingNormal {
                gain: std::f64::consts::SQRT_2,
                fan_out_only: false,
            })
            .init(device);

        let norm = self
            .batch_norm
            .then(|| BatchNormConfig::new(self.filters).init(device));

        ConvBlock { conv, norm }
    }
}

impl<B: Backend> ConvBlock<B> {
    /// `[batch, seq_length, channels_in]` to `[batch, seq_length, filters]`
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut x = self.conv.forward(input.swap_dims(1, 2));

        if let Some(norm) = &self.norm {
            x = norm.forward(x);
        }

        relu(x).swap_dims(1, 2)
    }
}
