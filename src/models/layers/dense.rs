use burn::{
    config::Config,
    module::{Module, Param},
    nn::Linear,
    tensor::{backend::Backend, Distribution, Tensor},
};

/// Configuration for a [Dense] layer
#[derive(Config, Debug)]
pub struct DenseConfig {
    /// Input features
    pub d_input: usize,

    /// Output features
    pub d_output: usize,

    /// Whether the layer reports an L2 penalty for its weights
    #[config(default = true)]
    pub regularize: bool,

    /// Whether the bias counts towards the L2 penalty
    #[config(default = true)]
    pub regularize_bias: bool,

    /// Standard deviation of the normal weight initialization
    #[config(default = 0.1)]
    pub init_std: f64,

    /// Constant bias initialization
    #[config(default = 0.1)]
    pub init_bias: f64,
}

/// A linear layer that also returns the L2 penalty of its parameters
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    /// The affine map
    pub linear: Linear<B>,

    /// Whether the layer reports an L2 penalty
    regularize: bool,

    /// Whether the bias counts towards the penalty
    regularize_bias: bool,
}

impl DenseConfig {
    /// Initialize the layer with normal weights and a constant bias
    pub fn init<B: Backend>(&self, device: &B::Device) -> Dense<B> {
        let weight = Tensor::random(
            [self.d_input, self.d_output],
            Distribution::Normal(0.0, self.init_std),
            device,
        );
        let bias = Tensor::full([self.d_output], self.init_bias as f32, device);

        Dense {
            linear: Linear {
                weight: Param::from_tensor(weight),
                bias: Some(Param::from_tensor(bias)),
            },
            regularize: self.regularize,
            regularize_bias: self.regularize_bias,
        }
    }
}

impl<B: Backend> Dense<B> {
    /// Returns `(logits, l2)` where `l2 = sum(w^2)/2 + sum(b^2)/2`, or zero when not regularized
    pub fn forward(&self, input: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let output = self.linear.forward(input);

        (output, self.l2())
    }

    /// The L2 penalty of the parameters
    pub fn l2(&self) -> Tensor<B, 1> {
        let weight = self.linear.weight.val();

        if !self.regularize {
            return Tensor::zeros([1], &weight.device());
        }

        let mut l2 = weight.powf_scalar(2.0).sum().div_scalar(2.0);
        match &self.linear.bias {
            Some(bias) if self.regularize_bias => {
                l2 = l2 + bias.val().powf_scalar(2.0).sum().div_scalar(2.0);
            }
            _ => {}
        }

        l2
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_forward_shape_and_penalty() {
        let device = Default::default();
        let dense = DenseConfig::new(4, 3).init::<TestBackend>(&device);

        let (logits, l2) = dense.forward(Tensor::ones([2, 4], &device));

        assert_eq!(logits.dims(), [2, 3]);
        assert!(l2.into_scalar() > 0.0);
    }

    #[test]
    fn test_penalty_counts_weight_and_bias() {
        let device = Default::default();
        let mut dense = DenseConfig::new(2, 1).init::<TestBackend>(&device);
        dense.linear.weight = Param::from_tensor(Tensor::from_floats([[1.0], [2.0]], &device));
        dense.linear.bias = Some(Param::from_tensor(Tensor::from_floats([2.0], &device)));

        // (1 + 4) / 2 + 4 / 2
        assert_eq!(dense.l2().into_scalar(), 4.5);
    }

    #[test]
    fn test_penalty_can_skip_bias() {
        let device = Default::default();
        let mut dense = DenseConfig::new(2, 1)
            .with_regularize_bias(false)
            .init::<TestBackend>(&device);
        dense.linear.weight = Param::from_tensor(Tensor::from_floats([[1.0], [2.0]], &device));

        assert_eq!(dense.l2().into_scalar(), 2.5);
    }

    #[test]
    fn test_unregularized_penalty_is_zero() {
        let device = Default::default();
        let dense = DenseConfig::new(2, 2)
            .with_regularize(false)
            .init::<TestBackend>(&device);

        assert_eq!(dense.l2().into_scalar(), 0.0);
    }
}
