//! Adversarial and virtual adversarial perturbations of embedded inputs.
//!
//! Every auxiliary pass here runs on detached leaves and calls `backward` itself, so it must
//! run before the main loss graph of a training step is built from the same parameters.

use burn::{
    config::Config,
    tensor::{
        activation::{log_softmax, softmax},
        backend::{AutodiffBackend, Backend},
        Distribution, Int, Tensor,
    },
};

/// Scale of the random start of the power iteration
pub const SMALL_CONSTANT: f64 = 1e-6;

/// Perturbation settings shared by adversarial and virtual adversarial training
#[derive(Config, Debug)]
pub struct PerturbationConfig {
    /// L2 norm of the final perturbation, per example
    #[config(default = 5.0)]
    pub norm_length: f64,

    /// Power iterations used to estimate the virtual adversarial direction
    #[config(default = 1)]
    pub power_iterations: usize,

    /// Weight of the virtual adversarial loss
    #[config(default = 0.01)]
    pub virtual_weight: f64,
}

/// Rescale every example (dimension 0) to an L2 norm of `norm_length`, dividing by the max
/// absolute value first to stay stable for tiny and huge inputs
pub fn scale_l2<B: Backend, const D: usize>(x: Tensor<B, D>, norm_length: f64) -> Tensor<B, D> {
    let shape = x.shape();
    let batch_size = shape.dims[0];
    let features = shape.num_elements() / batch_size.max(1);

    let flat: Tensor<B, 2> = x.reshape([batch_size, features]);

    let alpha = flat.clone().abs().max_dim(1).add_scalar(1e-12);
    let l2_norm = alpha.clone()
        * (flat.clone() / alpha)
            .powf_scalar(2.0)
            .sum_dim(1)
            .add_scalar(1e-6)
            .sqrt();

    (flat / l2_norm).mul_scalar(norm_length).reshape(shape)
}

/// A `[batch, seq_length, 1]` float mask that is 1 inside each example's length
pub fn length_mask<B: Backend>(lengths: Tensor<B, 1, Int>, seq_length: usize) -> Tensor<B, 3> {
    let [batch_size] = lengths.dims();
    let device = lengths.device();

    let positions = Tensor::<B, 1, Int>::arange(0..seq_length as i64, &device)
        .reshape([1, seq_length])
        .repeat(0, batch_size);
    let lengths = lengths.reshape([batch_size, 1]).repeat(1, seq_length);

    positions
        .lower(lengths)
        .int()
        .float()
        .reshape([batch_size, seq_length, 1])
}

/// Zero every position at or beyond the example's length
pub fn mask_by_length<B: Backend>(x: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> Tensor<B, 3> {
    let [_, seq_length, _] = x.dims();

    x * length_mask(lengths, seq_length)
}

/// `KL(q || p)` averaged over the batch, where both are given as logits
pub fn kl_divergence_with_logits<B: Backend>(
    q_logit: Tensor<B, 2>,
    p_logit: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let q = softmax(q_logit.clone(), 1);

    let qlogq = (q.clone() * log_softmax(q_logit, 1)).sum_dim(1).mean();
    let qlogp = (q * log_softmax(p_logit, 1)).sum_dim(1).mean();

    qlogq - qlogp
}

/// Gradients of `loss_fn` with respect to two inputs, taken on detached copies so no gradient
/// reaches whatever produced them
pub fn input_gradients<B, F, const D1: usize, const D2: usize>(
    a: Tensor<B, D1>,
    b: Tensor<B, D2>,
    loss_fn: F,
) -> (Tensor<B, D1>, Tensor<B, D2>)
where
    B: AutodiffBackend,
    F: FnOnce(Tensor<B, D1>, Tensor<B, D2>) -> Tensor<B, 1>,
{
    let a = a.detach().require_grad();
    let b = b.detach().require_grad();

    let grads = loss_fn(a.clone(), b.clone()).backward();

    let grad_a = a
        .grad(&grads)
        .map(Tensor::from_inner)
        .unwrap_or_else(|| a.zeros_like());
    let grad_b = b
        .grad(&grads)
        .map(Tensor::from_inner)
        .unwrap_or_else(|| b.zeros_like());

    (grad_a.detach(), grad_b.detach())
}

/// Adversarial perturbations: the loss gradient at the inputs, rescaled to `norm_length`
pub fn adversarial_perturbations<B, F, const D1: usize, const D2: usize>(
    a: Tensor<B, D1>,
    b: Tensor<B, D2>,
    norm_length: f64,
    loss_fn: F,
) -> (Tensor<B, D1>, Tensor<B, D2>)
where
    B: AutodiffBackend,
    F: FnOnce(Tensor<B, D1>, Tensor<B, D2>) -> Tensor<B, 1>,
{
    let (grad_a, grad_b) = input_gradients(a, b, loss_fn);

    (scale_l2(grad_a, norm_length), scale_l2(grad_b, norm_length))
}

/// Virtual adversarial perturbations of a vector input `a` and a sequence input `b`, found by
/// power iteration on the KL divergence between the clean and perturbed predictions.
///
/// `logits_fn` maps perturbed inputs to logits; `clean_logits` are treated as constants.
pub fn virtual_adversarial_perturbations<B, F>(
    clean_logits: Tensor<B, 2>,
    a: Tensor<B, 2>,
    b: Tensor<B, 3>,
    lengths: Tensor<B, 1, Int>,
    config: &PerturbationConfig,
    logits_fn: F,
) -> (Tensor<B, 2>, Tensor<B, 3>)
where
    B: AutodiffBackend,
    F: Fn(Tensor<B, 2>, Tensor<B, 3>) -> Tensor<B, 2>,
{
    let clean_logits = clean_logits.detach();
    let (a, b) = (a.detach(), b.detach());
    let [_, seq_length, _] = b.dims();
    let mask = length_mask(lengths, seq_length);

    let mut d_a = a.random_like(Distribution::Normal(0.0, 1.0));
    let mut d_b = b.random_like(Distribution::Normal(0.0, 1.0));

    for _ in 0..config.power_iterations {
        let start_a = scale_l2(d_a, SMALL_CONSTANT);
        let start_b = scale_l2(d_b * mask.clone(), SMALL_CONSTANT);

        (d_a, d_b) = input_gradients(start_a, start_b, |d_a, d_b| {
            let logits = logits_fn(a.clone() + d_a, b.clone() + d_b);

            kl_divergence_with_logits(clean_logits.clone(), logits)
        });
    }

    (
        scale_l2(d_a, config.norm_length),
        scale_l2(d_b * mask, config.norm_length),
    )
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray>;

    #[test]
    fn test_scale_l2_normalizes_each_example() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::from_floats(
            [[[3.0, 0.0], [0.0, 4.0]], [[0.001, 0.0], [0.0, 0.0]]],
            &device,
        );

        let scaled = scale_l2(x, 5.0);
        let norms = scaled
            .reshape([2, 4])
            .powf_scalar(2.0)
            .sum_dim(1)
            .sqrt()
            .into_data()
            .convert::<f32>()
            .value;

        assert!((norms[0] - 5.0).abs() < 1e-3);
        assert!((norms[1] - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_mask_by_length_zeroes_padding() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::ones([2, 3, 2], &device);
        let lengths = Tensor::<TestBackend, 1, Int>::from_ints([1, 3], &device);

        let masked = mask_by_length(x, lengths).sum_dim(2).reshape([6]);

        assert_eq!(
            masked.into_data().convert::<f32>().value,
            vec![2.0, 0.0, 0.0, 2.0, 2.0, 2.0]
        );
    }

    #[test]
    fn test_kl_divergence_of_equal_logits_is_zero() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0, 3.0]], &device);

        let same = kl_divergence_with_logits(logits.clone(), logits.clone()).into_scalar();
        let other = kl_divergence_with_logits(
            logits,
            Tensor::from_floats([[3.0, 2.0, 1.0]], &device),
        )
        .into_scalar();

        assert!(same.abs() < 1e-6);
        assert!(other > 0.0);
    }

    #[test]
    fn test_input_gradients_of_a_weighted_sum() {
        let device = Default::default();
        let a = Tensor::<TestAutodiffBackend, 2>::ones([1, 2], &device);
        let b = Tensor::<TestAutodiffBackend, 3>::ones([1, 2, 1], &device);

        let (grad_a, grad_b) =
            input_gradients(a, b, |a, b| a.mul_scalar(2.0).sum() + b.mul_scalar(-3.0).sum());

        assert_eq!(grad_a.into_data().convert::<f32>().value, vec![2.0, 2.0]);
        assert_eq!(grad_b.into_data().convert::<f32>().value, vec![-3.0, -3.0]);
    }

    #[test]
    fn test_virtual_perturbation_respects_lengths_and_norm() {
        let device = Default::default();
        let a = Tensor::<TestAutodiffBackend, 2>::random(
            [2, 3],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let b = Tensor::<TestAutodiffBackend, 3>::random(
            [2, 4, 3],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let lengths = Tensor::from_ints([2, 4], &device);
        let weights = Tensor::<TestAutodiffBackend, 2>::random(
            [3, 2],
            Distribution::Normal(0.0, 1.0),
            &device,
        );

        let logits_fn = |a: Tensor<TestAutodiffBackend, 2>, b: Tensor<TestAutodiffBackend, 3>| {
            (a + b.sum_dim(1).reshape([2, 3])).matmul(weights.clone())
        };
        let clean = logits_fn(a.clone(), b.clone());

        let (d_a, d_b) = virtual_adversarial_perturbations(
            clean,
            a,
            b,
            lengths,
            &PerturbationConfig::new(),
            logits_fn,
        );

        assert_eq!(d_a.dims(), [2, 3]);
        let padded = d_b
            .clone()
            .slice([0..1, 2..4, 0..3])
            .abs()
            .sum()
            .into_scalar();
        assert_eq!(padded, 0.0);

        let norm = d_b
            .slice([1..2, 0..4, 0..3])
            .powf_scalar(2.0)
            .sum()
            .sqrt()
            .into_scalar();
        assert!((norm - 5.0).abs() < 1e-2);
    }
}
