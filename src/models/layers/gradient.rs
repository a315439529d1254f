use burn::tensor::{backend::Backend, Tensor};

/// Gradient reversal: the identity in the forward pass, while the gradient flowing back through
/// it is multiplied by `-lambda`.
///
/// Built from a detached copy so it works on any autodiff backend without a custom op:
/// `-lambda * x + (1 + lambda) * stop_gradient(x)`.
pub fn reverse<B: Backend, const D: usize>(x: Tensor<B, D>, lambda: f64) -> Tensor<B, D> {
    let frozen = x.clone().detach();

    x.mul_scalar(-lambda) + frozen.mul_scalar(1.0 + lambda)
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_forward_is_identity() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([0.5, -2.0, 3.0], &device);

        let y = reverse(x.clone(), 1.0);

        assert_eq!(
            y.into_data().convert::<f32>().value,
            x.into_data().convert::<f32>().value
        );
    }

    #[test]
    fn test_backward_negates_and_scales() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([0.5, -2.0, 3.0], &device).require_grad();

        let loss = reverse(x.clone(), 0.5).mul_scalar(2.0).sum();
        let grads = loss.backward();

        let grad = x.grad(&grads).unwrap().into_data().convert::<f32>().value;

        assert_eq!(grad, vec![-1.0, -1.0, -1.0]);
    }
}
