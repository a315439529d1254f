use burn::tensor::{backend::Backend, Bool, Data, ElementConversion, Int, Shape, Tensor};

/// Pad or truncate each row to `seq_length` and stack the rows into a single `[batch, seq_length]`
/// tensor
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: Vec<Vec<usize>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = tokens_list.len();
    let mut values: Vec<B::IntElem> = Vec::with_capacity(batch_size * seq_length);

    for tokens in tokens_list {
        let n = tokens.len().min(seq_length);

        values.extend(tokens.into_iter().take(n).map(|e| (e as i64).elem::<B::IntElem>()));
        values.extend((n..seq_length).map(|_| (pad_token as i64).elem::<B::IntElem>()));
    }

    Tensor::from_data(
        Data::new(values, Shape::new([batch_size, seq_length])),
        device,
    )
}

/// Build a 1-dimensional Int tensor from a list of ids
pub fn ids<B: Backend>(values: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    Tensor::from_data(
        Data::<B::IntElem, 1>::new(
            values.iter().map(|&v| (v as i64).elem()).collect(),
            Shape::new([values.len()]),
        ),
        device,
    )
}

/// Build a `[batch, seq_length]` Bool mask from rows of flags
pub fn mask<B: Backend>(
    rows: Vec<Vec<bool>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Bool> {
    let flags = rows
        .into_iter()
        .map(|row| row.into_iter().map(usize::from).collect())
        .collect();

    pad_to::<B>(0, flags, seq_length, device).equal_elem(1)
}

/// Mean over `dim` 1 of a `[batch, seq, dim]` tensor, counting only positions where `mask` is set
pub fn masked_mean<B: Backend>(tensor: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
    let [batch_size, seq_length, _] = tensor.dims();

    let weights = mask.int().float().reshape([batch_size, seq_length, 1]);
    let counts = weights.clone().sum_dim(1).clamp_min(1.0);

    let summed = (tensor * weights).sum_dim(1) / counts;

    summed.squeeze(1)
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_pad_to_pads_and_truncates() {
        let device = Default::default();
        let tensor = pad_to::<TestBackend>(0, vec![vec![4, 5], vec![1, 2, 3, 4]], 3, &device);

        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(
            tensor.into_data().convert::<i64>().value,
            vec![4, 5, 0, 1, 2, 3]
        );
    }

    #[test]
    fn test_masked_mean_ignores_unset_positions() {
        let device = Default::default();
        let tensor =
            Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0, 10.0, 20.0, 30.0], &device)
                .reshape([2, 3, 1]);
        let mask = mask::<TestBackend>(
            vec![vec![true, false, true], vec![false, false, false]],
            3,
            &device,
        );

        let mean = masked_mean(tensor, mask).into_data().convert::<f32>().value;

        assert_eq!(mean, vec![2.0, 0.0]);
    }
}
