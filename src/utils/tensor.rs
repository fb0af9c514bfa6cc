//! Conversions between `ndarray` batches and `tch` tensors

use ndarray::Array4;
use tch::{Device, Kind, Tensor};

use crate::error::{Error, Result};

/// Copy a 4D array into a float tensor on `device`
pub fn array4_to_tensor(array: &Array4<f32>, device: Device) -> Tensor {
    let shape: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
    // `iter` walks logical order, so non-standard layouts are handled too
    let data: Vec<f32> = array.iter().copied().collect();

    Tensor::from_slice(&data)
        .view(shape.as_slice())
        .to_device(device)
}

/// Copy a 4D tensor back into host memory
pub fn tensor_to_array4(tensor: &Tensor) -> Result<Array4<f32>> {
    let size = tensor.size();
    if size.len() != 4 {
        return Err(Error::mismatch("tensor rank", 4, size.len()));
    }
    let dims = (
        size[0] as usize,
        size[1] as usize,
        size[2] as usize,
        size[3] as usize,
    );

    let flat = tensor
        .to_device(Device::Cpu)
        .to_kind(Kind::Float)
        .contiguous()
        .flatten(0, -1);
    let data: Vec<f32> = Vec::try_from(&flat)?;

    Ok(Array4::from_shape_vec(dims, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_tensor_conversion() {
        let array = Array4::from_shape_fn((2, 3, 2, 2), |(n, c, h, w)| {
            (n * 100 + c * 10 + h * 2 + w) as f32
        });

        let tensor = array4_to_tensor(&array, Device::Cpu);
        assert_eq!(tensor.size(), vec![2, 3, 2, 2]);
        assert_eq!(tensor.double_value(&[1, 2, 1, 0]), 122.0);

        let back = tensor_to_array4(&tensor).unwrap();
        assert_eq!(back, array);
    }

    #[test]
    fn test_tensor_to_array4_rejects_other_ranks() {
        let flat = Tensor::zeros([6], (Kind::Float, Device::Cpu));
        assert!(matches!(
            tensor_to_array4(&flat),
            Err(Error::DimensionMismatch {
                expected: 4,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_transposed_array_keeps_logical_order() {
        let array = Array4::from_shape_fn((1, 2, 3, 1), |(_, c, h, _)| (c * 3 + h) as f32);
        let swapped = array.permuted_axes([0, 2, 1, 3]);

        let tensor = array4_to_tensor(&swapped, Device::Cpu);
        assert_eq!(tensor.size(), vec![1, 3, 2, 1]);
        assert_eq!(tensor.double_value(&[0, 2, 1, 0]), 5.0);
    }
}
