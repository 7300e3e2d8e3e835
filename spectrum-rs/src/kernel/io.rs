use super::ConfigError;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use ndarray::{ArrayView1, ArrayViewMut1};

#[cfg(feature = "alloc")]
use ndarray::Array1;

/// Borrow a signal as a contiguous slice of samples.
pub trait Read1D<T> {
    /// Borrow the underlying samples.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Borrow an output buffer as a contiguous mutable slice.
pub trait Write1D<T> {
    /// Borrow the underlying storage mutably.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

#[cfg(feature = "alloc")]
impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "signal" })
    }
}

impl<T> Read1D<T> for ArrayView1<'_, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "signal" })
    }
}

impl<T> Write1D<T> for ArrayViewMut1<'_, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "output" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ndarray::{array, s};

    #[test]
    fn fixed_arrays_and_slices_read_in_place() {
        let samples = [0.5f64, -0.5, 0.25];
        assert_eq!(samples.read_slice().expect("array adapter").len(), 3);

        let borrowed: &[f64] = &samples[1..];
        assert_eq!(borrowed.read_slice().expect("slice adapter"), &[-0.5, 0.25]);
    }

    #[test]
    fn strided_views_are_rejected() {
        let x = array![0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0];
        let every_other = x.slice(s![..;2]);
        assert_eq!(
            every_other.read_slice(),
            Err(ConfigError::NonContiguous { arg: "signal" })
        );

        let contiguous = x.slice(s![1..4]);
        assert_eq!(contiguous.read_slice().expect("contiguous view"), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn output_adapters_expose_storage() {
        let mut out = array![0.0f64, 0.0, 0.0];
        out.view_mut()
            .write_slice_mut()
            .expect("view write")
            .copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(out, array![1.0, 2.0, 3.0]);

        let mut buf = [0.0f64; 2];
        buf.write_slice_mut().expect("fixed array write")[1] = 7.0;
        assert_eq!(buf, [0.0, 7.0]);
    }
}
