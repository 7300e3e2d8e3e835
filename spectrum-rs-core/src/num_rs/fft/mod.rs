use crate::{Error, Result};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use ndarray::{Array, Array1, ArrayView, ArrayView1, ArrayViewMut1, Axis, Dimension, Zip};
use num_traits::{cast, Float};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftNum, FftPlanner};

/// Scaling applied to the forward transform, named as in `numpy.fft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftNorm {
    /// No scaling on the forward transform.
    #[default]
    Backward,
    /// Scale by `1/sqrt(n)`.
    Ortho,
    /// Scale by `1/n`, so a full-cycle sinusoid of amplitude `A` splits into
    /// two conjugate bins of magnitude `A/2`.
    Forward,
}

impl FftNorm {
    fn factor<F: Float>(self, n: usize) -> Option<F> {
        match self {
            FftNorm::Backward => None,
            FftNorm::Ortho => cast::<usize, F>(n).map(|n| n.sqrt().recip()),
            FftNorm::Forward => cast::<usize, F>(n).map(Float::recip),
        }
    }
}

/// Forward transform of real lanes of one fixed length, reusing a single plan
/// and scratch buffer.
struct LaneTransform<F: FftNum> {
    plan: Arc<dyn Fft<F>>,
    buffer: Vec<Complex<F>>,
    scratch: Vec<Complex<F>>,
    factor: Option<F>,
}

impl<F> LaneTransform<F>
where
    F: FftNum + Float,
{
    fn new(n: usize, norm: FftNorm) -> Self {
        let mut planner = FftPlanner::<F>::new();
        let plan = planner.plan_fft_forward(n);
        let zero = Complex::new(F::zero(), F::zero());
        let scratch = vec![zero; plan.get_inplace_scratch_len()];
        Self {
            plan,
            buffer: vec![zero; n],
            scratch,
            factor: norm.factor(n),
        }
    }

    fn run(&mut self, lane: ArrayView1<F>, mut out: ArrayViewMut1<Complex<F>>) {
        for (dst, src) in self.buffer.iter_mut().zip(lane.iter()) {
            *dst = Complex::new(*src, F::zero());
        }
        self.plan
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        match self.factor {
            Some(factor) => {
                for (dst, src) in out.iter_mut().zip(self.buffer.iter()) {
                    *dst = src.scale(factor);
                }
            }
            None => {
                for (dst, src) in out.iter_mut().zip(self.buffer.iter()) {
                    *dst = *src;
                }
            }
        }
    }
}

/// Compute the one-dimensional discrete Fourier transform of a real sequence,
/// like `numpy.fft.fft(x, norm=...)`.
///
/// # Parameters
/// * `x` : (N,) [[array_like]]([ndarray::ArrayView1])
///   Real input sequence, `N >= 1`.
/// * `norm` : [FftNorm]
///   Which direction carries the `1/N` scaling.
///
/// # Errors
/// [Error::InvalidArg] when `x` is empty.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use spectrum_rs_core::num_rs::{fft, FftNorm};
///
/// let x = array![1.0_f64, 2., 3., 4.];
/// let spec = fft(x.view(), FftNorm::Forward).unwrap();
/// assert!((spec[0].re - 2.5).abs() < 1e-12);
/// assert!((spec[2].re + 0.5).abs() < 1e-12);
/// ```
pub fn fft<F>(x: ArrayView1<F>, norm: FftNorm) -> Result<Array1<Complex<F>>>
where
    F: FftNum + Float,
{
    fft_last_axis(x, norm)
}

/// Transform every lane along the last axis of `x`.
///
/// Equivalent to `numpy.fft.fft(x, axis=-1, norm=...)`: leading axes are
/// independent signals and the output keeps the input shape.
///
/// # Errors
/// [Error::InvalidArg] when `x` is zero-dimensional or its last axis is
/// empty.
pub fn fft_last_axis<F, D>(x: ArrayView<F, D>, norm: FftNorm) -> Result<Array<Complex<F>, D>>
where
    F: FftNum + Float,
    D: Dimension,
{
    if x.ndim() == 0 {
        return Err(Error::invalid_arg("x", "input must have a time axis"));
    }
    let axis = Axis(x.ndim() - 1);
    let n = x.len_of(axis);
    if n == 0 {
        return Err(Error::invalid_arg("x", "time axis must be non-empty"));
    }

    let mut out = Array::from_elem(x.raw_dim(), Complex::new(F::zero(), F::zero()));
    let mut transform = LaneTransform::new(n, norm);
    Zip::from(out.lanes_mut(axis))
        .and(x.lanes(axis))
        .for_each(|out_lane, lane| transform.run(lane, out_lane));
    Ok(out)
}

/// Return the DFT sample frequencies, like `numpy.fft.fftfreq(n, d)`.
///
/// Bins are ordered `[0, 1, ..., ceil(n/2) - 1, -floor(n/2), ..., -1] / (n * d)`.
///
/// # Errors
/// [Error::InvalidArg] when `n` is zero or `d` is zero or not finite.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use spectrum_rs_core::num_rs::fftfreq;
///
/// let f = fftfreq(4, 0.5).unwrap();
/// assert_eq!(f, array![0.0, 0.5, -1.0, -0.5]);
/// ```
pub fn fftfreq<F: Float>(n: usize, d: F) -> Result<Array1<F>> {
    if n == 0 {
        return Err(Error::invalid_arg("n", "window length must be > 0"));
    }
    if !d.is_finite() || d == F::zero() {
        return Err(Error::invalid_arg("d", "sample spacing must be finite and non-zero"));
    }
    let n_f = cast::<usize, F>(n)
        .ok_or_else(|| Error::invalid_arg("n", "window length is not representable"))?;
    let val = (n_f * d).recip();
    let positive = (n - 1) / 2 + 1;

    Ok(Array1::from_shape_fn(n, |i| {
        let k = if i < positive {
            i as i64
        } else {
            i as i64 - n as i64
        };
        cast::<i64, F>(k).unwrap_or_else(F::nan) * val
    }))
}
