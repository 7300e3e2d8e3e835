//! Folded magnitude and raw phase spectra.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::{MagnitudeSpectrum1D, PhaseSpectrum1D};
use crate::Error;
use alloc::vec::Vec;
use core::f64::consts::PI;
use ndarray::{
    s, Array, Array1, ArrayBase, ArrayView, ArrayView1, ArrayViewMut1, Axis, Data, Dimension,
    Slice, Zip,
};
use num_traits::Float;
use rustfft::num_complex::Complex;
use spectrum_rs_core::num_rs::{fft_last_axis, fftfreq, FftNorm};
use tracing::trace;

/// Offset added before taking logarithms so silent bins stay finite.
const DB_FLOOR: f64 = 1e-31;

/// Number of bins in a magnitude spectrum of `n` samples: `(n + 1) / 2`.
///
/// For even `n` the Nyquist bin is not part of the folded spectrum.
pub fn magnitude_bin_count(n: usize) -> usize {
    n.div_ceil(2)
}

/// Number of bins in a phase spectrum of `n` samples: `n / 2` for even `n`,
/// `(n + 1) / 2` for odd `n`.
pub fn phase_bin_count(n: usize) -> usize {
    if n.is_multiple_of(2) {
        n / 2
    } else {
        (n + 1) / 2
    }
}

pub(crate) fn validate_dt(dt: f64) -> Result<(), ConfigError> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(ConfigError::InvalidArgument {
            arg: "dt",
            reason: "dt must be finite and > 0",
        });
    }
    Ok(())
}

/// Name a binding failure after the argument it came from.
fn bound_to(arg: &'static str) -> impl Fn(ConfigError) -> ExecInvariantViolation {
    move |err| match err {
        ConfigError::NonContiguous { .. } => ConfigError::NonContiguous { arg }.into(),
        other => other.into(),
    }
}

pub(crate) fn read_signal<I>(input: &I) -> Result<&[f64], ExecInvariantViolation>
where
    I: Read1D<f64> + ?Sized,
{
    let input = input.read_slice().map_err(bound_to("signal"))?;
    if input.is_empty() {
        return Err(ExecInvariantViolation::EmptySignal { arg: "signal" });
    }
    Ok(input)
}

fn write_checked<O>(
    out: &mut O,
    arg: &'static str,
    values: &Array1<f64>,
) -> Result<(), ExecInvariantViolation>
where
    O: Write1D<f64> + ?Sized,
{
    let out = out.write_slice_mut().map_err(bound_to(arg))?;
    if out.len() != values.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg,
            expected: values.len(),
            got: out.len(),
        });
    }
    for (dst, src) in out.iter_mut().zip(values.iter()) {
        *dst = *src;
    }
    Ok(())
}

/// Leading `num_freqs` entries of the standard DFT frequency axis.
fn frequency_axis(n: usize, dt: f64, num_freqs: usize) -> spectrum_rs_core::Result<Array1<f64>> {
    Ok(fftfreq(n, dt)?.slice_move(s![..num_freqs]))
}

/// Sum the magnitudes of each positive bin and its mirrored negative bin.
fn fold_magnitude(bins: ArrayView1<Complex<f64>>, mut out: ArrayViewMut1<f64>) {
    let n = bins.len();
    out[0] = bins[0].norm();
    for k in 1..out.len() {
        out[k] = bins[k].norm() + bins[n - k].norm();
    }
}

/// Rescale a magnitude lane to decibels relative to its own peak.
fn to_decibels(mut lane: ArrayViewMut1<f64>) {
    let peak = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let reference = peak + DB_FLOOR;
    lane.mapv_inplace(|v| 20.0 * Float::log10((v + DB_FLOOR) / reference));
}

/// Angle of `z` in `(-pi, pi]`.
fn principal_angle(z: Complex<f64>) -> f64 {
    let angle = z.arg();
    if angle <= -PI {
        PI
    } else {
        angle
    }
}

fn magnitude_impl<D>(
    signal: ArrayView<f64, D>,
    dt: f64,
    db: bool,
) -> spectrum_rs_core::Result<(Array1<f64>, Array<f64, D>)>
where
    D: Dimension,
{
    let bins = fft_last_axis(signal, FftNorm::Forward)?;
    let axis = Axis(bins.ndim() - 1);
    let n = bins.len_of(axis);
    let num_freqs = magnitude_bin_count(n);
    let freqs = frequency_axis(n, dt, num_freqs)?;

    let mut shape = bins.raw_dim();
    shape[axis.index()] = num_freqs;
    let mut spectrum = Array::zeros(shape);
    Zip::from(spectrum.lanes_mut(axis))
        .and(bins.lanes(axis))
        .for_each(|mut out, lane| {
            fold_magnitude(lane, out.view_mut());
            if db {
                to_decibels(out);
            }
        });

    trace!(n, num_freqs, shape = ?spectrum.shape(), db, "magnitude spectrum");
    Ok((freqs, spectrum))
}

fn phase_impl<D>(
    signal: ArrayView<f64, D>,
    dt: f64,
) -> spectrum_rs_core::Result<(Array1<f64>, Array<f64, D>)>
where
    D: Dimension,
{
    let bins = fft_last_axis(signal, FftNorm::Backward)?;
    let axis = Axis(bins.ndim() - 1);
    let n = bins.len_of(axis);
    let num_freqs = phase_bin_count(n);
    let freqs = frequency_axis(n, dt, num_freqs)?;

    let spectrum = bins
        .slice_axis(axis, Slice::from(..num_freqs))
        .mapv(principal_angle);

    trace!(n, num_freqs, shape = ?spectrum.shape(), "phase spectrum");
    Ok((freqs, spectrum))
}

/// Constructor config for [`MagnitudeSpectrumKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeSpectrumConfig {
    /// Sampling interval.
    pub dt: f64,
    /// Report the spectrum in decibels relative to its peak.
    pub db: bool,
}

/// Folded one-sided magnitude spectrum.
///
/// Uses forward normalisation and sums each positive-frequency bin with its
/// mirrored negative-frequency bin, so a full-cycle sinusoid of amplitude `A`
/// peaks at `A`. With `db` set, every signal is rescaled to 0 dB at its own
/// peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeSpectrumKernel {
    dt: f64,
    db: bool,
}

impl MagnitudeSpectrumKernel {
    /// Sampling interval.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Whether output is in decibels.
    pub fn db(&self) -> bool {
        self.db
    }

    /// Compute the spectrum of every signal along the last axis of `signal`.
    ///
    /// Returns the frequency axis and an array shaped like `signal` with the
    /// last axis shortened to [`magnitude_bin_count`].
    pub fn run_nd<S, D>(&self, signal: &ArrayBase<S, D>) -> Result<(Array1<f64>, Array<f64, D>), Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(magnitude_impl(signal.view(), self.dt, self.db)?)
    }
}

impl KernelLifecycle for MagnitudeSpectrumKernel {
    type Config = MagnitudeSpectrumConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        validate_dt(config.dt)?;
        Ok(Self {
            dt: config.dt,
            db: config.db,
        })
    }
}

impl MagnitudeSpectrum1D for MagnitudeSpectrumKernel {
    fn run_into<I, OF, OS>(
        &self,
        input: &I,
        freqs: &mut OF,
        spectrum: &mut OS,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OS: Write1D<f64> + ?Sized,
    {
        let input = read_signal(input)?;
        let (f, m) = magnitude_impl(ArrayView1::from(input), self.dt, self.db)?;
        write_checked(freqs, "freqs", &f)?;
        write_checked(spectrum, "spectrum", &m)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = read_signal(input)?;
        let (f, m) = magnitude_impl(ArrayView1::from(input), self.dt, self.db)?;
        Ok((f.to_vec(), m.to_vec()))
    }
}

/// Constructor config for [`PhaseSpectrumKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpectrumConfig {
    /// Sampling interval.
    pub dt: f64,
}

/// Phase angle of the raw (unfolded) non-negative frequency bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpectrumKernel {
    dt: f64,
}

impl PhaseSpectrumKernel {
    /// Sampling interval.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Compute the phase of every signal along the last axis of `signal`.
    ///
    /// The last axis of the result has [`phase_bin_count`] entries.
    pub fn run_nd<S, D>(&self, signal: &ArrayBase<S, D>) -> Result<(Array1<f64>, Array<f64, D>), Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(phase_impl(signal.view(), self.dt)?)
    }
}

impl KernelLifecycle for PhaseSpectrumKernel {
    type Config = PhaseSpectrumConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        validate_dt(config.dt)?;
        Ok(Self { dt: config.dt })
    }
}

impl PhaseSpectrum1D for PhaseSpectrumKernel {
    fn run_into<I, OF, OS>(
        &self,
        input: &I,
        freqs: &mut OF,
        spectrum: &mut OS,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OS: Write1D<f64> + ?Sized,
    {
        let input = read_signal(input)?;
        let (f, p) = phase_impl(ArrayView1::from(input), self.dt)?;
        write_checked(freqs, "freqs", &f)?;
        write_checked(spectrum, "spectrum", &p)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = read_signal(input)?;
        let (f, p) = phase_impl(ArrayView1::from(input), self.dt)?;
        Ok((f.to_vec(), p.to_vec()))
    }
}

/// Magnitude spectrum of `signal` (last axis = time) sampled every `dt`.
///
/// Returns `(freqs, spectrum)`; see [`MagnitudeSpectrumKernel`].
pub fn magnitude_spectrum<S, D>(
    signal: &ArrayBase<S, D>,
    dt: f64,
    db: bool,
) -> Result<(Array1<f64>, Array<f64, D>), Error>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt, db })?.run_nd(signal)
}

/// Phase spectrum of `signal` (last axis = time) sampled every `dt`.
///
/// Returns `(freqs, phases)` with phases in radians; see
/// [`PhaseSpectrumKernel`].
pub fn phase_spectrum<S, D>(
    signal: &ArrayBase<S, D>,
    dt: f64,
) -> Result<(Array1<f64>, Array<f64, D>), Error>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    PhaseSpectrumKernel::try_new(PhaseSpectrumConfig { dt })?.run_nd(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Array3};

    fn tone(n: usize, dt: f64, freq: f64, amplitude: f64, phase: f64) -> Array1<f64> {
        Array1::from_shape_fn(n, |i| {
            amplitude * (2.0 * PI * freq * i as f64 * dt + phase).sin()
        })
    }

    #[test]
    fn bin_counts_follow_parity_rules() {
        assert_eq!(magnitude_bin_count(1), 1);
        assert_eq!(magnitude_bin_count(8), 4);
        assert_eq!(magnitude_bin_count(9), 5);
        assert_eq!(phase_bin_count(1), 1);
        assert_eq!(phase_bin_count(8), 4);
        assert_eq!(phase_bin_count(9), 5);
    }

    #[test]
    fn sinusoid_amplitude_is_recovered() {
        let dt = 0.01;
        let x = tone(200, dt, 5.0, 3.0, 0.3);
        let (freqs, spectrum) = magnitude_spectrum(&x, dt, false).unwrap();

        assert_eq!(freqs.len(), 100);
        assert_abs_diff_eq!(freqs[10], 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spectrum[10], 3.0, epsilon = 1e-9);
        for (k, v) in spectrum.iter().enumerate() {
            if k != 10 {
                assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn dc_offset_is_not_doubled() {
        let x = array![2.0, 2.0, 2.0, 2.0, 2.0];
        let (_, spectrum) = magnitude_spectrum(&x, 1.0, false).unwrap();
        assert_abs_diff_eq!(spectrum[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn decibel_spectrum_peaks_at_zero() {
        let dt = 1e-3;
        let x = &tone(500, dt, 40.0, 0.7, 0.0) + &tone(500, dt, 120.0, 0.1, 1.0);
        let (_, spectrum) = magnitude_spectrum(&x, dt, true).unwrap();
        let peak = spectrum.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(peak, 0.0);
        assert!(spectrum.iter().all(|v| *v <= 0.0));
        assert_abs_diff_eq!(spectrum[60], 20.0 * (0.1f64 / 0.7).log10(), epsilon = 1e-6);
    }

    #[test]
    fn frequency_axis_is_ascending_from_zero() {
        for n in [1usize, 2, 7, 16, 33] {
            let x = Array1::from_shape_fn(n, |i| (i as f64).cos());
            let (freqs, spectrum) = magnitude_spectrum(&x, 0.25, true).unwrap();
            assert_eq!(freqs.len(), (n + 1) / 2);
            assert_eq!(spectrum.len(), freqs.len());
            assert_eq!(freqs[0], 0.0);
            assert!(freqs.windows(2).into_iter().all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn single_sample_is_one_dc_bin() {
        let x = array![4.0];
        let (freqs, linear) = magnitude_spectrum(&x, 1.0, false).unwrap();
        assert_eq!(freqs, array![0.0]);
        assert_abs_diff_eq!(linear[0], 4.0, epsilon = 1e-12);

        let (_, db) = magnitude_spectrum(&x, 1.0, true).unwrap();
        assert_eq!(db, array![0.0]);
    }

    #[test]
    fn silent_signal_stays_finite() {
        let x = Array1::<f64>::zeros(64);
        let (_, linear) = magnitude_spectrum(&x, 1.0, false).unwrap();
        assert!(linear.iter().all(|v| *v == 0.0));

        let (_, db) = magnitude_spectrum(&x, 1.0, true).unwrap();
        assert!(db.iter().all(|v| v.is_finite() && *v == 0.0));
    }

    #[test]
    fn decibel_reference_is_per_signal() {
        let dt = 0.01;
        let mut batch = Array2::<f64>::zeros((2, 100));
        batch.row_mut(0).assign(&tone(100, dt, 10.0, 1.0, 0.0));
        batch.row_mut(1).assign(&tone(100, dt, 20.0, 0.01, 0.0));
        let (_, spectrum) = magnitude_spectrum(&batch, dt, true).unwrap();
        assert_eq!(spectrum.dim(), (2, 50));
        assert_eq!(spectrum[[0, 10]], 0.0);
        assert_eq!(spectrum[[1, 20]], 0.0);
    }

    #[test]
    fn batched_spectra_match_single_rows() {
        let dt = 0.02;
        let batch = Array3::from_shape_fn((2, 3, 11), |(a, b, t)| {
            ((a + 1) as f64 * t as f64 * 0.4).sin() + b as f64 * 0.1 * t as f64
        });
        let (freqs, mag) = magnitude_spectrum(&batch, dt, true).unwrap();
        let (pfreqs, phase) = phase_spectrum(&batch, dt).unwrap();
        assert_eq!(mag.dim(), (2, 3, 6));
        assert_eq!(phase.dim(), (2, 3, 6));

        for a in 0..2 {
            for b in 0..3 {
                let row = batch.slice(s![a, b, ..]);
                let (f1, m1) = magnitude_spectrum(&row, dt, true).unwrap();
                let (pf1, p1) = phase_spectrum(&row, dt).unwrap();
                assert_eq!(f1, freqs);
                assert_eq!(pf1, pfreqs);
                for (x, y) in m1.iter().zip(mag.slice(s![a, b, ..]).iter()) {
                    assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
                }
                for (x, y) in p1.iter().zip(phase.slice(s![a, b, ..]).iter()) {
                    assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn phase_of_cosine_and_sine() {
        let dt = 1.0 / 64.0;
        let cosine = Array1::from_shape_fn(64, |i| (2.0 * PI * 4.0 * i as f64 * dt).cos());
        let (freqs, phase) = phase_spectrum(&cosine, dt).unwrap();
        assert_eq!(freqs.len(), 32);
        assert_abs_diff_eq!(freqs[4], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[4], 0.0, epsilon = 1e-9);

        let sine = tone(64, dt, 4.0, 1.0, 0.0);
        let (_, phase) = phase_spectrum(&sine, dt).unwrap();
        assert_abs_diff_eq!(phase[4], -PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn phase_stays_in_half_open_interval() {
        let x = array![1.0, -1.0, 1.0, -1.0, 3.0, -2.0, 0.5];
        let (freqs, phase) = phase_spectrum(&x, 1.0).unwrap();
        assert_eq!(freqs.len(), 4);
        assert!(phase.iter().all(|p| *p > -PI && *p <= PI));

        assert_eq!(principal_angle(Complex::new(-1.0, -0.0)), PI);
        assert_eq!(principal_angle(Complex::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn kernels_reject_invalid_dt() {
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt, db: true })
                .is_err());
            assert!(PhaseSpectrumKernel::try_new(PhaseSpectrumConfig { dt }).is_err());
        }
        let x = array![1.0, 2.0];
        assert!(matches!(
            magnitude_spectrum(&x, 0.0, false),
            Err(Error::Config(ConfigError::InvalidArgument { arg: "dt", .. }))
        ));
    }

    #[test]
    fn empty_time_axis_is_an_error() {
        let x = Array2::<f64>::zeros((3, 0));
        assert!(matches!(
            magnitude_spectrum(&x, 1.0, true),
            Err(Error::InvalidArg { .. })
        ));
        assert!(phase_spectrum(&x, 1.0).is_err());

        let kernel = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt: 1.0, db: true })
            .expect("valid config");
        let empty: Vec<f64> = vec![];
        assert_eq!(
            kernel.run_alloc(&empty),
            Err(ExecInvariantViolation::EmptySignal { arg: "signal" })
        );
    }

    #[test]
    fn slice_kernels_match_array_functions() {
        let dt = 0.05;
        let x: Vec<f64> = (0..21).map(|i| (i as f64 * 0.7).sin() + 0.2).collect();
        let view = ArrayView1::from(&x);

        let mag = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt, db: false })
            .expect("valid config");
        let (f, m) = mag.run_alloc(&x).expect("magnitude run");
        let (fa, ma) = magnitude_spectrum(&view, dt, false).unwrap();
        assert_eq!(f, fa.to_vec());
        assert_eq!(m, ma.to_vec());

        let phase = PhaseSpectrumKernel::try_new(PhaseSpectrumConfig { dt }).expect("valid config");
        let mut pf = vec![0.0; 11];
        let mut pp = vec![0.0; 11];
        phase.run_into(&x, &mut pf, &mut pp).expect("phase run");
        let (fa, pa) = phase_spectrum(&view, dt).unwrap();
        assert_eq!(pf, fa.to_vec());
        assert_eq!(pp, pa.to_vec());
    }

    #[test]
    fn strided_buffers_are_reported_by_argument() {
        let kernel = PhaseSpectrumKernel::try_new(PhaseSpectrumConfig { dt: 1.0 })
            .expect("valid config");
        let x = [1.0, 0.5, -1.0, 0.25, 0.0, 2.0];
        let mut freqs = [0.0; 3];
        let mut backing = Array1::<f64>::zeros(6);
        let mut strided = backing.slice_mut(s![..;2]);
        assert_eq!(
            kernel.run_into(&x, &mut freqs, &mut strided),
            Err(ExecInvariantViolation::Config(ConfigError::NonContiguous {
                arg: "spectrum"
            }))
        );

        let signal = Array1::from_vec(vec![1.0, 0.0, -1.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            kernel.run_alloc(&signal.slice(s![..;2])),
            Err(ExecInvariantViolation::Config(ConfigError::NonContiguous {
                arg: "signal"
            }))
        );
    }

    #[test]
    fn run_into_checks_output_lengths() {
        let kernel = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt: 1.0, db: true })
            .expect("valid config");
        let x = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0];
        let mut freqs = [0.0; 3];
        let mut spectrum = [0.0; 4];
        let err = kernel
            .run_into(&x, &mut freqs, &mut spectrum)
            .expect_err("mismatched output length should error");
        assert_eq!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "spectrum",
                expected: 3,
                got: 4,
            }
        );
    }
}
