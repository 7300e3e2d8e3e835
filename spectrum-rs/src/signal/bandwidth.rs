//! Bandwidth of a signal at a decibel cutoff.

use super::spectrum::{read_signal, validate_dt};
use super::{MagnitudeSpectrumConfig, MagnitudeSpectrumKernel};
use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::traits::{Bandwidth1D, MagnitudeSpectrum1D};
use crate::Error;
use ndarray::{Array, Array1, ArrayBase, ArrayView1, Axis, Data, Dimension, Ix1};
use tracing::debug;

/// Cutoff used when none is given, in dB relative to the spectral peak.
pub const DEFAULT_CUTOFF_DB: f64 = -10.0;

/// Band edges and centre frequency.
///
/// When no bin rises above the cutoff, `f_min` falls back to `0.0` and
/// `f_max` to the number of spectral bins, which is a count rather than a
/// frequency.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bandwidth {
    /// Lowest frequency above the cutoff.
    pub f_min: f64,
    /// Frequency of the spectral peak.
    pub f_centre: f64,
    /// Highest frequency above the cutoff.
    pub f_max: f64,
}

impl From<Bandwidth> for (f64, f64, f64) {
    fn from(value: Bandwidth) -> Self {
        (value.f_min, value.f_centre, value.f_max)
    }
}

/// Scan a decibel spectrum for its band edges and peak.
///
/// `spectrum` is read in the same order as `freqs`. Bins must strictly
/// exceed `cutoff` to count as inside the band; the first maximum wins ties
/// for the centre.
pub fn bandwidth_from_spectrum(
    freqs: ArrayView1<f64>,
    spectrum: ArrayView1<f64>,
    cutoff: f64,
) -> Result<Bandwidth, ExecInvariantViolation> {
    if spectrum.is_empty() {
        return Err(ExecInvariantViolation::EmptySignal { arg: "spectrum" });
    }
    if freqs.len() != spectrum.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "freqs",
            expected: spectrum.len(),
            got: freqs.len(),
        });
    }

    let num_freqs = spectrum.len();
    let above = |v: &f64| *v > cutoff;

    let f_min = match spectrum.iter().position(above) {
        Some(i) => freqs[i],
        None => {
            debug!(cutoff, num_freqs, "no bin above cutoff, lower edge falls back to 0");
            0.0
        }
    };

    let mut centre = 0;
    for (i, v) in spectrum.iter().enumerate() {
        if *v > spectrum[centre] {
            centre = i;
        }
    }
    let f_centre = freqs[centre];

    let f_max = match spectrum.iter().rposition(above) {
        Some(i) => freqs[i],
        None => {
            debug!(cutoff, num_freqs, "no bin above cutoff, upper edge falls back to bin count");
            num_freqs as f64
        }
    };

    Ok(Bandwidth {
        f_min,
        f_centre,
        f_max,
    })
}

/// Average a batch of decibel spectra over axis 0 only.
fn collapse_leading_axis<D: Dimension>(spectrum: Array<f64, D>) -> Result<Array1<f64>, Error> {
    let spectrum = spectrum.into_dyn();
    let reduced = if spectrum.ndim() > 1 {
        spectrum
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::invalid_arg("signal", "batch axis must hold at least one signal"))?
    } else {
        spectrum
    };
    reduced.into_dimensionality::<Ix1>().map_err(|_| {
        Error::invalid_arg(
            "signal",
            "only the leading batch axis is averaged, so input must be 1D or 2D",
        )
    })
}

/// Constructor config for [`BandwidthKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthConfig {
    /// Sampling interval.
    pub dt: f64,
    /// Level in dB, relative to the peak, that bounds the band.
    pub cutoff: f64,
}

impl BandwidthConfig {
    /// Config with [`DEFAULT_CUTOFF_DB`].
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            cutoff: DEFAULT_CUTOFF_DB,
        }
    }
}

/// Bandwidth estimate from the decibel magnitude spectrum.
///
/// Batched input is reduced to one spectrum by averaging the dB spectra over
/// the leading axis before scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthKernel {
    spectrum: MagnitudeSpectrumKernel,
    cutoff: f64,
}

impl BandwidthKernel {
    /// Configured cutoff in dB.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Estimate the bandwidth of a single signal (1D) or of a batch averaged
    /// over its leading axis (2D).
    ///
    /// # Errors
    /// Input with more than two axes is rejected, since averaging the leading
    /// axis alone leaves more than one spectrum.
    pub fn run_nd<S, D>(&self, signal: &ArrayBase<S, D>) -> Result<Bandwidth, Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let (freqs, spectrum) = self.spectrum.run_nd(signal)?;
        let spectrum = collapse_leading_axis(spectrum)?;
        Ok(bandwidth_from_spectrum(
            freqs.view(),
            spectrum.view(),
            self.cutoff,
        )?)
    }
}

impl KernelLifecycle for BandwidthKernel {
    type Config = BandwidthConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        validate_dt(config.dt)?;
        if config.cutoff.is_nan() {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff must not be NaN",
            });
        }
        let spectrum = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig {
            dt: config.dt,
            db: true,
        })?;
        Ok(Self {
            spectrum,
            cutoff: config.cutoff,
        })
    }
}

impl Bandwidth1D for BandwidthKernel {
    fn run<I>(&self, input: &I) -> Result<Bandwidth, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = read_signal(input)?;
        let (freqs, spectrum) = self.spectrum.run_alloc(input)?;
        bandwidth_from_spectrum(
            ArrayView1::from(&freqs),
            ArrayView1::from(&spectrum),
            self.cutoff,
        )
    }
}

/// Bandwidth of `signal` (last axis = time) at `cutoff` dB.
///
/// Returns `(f_min, f_centre, f_max)` as a [`Bandwidth`]; pass
/// [`DEFAULT_CUTOFF_DB`] for the conventional -10 dB level.
pub fn bandwidth<S, D>(signal: &ArrayBase<S, D>, dt: f64, cutoff: f64) -> Result<Bandwidth, Error>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    BandwidthKernel::try_new(BandwidthConfig { dt, cutoff })?.run_nd(signal)
}
