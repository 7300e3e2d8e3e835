use super::Bandwidth;
use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use alloc::vec::Vec;

/// Folded magnitude spectrum of a single signal.
pub trait MagnitudeSpectrum1D {
    /// Write the frequency axis and spectrum into caller-provided buffers.
    ///
    /// Both buffers must hold exactly `(N + 1) / 2` values.
    fn run_into<I, OF, OS>(
        &self,
        input: &I,
        freqs: &mut OF,
        spectrum: &mut OS,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OS: Write1D<f64> + ?Sized;

    /// Compute and allocate `(freqs, spectrum)`.
    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Phase spectrum of a single signal.
pub trait PhaseSpectrum1D {
    /// Write the frequency axis and phase angles into caller-provided buffers.
    ///
    /// Both buffers must hold exactly [`phase_bin_count`](super::phase_bin_count)
    /// values.
    fn run_into<I, OF, OS>(
        &self,
        input: &I,
        freqs: &mut OF,
        spectrum: &mut OS,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OS: Write1D<f64> + ?Sized;

    /// Compute and allocate `(freqs, phases)`.
    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Bandwidth estimate of a single signal.
pub trait Bandwidth1D {
    /// Estimate the band edges and centre frequency.
    fn run<I>(&self, input: &I) -> Result<Bandwidth, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}
