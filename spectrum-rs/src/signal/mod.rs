//! Magnitude, phase and bandwidth descriptors.
//!
//! Array-level functions ([`magnitude_spectrum`], [`phase_spectrum`],
//! [`bandwidth`]) accept any [`ndarray`] array whose last axis is time; the
//! kernels behind them also run on plain 1D buffers through the traits in
//! [`traits`].

mod bandwidth;
mod spectrum;

/// Capability traits implemented by the descriptor kernels.
pub mod traits;

pub use bandwidth::*;
pub use spectrum::*;
