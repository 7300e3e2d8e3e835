//! Frequency-domain descriptors of sampled signals.
//!
//! The crate turns a real signal (or a batch of signals stacked along the
//! leading axes of an [`ndarray`] array) into:
//!
//! - a folded magnitude spectrum, optionally in decibels relative to its peak,
//! - a phase spectrum,
//! - a bandwidth estimate at a decibel cutoff.
//!
//! The descriptors live behind the default `std` feature, since the FFT
//! backend needs it. Without `std` only the error types and the kernel
//! substrate in [`kernel`] are built.
//!
//! ```
//! use ndarray::Array1;
//! use spectrum_rs::signal::{bandwidth, magnitude_spectrum, DEFAULT_CUTOFF_DB};
//!
//! let dt = 1e-3;
//! let x = Array1::from_shape_fn(1000, |i| {
//!     (2.0 * core::f64::consts::PI * 50.0 * i as f64 * dt).sin()
//! });
//!
//! let (freqs, spectrum) = magnitude_spectrum(&x, dt, false).unwrap();
//! assert_eq!(freqs.len(), spectrum.len());
//!
//! let band = bandwidth(&x, dt, DEFAULT_CUTOFF_DB).unwrap();
//! assert!((band.f_centre - 50.0).abs() < 1e-9);
//! ```

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;
pub use error::*;

/// Kernel construction and buffer adapters shared by every descriptor.
pub mod kernel;

/// Spectral descriptors.
#[cfg(feature = "std")]
pub mod signal;

/// Re-export of the FFT primitives the descriptors are built on.
pub use spectrum_rs_core::num_rs;
