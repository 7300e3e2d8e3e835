//! Array primitives shared by `spectrum-rs`.
//!
//! Everything under [`num_rs`] mirrors the behaviour of the numpy routine it
//! is named after, so results can be checked against numpy directly. The
//! transforms are built with the default `std` feature.

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;

/// numpy-flavoured numerical routines.
pub mod num_rs;

pub use error::*;
