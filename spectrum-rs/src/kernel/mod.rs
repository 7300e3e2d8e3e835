//! Validated kernels and 1D buffer adapters.
//!
//! Every descriptor is a kernel: a small `Copy` value built once from a
//! config through [`KernelLifecycle::try_new`] and then run against any input
//! that implements [`Read1D`], writing into anything that implements
//! [`Write1D`].

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
