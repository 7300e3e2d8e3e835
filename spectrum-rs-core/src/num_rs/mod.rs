// rustfft plans through `std`, so the transforms need it.
#[cfg(feature = "std")]
mod fft;

#[cfg(feature = "std")]
pub use fft::*;
