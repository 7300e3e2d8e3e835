use super::ConfigError;

/// Validate a config once and produce an immutable kernel.
///
/// ```
/// use spectrum_rs::kernel::KernelLifecycle;
/// use spectrum_rs::signal::{MagnitudeSpectrumConfig, MagnitudeSpectrumKernel};
///
/// let kernel = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt: 1e-3, db: true });
/// assert!(kernel.is_ok());
///
/// let rejected = MagnitudeSpectrumKernel::try_new(MagnitudeSpectrumConfig { dt: 0.0, db: true });
/// assert!(rejected.is_err());
/// ```
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
