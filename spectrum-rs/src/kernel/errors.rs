use core::fmt;

/// Rejected kernel configuration or input binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value is outside its domain.
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A 1D view is strided and cannot be borrowed as a slice.
    NonContiguous {
        /// Name of the argument.
        arg: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidArgument { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            ConfigError::NonContiguous { arg } => {
                write!(f, "Argument `{arg}` is not contiguous in memory.")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Failure while running a validated kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecInvariantViolation {
    /// The signal has no samples along its time axis.
    EmptySignal {
        /// Name of the argument.
        arg: &'static str,
    },
    /// A caller buffer does not have the length the descriptor produces.
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// The Fourier transform rejected its input.
    Transform(spectrum_rs_core::Error),
    /// Input binding failure.
    Config(ConfigError),
}

impl From<ConfigError> for ExecInvariantViolation {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<spectrum_rs_core::Error> for ExecInvariantViolation {
    fn from(value: spectrum_rs_core::Error) -> Self {
        Self::Transform(value)
    }
}

impl fmt::Display for ExecInvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecInvariantViolation::EmptySignal { arg } => {
                write!(f, "Signal `{arg}` has no samples.")
            }
            ExecInvariantViolation::LengthMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Length mismatch on `{arg}`. Expected {expected}, got {got}."
                )
            }
            ExecInvariantViolation::Transform(err) => {
                write!(f, "Fourier transform failed: {err}")
            }
            ExecInvariantViolation::Config(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for ExecInvariantViolation {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            ExecInvariantViolation::Config(err) => Some(err),
            ExecInvariantViolation::Transform(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use core::error::Error as _;
    use spectrum_rs_core::num_rs::fftfreq;
    use std::string::ToString;

    #[test]
    fn transform_failures_keep_the_core_reason() {
        let core_err = fftfreq::<f64>(0, 1.0).expect_err("zero-length axis");
        let err = ExecInvariantViolation::from(core_err.clone());

        assert_eq!(err, ExecInvariantViolation::Transform(core_err.clone()));
        assert!(err.to_string().ends_with(&core_err.to_string()));
        assert!(err.source().is_some());
    }
}
