use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::{error, fmt};

/// Errors raised by the array-level descriptor functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The signal or an argument cannot be analysed.
    #[cfg(feature = "alloc")]
    InvalidArg {
        /// The invalid arg
        arg: alloc::string::String,
        /// Explaining why arg is invalid.
        reason: alloc::string::String,
    },
    /// The signal or an argument cannot be analysed.
    #[cfg(not(feature = "alloc"))]
    InvalidArg,
    /// Kernel configuration was rejected.
    Config(ConfigError),
    /// A validated kernel failed while running.
    Exec(ExecInvariantViolation),
}

impl Error {
    #[cfg(feature = "alloc")]
    pub(crate) fn invalid_arg(arg: &str, reason: &str) -> Self {
        use alloc::string::ToString;
        Error::InvalidArg {
            arg: arg.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Config(value)
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        Error::Exec(value)
    }
}

#[cfg(feature = "alloc")]
impl From<spectrum_rs_core::Error> for Error {
    fn from(value: spectrum_rs_core::Error) -> Self {
        match value {
            spectrum_rs_core::Error::InvalidArg { arg, reason } => Error::InvalidArg { arg, reason },
        }
    }
}

#[cfg(not(feature = "alloc"))]
impl From<spectrum_rs_core::Error> for Error {
    fn from(_: spectrum_rs_core::Error) -> Self {
        Error::InvalidArg
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "alloc")]
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            #[cfg(not(feature = "alloc"))]
            Error::InvalidArg => write!(f, "Invalid argument."),
            Error::Config(err) => write!(f, "Invalid configuration: {err}"),
            Error::Exec(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Exec(err) => Some(err),
            _ => None,
        }
    }
}
