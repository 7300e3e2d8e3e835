use core::{error, fmt};

/// Result alias used by the primitives in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the core primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument could not be transformed.
    #[cfg(feature = "alloc")]
    InvalidArg {
        /// Name of the offending argument.
        arg: alloc::string::String,
        /// Why it was rejected.
        reason: alloc::string::String,
    },
    /// An argument could not be transformed.
    #[cfg(not(feature = "alloc"))]
    InvalidArg,
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

    #[cfg(not(feature = "alloc"))]
    pub(crate) fn invalid_arg(_arg: &str, _reason: &str) -> Self {
        Error::InvalidArg
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "alloc")]
            Error::InvalidArg { arg, reason } => write!(f, "Invalid argument `{arg}`: {reason}"),
            #[cfg(not(feature = "alloc"))]
            Error::InvalidArg => write!(f, "Invalid argument."),
        }
    }
}

impl error::Error for Error {}
