//! Error types for lsm-rs.
//!
//! Every failure of a pricing run is reported through the single
//! `thiserror`-derived [`Error`] enum.  The three domain failures are
//! [`Error::InvalidParameter`] (detected before simulation starts),
//! [`Error::DegenerateInput`] and [`Error::NumericalInstability`] (detected
//! during the backward induction).  The `ensure!` and `fail!` macros cover
//! internal preconditions.

use thiserror::Error;

/// The top-level error type used throughout lsm-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A model parameter is outside its domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A cross-section or design matrix carries no usable information
    /// (zero dispersion, singular beyond regularisation).
    #[error("degenerate input{}: {reason}", step_suffix(.step))]
    DegenerateInput {
        /// Time-step index at which the degeneracy was found, if known.
        step: Option<usize>,
        /// Description of the degeneracy.
        reason: String,
    },

    /// A numerical routine produced NaN or infinite values.
    #[error("numerical instability at step {step}: {reason}")]
    NumericalInstability {
        /// Time-step index at which the non-finite values appeared.
        step: usize,
        /// Description of the failure.
        reason: String,
    },

    /// General runtime error (raised by `fail!`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (raised by `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument, typically mismatched dimensions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn step_suffix(step: &Option<usize>) -> String {
    match step {
        Some(i) => format!(" at step {i}"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`].
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`Error::DegenerateInput`] without a step index.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            step: None,
            reason: reason.into(),
        }
    }

    /// Attach a time-step index to a [`Error::DegenerateInput`] that was
    /// raised without one.  Other variants are returned unchanged.
    pub fn at_step(self, step: usize) -> Self {
        match self {
            Self::DegenerateInput { step: None, reason } => Self::DegenerateInput {
                step: Some(step),
                reason,
            },
            other => other,
        }
    }
}

/// Shorthand `Result` type used throughout lsm-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use lsm_core::{ensure, errors::Error};
/// fn positive(x: f64) -> lsm_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use lsm_core::{fail, errors::Error};
/// fn always_err() -> lsm_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
