use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pollen simulation core.
///
/// A degenerate least-squares fit is deliberately absent here: it surfaces as
/// non-finite slope/intercept on [`crate::fit::LinearFit`] and is reported as-is.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected run parameters (e.g. a particle count that is not a perfect square).
    /// Detected before any particle is updated.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Attempt to record more samples than the window was sized for.
    ///
    /// Internal guard only: the driver sizes the window to exactly the number
    /// of sampled steps, so a run never returns this.
    #[error("sample window is full (capacity {capacity})")]
    SampleWindowFull { capacity: usize },
}

impl Error {
    /// Process exit status for a run aborted by this error.
    ///
    /// Only `InvalidConfiguration` (-1) is reachable from the binary; the
    /// window guard gets its own code so a broken invariant is not mistaken
    /// for bad input.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfiguration(_) => -1,
            Error::SampleWindowFull { .. } => -2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidConfiguration("particle count 5 is not a perfect square".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("perfect square"));
    }

    #[test]
    fn invalid_configuration_exits_negative() {
        let e = Error::InvalidConfiguration("bad".into());
        assert_eq!(e.exit_code(), -1);
        assert!(Error::SampleWindowFull { capacity: 3 }.exit_code() < 0);
    }
}
