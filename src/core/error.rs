use std::fmt;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Parser failure: unbalanced quotes/parens, empty phrase, bad flag.
    MalformedQuery,
    /// Document id counter overflow during indexing.
    TokenExhaustion,
    /// Bad magic, truncated chunk or CRC mismatch while loading an index.
    IndexCorruption,
    /// Configured stemmer not available for the requested language.
    StemmerUnavailable,
    /// Wildcard matcher exceeded its per-candidate step budget.
    MatcherTimeout,
    /// Correction loop reached its attempt bound with no matches.
    CorrectionExhausted,
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn malformed_query(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::MalformedQuery, context)
    }

    pub fn corruption(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::IndexCorruption, context)
    }

    /// Recoverable errors are logged and the surrounding operation proceeds;
    /// everything else aborts the current query or build.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::StemmerUnavailable
                | ErrorKind::MatcherTimeout
                | ErrorKind::CorrectionExhausted
        )
    }

    /// Apply the recovery policy: a recoverable error is logged and the
    /// caller may continue (returns true); anything else must be propagated.
    pub fn recover(&self) -> bool {
        let recoverable = self.is_recoverable();
        if recoverable {
            warn!(error = %self, "continuing after recoverable error");
        }
        recoverable
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error {
            kind: ErrorKind::Internal,
            context: format!("FST error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_policy_covers_the_degradable_kinds() {
        for kind in [
            ErrorKind::StemmerUnavailable,
            ErrorKind::MatcherTimeout,
            ErrorKind::CorrectionExhausted,
        ] {
            let err = Error::new(kind, "x");
            assert!(err.is_recoverable());
            assert!(err.recover());
        }
        for kind in [
            ErrorKind::MalformedQuery,
            ErrorKind::TokenExhaustion,
            ErrorKind::IndexCorruption,
            ErrorKind::Io,
        ] {
            let err = Error::new(kind, "x");
            assert!(!err.is_recoverable());
            assert!(!err.recover());
        }
    }
}
