use std::fmt;
use std::io;
use thiserror::Error;

/// A dot-segmented error-kind identifier, used by the retry executor's
/// `failKinds`/`retryKinds` matching (a kind matches a category if it is
/// equal to, or a sub-kind of, any kind in that category).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Kind(pub &'static str);

impl Kind {
    pub const USAGE: Kind = Kind("usage");
    pub const CONFIGURATION: Kind = Kind("configuration");
    pub const CONSTRUCTION: Kind = Kind("construction");
    pub const ENCODING: Kind = Kind("encoding");
    pub const TRANSIENT: Kind = Kind("transient");
    pub const TRANSIENT_TIMEOUT: Kind = Kind("transient.timeout");
    pub const TRANSIENT_CONNECTION: Kind = Kind("transient.connection");
    pub const PERMANENT: Kind = Kind("permanent");
    pub const INTERRUPTED: Kind = Kind("interrupted");

    /// True if `self` is `other`, or a dotted sub-kind of `other`
    /// (`"transient.timeout"` is a sub-kind of `"transient"`).
    pub fn matches(&self, other: &Kind) -> bool {
        self.0 == other.0 || self.0.starts_with(&format!("{}.", other.0))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Error)]
pub enum DynamoError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("construction error: {0}")]
    Construction(String),

    #[error("encoding error on field '{field}': {message}")]
    Encoding { field: String, message: String },

    #[error("transient delivery error: {0}")]
    Transient(String),

    #[error("permanent delivery error: {0}")]
    Permanent(String),

    #[error("interrupted: {0}")]
    Interrupted(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl DynamoError {
    pub fn kind(&self) -> Kind {
        match self {
            DynamoError::Usage(_) => Kind::USAGE,
            DynamoError::Configuration(_) => Kind::CONFIGURATION,
            DynamoError::Construction(_) => Kind::CONSTRUCTION,
            DynamoError::Encoding { .. } => Kind::ENCODING,
            DynamoError::Transient(_) => Kind::TRANSIENT,
            DynamoError::Permanent(_) => Kind::PERMANENT,
            DynamoError::Interrupted(_) => Kind::INTERRUPTED,
            DynamoError::Io(_) => Kind::TRANSIENT,
        }
    }

    pub fn encoding<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        DynamoError::Encoding {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Formats the error for logging, either as the top-level message only
    /// or with the full `source()` chain, per the `showStackTrace` option.
    pub fn describe(&self, show_chain: bool) -> String {
        if !show_chain {
            return self.to_string();
        }
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_kind_matches_parent() {
        assert!(Kind::TRANSIENT_TIMEOUT.matches(&Kind::TRANSIENT));
        assert!(Kind::TRANSIENT.matches(&Kind::TRANSIENT));
        assert!(!Kind::PERMANENT.matches(&Kind::TRANSIENT));
    }

    #[test]
    fn describe_without_chain_is_message_only() {
        let err = DynamoError::Transient("timeout".into());
        assert_eq!(err.describe(false), "transient delivery error: timeout");
    }
}
