use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Error taxonomy for the analysis pipeline.
///
/// `ConfigError` and `InvariantError` abort a run; `IOError` and
/// `ParseError` are recovered locally by the orchestrator (the offending
/// file contributes no code nodes); `PatternError` is dropped silently by
/// whichever component compiled the pattern; `Cancelled` unwinds straight
/// to `FINALIZATION`.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("pattern error: {0}")]
    Pattern(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Whether this error is recoverable at the file level (the pipeline
    /// continues, recording an event, rather than aborting the run).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::Io { .. } | CoreError::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_parse_are_not_recoverable_or_are() {
        let io = CoreError::io("a.rs", std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert!(io.is_recoverable());

        let parse = CoreError::parse("a.rs", "bad token");
        assert!(parse.is_recoverable());

        let cfg = CoreError::config("bad option");
        assert!(!cfg.is_recoverable());

        let inv = CoreError::invariant("dangling edge");
        assert!(!inv.is_recoverable());
    }
}
