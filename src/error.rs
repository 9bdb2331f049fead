//! Error types for tokenization, token access and detection runs.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenStreamError {
    #[error("token index {index} out of range for stream of {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failure reported by a front end while producing a token stream.
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("cannot read {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", file.display())]
    Syntax {
        file: PathBuf,
        line: u32,
        message: String,
    },

    #[error("nothing to parse")]
    NoFiles,

    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },
}

impl TokenizeError {
    /// Only resource exhaustion aborts a run; everything else just removes
    /// the submission from the comparison set.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TokenizeError::ResourceExhausted { .. })
    }
}

/// Why a single submission was removed from the comparison set.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("submission is too short ({tokens} tokens, need at least {min})")]
    TooShort { tokens: usize, min: usize },
}

/// Errors that abort a whole detection run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("not enough valid submissions (found {found} valid submissions)")]
    NotEnoughSubmissions { found: usize },

    #[error("base code submission \"{name}\" not found")]
    BaseCodeNotFound { name: String },

    #[error("bad base code submission \"{name}\": {reason}")]
    BadBaseCode { name: String, reason: String },

    #[error(
        "base code submission \"{name}\" contains {tokens} tokens, \
         fewer than the minimum match length {min}"
    )]
    BaseCodeTooShort {
        name: String,
        tokens: usize,
        min: usize,
    },

    #[error("resource exhausted while parsing submission \"{submission}\": {message}")]
    ResourceExhausted { submission: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exhaustion_is_fatal() {
        assert!(TokenizeError::ResourceExhausted {
            message: "oom".into()
        }
        .is_fatal());
        assert!(!TokenizeError::NoFiles.is_fatal());
        assert!(!TokenizeError::Syntax {
            file: "a.txt".into(),
            line: 3,
            message: "unexpected".into()
        }
        .is_fatal());
    }

    #[test]
    fn run_error_messages_name_the_submission() {
        let err = RunError::ResourceExhausted {
            submission: "alice".into(),
            message: "oom".into(),
        };
        assert!(err.to_string().contains("\"alice\""));

        let err = RunError::NotEnoughSubmissions { found: 1 };
        assert!(err.to_string().contains("found 1"));
    }
}
