use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SubmissionError;
use crate::language::Tokenizer;
use crate::token_stream::TokenStream;

/// Submissions with fewer tokens than this never take part in a comparison.
pub const MIN_SUBMISSION_TOKENS: usize = 3;

/// A single submission: a named set of files and, once parsed, its tokens.
#[derive(Debug, Clone)]
pub struct Submission {
    name: String,
    root: PathBuf,
    files: Vec<PathBuf>,
    tokens: Option<TokenStream>,
    has_errors: bool,
}

impl Submission {
    /// Unparsed submission. `files` are relative to `root`.
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        files: Vec<PathBuf>,
    ) -> Submission {
        Submission {
            name: name.into(),
            root: root.into(),
            files,
            tokens: None,
            has_errors: false,
        }
    }

    /// Submission whose tokens were produced elsewhere. It has no files, so
    /// no file-boundary tokens are subtracted from its size.
    pub fn from_tokens(name: impl Into<String>, tokens: TokenStream) -> Submission {
        Submission {
            name: name.into(),
            root: PathBuf::new(),
            files: Vec::new(),
            tokens: Some(tokens),
            has_errors: false,
        }
    }

    /// Attach the file list a pre-tokenized stream was built from.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Submission {
        self.files = files;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn tokens(&self) -> Option<&TokenStream> {
        self.tokens.as_ref()
    }

    pub fn number_of_tokens(&self) -> usize {
        self.tokens.as_ref().map_or(0, |t| t.size())
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn is_parsed(&self) -> bool {
        self.tokens.is_some()
    }

    /// Tokenize all files. On failure the submission is invalidated and the
    /// error returned for the caller to record.
    pub fn parse(&mut self, tokenizer: &mut dyn Tokenizer) -> Result<(), SubmissionError> {
        match tokenizer.tokenize(&self.root, &self.files) {
            Ok(tokens) => {
                self.tokens = Some(tokens);
                self.check_length(MIN_SUBMISSION_TOKENS)
            }
            Err(err) => {
                self.invalidate();
                Err(err.into())
            }
        }
    }

    /// Invalidate the submission if it holds fewer than `max(3, min)` tokens.
    pub fn check_length(&mut self, min: usize) -> Result<(), SubmissionError> {
        let need = min.max(MIN_SUBMISSION_TOKENS);
        let tokens = self.number_of_tokens();
        if self.tokens.is_some() && tokens < need {
            self.invalidate();
            return Err(SubmissionError::TooShort { tokens, min: need });
        }
        Ok(())
    }

    /// True if this submission may take part in a comparison with the given
    /// minimum tile length.
    pub fn is_comparable(&self, min_token_match: usize) -> bool {
        !self.has_errors
            && self.number_of_tokens() >= min_token_match.max(MIN_SUBMISSION_TOKENS)
    }

    fn invalidate(&mut self) {
        self.tokens = None;
        self.has_errors = true;
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The front end could not produce a token stream.
    Parse,
    /// Too few tokens to ever form a tile.
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub submission: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-run record of which submissions made it through parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub attempted: usize,
    pub failures: Vec<ParseFailure>,
}

impl ParseReport {
    pub fn record(&mut self, submission: &str, err: &SubmissionError) {
        let kind = match err {
            SubmissionError::Tokenize(_) => FailureKind::Parse,
            SubmissionError::TooShort { .. } => FailureKind::TooShort,
        };
        self.failures.push(ParseFailure {
            submission: submission.to_string(),
            kind,
            message: err.to_string(),
        });
    }

    pub fn parser_errors(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind == FailureKind::Parse)
            .count()
    }

    pub fn too_short(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind == FailureKind::TooShort)
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.failures.len())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenizeError;

    struct Fixed(Result<Vec<u32>, ()>);

    impl Tokenizer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn suffixes(&self) -> &'static [&'static str] {
            &[]
        }
        fn default_min_token_match(&self) -> usize {
            1
        }
        fn tokenize(
            &mut self,
            _root: &Path,
            _files: &[PathBuf],
        ) -> Result<TokenStream, TokenizeError> {
            match &self.0 {
                Ok(kinds) => Ok(TokenStream::from_kinds("f", kinds.iter().copied())),
                Err(()) => Err(TokenizeError::Syntax {
                    file: "f".into(),
                    line: 1,
                    message: "bad".into(),
                }),
            }
        }
    }

    #[test]
    fn two_tokens_is_too_short() {
        let mut sub = Submission::new("s", "/tmp", vec!["f".into()]);
        let err = sub.parse(&mut Fixed(Ok(vec![1, 2]))).unwrap_err();
        assert!(matches!(err, SubmissionError::TooShort { tokens: 2, min: 3 }));
        assert!(sub.has_errors());
        assert!(sub.tokens().is_none());
        assert!(!sub.is_comparable(1));
    }

    #[test]
    fn parse_failure_invalidates() {
        let mut sub = Submission::new("s", "/tmp", vec!["f".into()]);
        assert!(sub.parse(&mut Fixed(Err(()))).is_err());
        assert!(sub.has_errors());
        assert_eq!(sub.number_of_tokens(), 0);
    }

    #[test]
    fn shorter_than_min_match_is_invalidated() {
        let mut sub = Submission::from_tokens("s", TokenStream::from_kinds("f", [1, 2, 3, 4]));
        assert!(sub.is_comparable(4));
        assert!(sub.check_length(5).is_err());
        assert!(!sub.is_comparable(1));
    }

    #[test]
    fn report_counts_by_kind() {
        let mut report = ParseReport {
            attempted: 4,
            ..Default::default()
        };
        report.record("a", &SubmissionError::TooShort { tokens: 1, min: 3 });
        report.record("b", &SubmissionError::Tokenize(TokenizeError::NoFiles));
        assert_eq!(report.too_short(), 1);
        assert_eq!(report.parser_errors(), 1);
        assert_eq!(report.succeeded(), 2);
        assert!(!report.is_clean());
    }
}
