//! End-to-end run: parse, filter, compare.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{MatcherKind, RunOptions};
use crate::error::{RunError, SubmissionError};
use crate::greedy::GreedyTiler;
use crate::hashed::HashedTiler;
use crate::language::Tokenizer;
use crate::strategy::{ComparisonResult, ComparisonStrategy};
use crate::submission::{MIN_SUBMISSION_TOKENS, ParseReport, Submission};

pub struct Detector {
    options: RunOptions,
    tokenizer: Option<Box<dyn Tokenizer>>,
}

impl Detector {
    /// Detector using the front end registered for `options.language`.
    pub fn new(options: RunOptions) -> Detector {
        Detector {
            options,
            tokenizer: None,
        }
    }

    /// Use a custom front end instead of the registered one.
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Detector {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run a full detection over `submissions`.
    ///
    /// Submissions that fail to parse or are too short are dropped and listed
    /// in the result's `parse_report`. The run fails if fewer than two valid
    /// submissions remain, if the configured base code is missing or unusable,
    /// or if a front end runs out of resources.
    pub fn run(&mut self, mut submissions: Vec<Submission>) -> Result<ComparisonResult, RunError> {
        self.options.validate()?;
        let min = self.options.min_token_match();
        let language = self.options.language;
        let tokenizer = self.tokenizer.get_or_insert_with(|| language.tokenizer());

        let span = tracing::info_span!(
            "detect",
            tokenizer = tokenizer.name(),
            min_token_match = min
        );
        let _enter = span.enter();

        let mut base_code = match &self.options.base_code {
            Some(name) => {
                let pos = submissions
                    .iter()
                    .position(|s| s.name() == name)
                    .ok_or_else(|| RunError::BaseCodeNotFound { name: name.clone() })?;
                Some(submissions.remove(pos))
            }
            None => None,
        };

        let mut report = ParseReport {
            attempted: submissions.len(),
            ..Default::default()
        };
        for sub in submissions.iter_mut() {
            let parsed = if sub.is_parsed() {
                sub.check_length(MIN_SUBMISSION_TOKENS)
            } else {
                sub.parse(&mut **tokenizer)
            };
            let outcome = parsed.and_then(|()| sub.check_length(min));

            match outcome {
                Ok(()) => {}
                Err(SubmissionError::Tokenize(err)) if err.is_fatal() => {
                    return Err(RunError::ResourceExhausted {
                        submission: sub.name().to_string(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(submission = sub.name(), error = %err, "parse_failure");
                    report.record(sub.name(), &err);
                }
            }
        }
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded(),
            parser_errors = report.parser_errors(),
            too_short = report.too_short(),
            "parse_summary"
        );

        let valid = submissions.iter().filter(|s| s.is_comparable(min)).count();
        if valid < 2 {
            return Err(RunError::NotEnoughSubmissions { found: valid });
        }

        if let Some(bc) = base_code.as_mut() {
            prepare_base_code(bc, &mut **tokenizer, min)?;
        }

        let submissions: Vec<Arc<Submission>> = submissions.into_iter().map(Arc::new).collect();
        let cfg = self.options.tiling_config();
        let mut result = match self.options.matcher {
            MatcherKind::Naive => {
                ComparisonStrategy::new(GreedyTiler::with_config(&cfg), self.options.clone())
                    .compare(&submissions, base_code.as_ref())
            }
            MatcherKind::Hashed => {
                ComparisonStrategy::new(HashedTiler::with_config(&cfg), self.options.clone())
                    .compare(&submissions, base_code.as_ref())
            }
        };
        result.parse_report = report;
        Ok(result)
    }
}

fn prepare_base_code(
    bc: &mut Submission,
    tokenizer: &mut dyn Tokenizer,
    min: usize,
) -> Result<(), RunError> {
    let name = bc.name().to_string();
    let parsed = if bc.is_parsed() {
        bc.check_length(MIN_SUBMISSION_TOKENS)
    } else {
        bc.parse(tokenizer)
    };
    match parsed {
        Ok(()) => {}
        Err(SubmissionError::Tokenize(err)) if err.is_fatal() => {
            return Err(RunError::ResourceExhausted {
                submission: name,
                message: err.to_string(),
            });
        }
        Err(SubmissionError::Tokenize(err)) => {
            return Err(RunError::BadBaseCode {
                name,
                reason: err.to_string(),
            });
        }
        Err(SubmissionError::TooShort { tokens, .. }) => {
            return Err(RunError::BaseCodeTooShort { name, tokens, min });
        }
    }
    let tokens = bc.number_of_tokens();
    if tokens < min {
        return Err(RunError::BaseCodeTooShort { name, tokens, min });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenizeError;
    use crate::token_stream::TokenStream;
    use std::path::{Path, PathBuf};

    fn pre(name: &str, kinds: &[u32]) -> Submission {
        Submission::from_tokens(name, TokenStream::from_kinds(name, kinds.iter().copied()))
    }

    /// Front end that fails on a chosen file name.
    struct Exhausting;

    impl Tokenizer for Exhausting {
        fn name(&self) -> &'static str {
            "exhausting"
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
            files: &[PathBuf],
        ) -> Result<TokenStream, TokenizeError> {
            if files.iter().any(|f| f.ends_with("huge.txt")) {
                return Err(TokenizeError::ResourceExhausted {
                    message: "out of memory".into(),
                });
            }
            Ok(TokenStream::from_kinds("f", [1, 2, 3, 4, 5]))
        }
    }

    #[test]
    fn missing_base_code_is_fatal() {
        let mut d = Detector::new(RunOptions::new().with_base_code("template"));
        let err = d
            .run(vec![pre("a", &[1, 2, 3, 4, 5]), pre("b", &[1, 2, 3, 4, 5])])
            .unwrap_err();
        assert!(matches!(err, RunError::BaseCodeNotFound { name } if name == "template"));
    }

    #[test]
    fn short_base_code_is_fatal() {
        let mut d = Detector::new(RunOptions::new().with_min_token_match(4).with_base_code("bc"));
        let err = d
            .run(vec![
                pre("a", &[1, 2, 3, 4, 5]),
                pre("b", &[1, 2, 3, 4, 5]),
                pre("bc", &[1, 2, 3]),
            ])
            .unwrap_err();
        assert!(matches!(err, RunError::BaseCodeTooShort { tokens: 3, min: 4, .. }));
    }

    #[test]
    fn exhaustion_names_the_submission() {
        let mut d = Detector::new(RunOptions::new()).with_tokenizer(Box::new(Exhausting));
        let err = d
            .run(vec![
                Submission::new("ok", "/", vec!["a.txt".into()]),
                Submission::new("big", "/", vec!["huge.txt".into()]),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::ResourceExhausted { submission, .. } if submission == "big"
        ));
    }

    #[test]
    fn invalid_options_fail_before_parsing() {
        let mut d = Detector::new(RunOptions::new().with_similarity_threshold(150.0));
        assert!(matches!(d.run(Vec::new()), Err(RunError::Config(_))));
    }

    #[test]
    fn report_is_attached() {
        let mut d = Detector::new(RunOptions::new().with_min_token_match(3));
        let result = d
            .run(vec![
                pre("a", &[1, 2, 3, 4]),
                pre("tiny", &[1, 2]),
                pre("b", &[1, 2, 3, 4]),
            ])
            .unwrap();
        assert_eq!(result.parse_report.attempted, 3);
        assert_eq!(result.parse_report.too_short(), 1);
        assert_eq!(result.comparisons.len(), 1);
        assert_eq!(result.number_of_submissions, 3);
    }
}
