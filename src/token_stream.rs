use std::ops::Index;
use std::sync::Arc;

use crate::core::{Token, TokenKind};
use crate::error::TokenStreamError;

/// Ordered, append-only token sequence of one submission.
///
/// Within one file, line numbers never decrease: a token that reports a line
/// below its predecessor from the same file is clamped to the predecessor's
/// line on `append`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> TokenStream {
        TokenStream { tokens: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> TokenStream {
        TokenStream {
            tokens: Vec::with_capacity(capacity),
        }
    }

    /// Build a single-file stream from raw kinds, one token per line.
    /// Mostly useful for tests and synthetic corpora.
    pub fn from_kinds<I>(file: &str, kinds: I) -> TokenStream
    where
        I: IntoIterator<Item = u32>,
    {
        let file: Arc<str> = Arc::from(file);
        let mut stream = TokenStream::new();
        for (i, k) in kinds.into_iter().enumerate() {
            stream.append(Token::new(TokenKind(k), file.clone(), i as u32 + 1, 1, 1));
        }
        stream
    }

    pub fn append(&mut self, mut token: Token) {
        if let Some(last) = self.tokens.last() {
            if token.line < last.line && token.file == last.file {
                token.line = last.line;
            }
        }
        self.tokens.push(token);
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Token, TokenStreamError> {
        self.tokens
            .get(index)
            .ok_or(TokenStreamError::IndexOutOfRange {
                index,
                len: self.tokens.len(),
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn kinds(&self) -> impl Iterator<Item = TokenKind> + '_ {
        self.tokens.iter().map(|t| t.kind)
    }

    /// Number of `FILE_END` markers in the stream.
    pub fn file_end_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::FILE_END)
            .count()
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl Extend<Token> for TokenStream {
    fn extend<T: IntoIterator<Item = Token>>(&mut self, iter: T) {
        for token in iter {
            self.append(token);
        }
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        let mut stream = TokenStream::new();
        stream.extend(iter);
        stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: u32, file: &Arc<str>, line: u32) -> Token {
        Token::new(TokenKind(kind), file.clone(), line, 1, 1)
    }

    #[test]
    fn clamps_decreasing_line_within_file() {
        let f: Arc<str> = Arc::from("Main.java");
        let mut s = TokenStream::new();
        s.append(tok(1, &f, 10));
        s.append(tok(2, &f, 4));
        assert_eq!(s[1].line, 10);
    }

    #[test]
    fn does_not_clamp_across_files() {
        let f: Arc<str> = Arc::from("A.java");
        let g: Arc<str> = Arc::from("B.java");
        let mut s = TokenStream::new();
        s.append(tok(1, &f, 10));
        s.append(tok(2, &g, 1));
        assert_eq!(s[1].line, 1);
    }

    #[test]
    fn get_out_of_range_is_error() {
        let s = TokenStream::from_kinds("x", [1, 2, 3]);
        assert_eq!(s.size(), 3);
        assert_eq!(s.get(2).map(|t| t.kind), Ok(TokenKind(3)));
        assert_eq!(
            s.get(3).err(),
            Some(TokenStreamError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn collect_applies_clamping() {
        let f: Arc<str> = Arc::from("a");
        let s: TokenStream = vec![tok(1, &f, 5), tok(1, &f, 2), tok(1, &f, 7)]
            .into_iter()
            .collect();
        let lines: Vec<u32> = s.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![5, 5, 7]);
    }
}
