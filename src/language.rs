//! Front-end registry.
//!
//! A front end turns the files of one submission into a single ordered
//! [`TokenStream`], ending every file with a `FILE_END` token. The comparison
//! core never looks past that contract. Front ends are chosen by [`Language`]
//! and constructed through [`Language::tokenizer`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Token, TokenKind};
use crate::error::TokenizeError;
use crate::token_stream::TokenStream;

pub trait Tokenizer: Send {
    fn name(&self) -> &'static str;

    /// File suffixes this front end accepts.
    fn suffixes(&self) -> &'static [&'static str];

    fn default_min_token_match(&self) -> usize;

    /// Tokenize `files` (relative to `root`) into one stream.
    fn tokenize(&mut self, root: &Path, files: &[PathBuf]) -> Result<TokenStream, TokenizeError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Word-level tokens for natural language and unknown source formats.
    #[default]
    Text,
    /// One token per non-whitespace character.
    Char,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Text => "text",
            Language::Char => "char",
        }
    }

    pub fn default_min_token_match(self) -> usize {
        match self {
            Language::Text => TextTokenizer::DEFAULT_MIN_TOKEN_MATCH,
            Language::Char => CharTokenizer::DEFAULT_MIN_TOKEN_MATCH,
        }
    }

    pub fn tokenizer(self) -> Box<dyn Tokenizer> {
        match self {
            Language::Text => Box::new(TextTokenizer::new()),
            Language::Char => Box::new(CharTokenizer),
        }
    }
}

fn file_label(file: &Path) -> Arc<str> {
    Arc::from(file.to_string_lossy().replace('\\', "/"))
}

fn read_source(root: &Path, file: &Path) -> Result<String, TokenizeError> {
    std::fs::read_to_string(root.join(file)).map_err(|source| TokenizeError::Io {
        file: file.to_path_buf(),
        source,
    })
}

/// Word-level front end. Identifiers and numbers become one token each, every
/// other non-whitespace character is its own token. Kinds are interned per
/// tokenizer instance, so all submissions of a run must share one instance.
#[derive(Debug, Default)]
pub struct TextTokenizer {
    kinds: HashMap<String, u32>,
}

impl TextTokenizer {
    pub const DEFAULT_MIN_TOKEN_MATCH: usize = 5;

    pub fn new() -> TextTokenizer {
        TextTokenizer::default()
    }

    fn intern(&mut self, word: &str) -> TokenKind {
        if let Some(&k) = self.kinds.get(word) {
            return TokenKind(k);
        }
        let k = self.kinds.len() as u32;
        self.kinds.insert(word.to_string(), k);
        TokenKind(k)
    }

    /// Number of distinct words seen so far.
    pub fn vocabulary_size(&self) -> usize {
        self.kinds.len()
    }

    /// Append the tokens of one in-memory source file, followed by `FILE_END`.
    pub fn tokenize_source(&mut self, file: &str, source: &str, out: &mut TokenStream) {
        let label: Arc<str> = Arc::from(file);
        let mut line = 1u32;
        let mut col = 1u32;
        let mut word = String::new();
        let mut word_col = 1u32;

        for ch in source.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                if word.is_empty() {
                    word_col = col;
                }
                word.push(ch);
                col += 1;
                continue;
            }
            if !word.is_empty() {
                let kind = self.intern(&word);
                let width = word.chars().count() as u32;
                out.append(Token::new(kind, label.clone(), line, word_col, width));
                word.clear();
            }
            if ch == '\n' {
                line += 1;
                col = 1;
                continue;
            }
            if !ch.is_whitespace() {
                let mut buf = [0u8; 4];
                let kind = self.intern(ch.encode_utf8(&mut buf));
                out.append(Token::new(kind, label.clone(), line, col, 1));
            }
            col += 1;
        }
        if !word.is_empty() {
            let kind = self.intern(&word);
            let width = word.chars().count() as u32;
            out.append(Token::new(kind, label.clone(), line, word_col, width));
        }
        out.append(Token::file_end(label, line));
    }
}

impl Tokenizer for TextTokenizer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &[".txt", ".asc", ".md"]
    }

    fn default_min_token_match(&self) -> usize {
        Self::DEFAULT_MIN_TOKEN_MATCH
    }

    fn tokenize(&mut self, root: &Path, files: &[PathBuf]) -> Result<TokenStream, TokenizeError> {
        if files.is_empty() {
            return Err(TokenizeError::NoFiles);
        }
        let mut stream = TokenStream::new();
        for file in files {
            let source = read_source(root, file)?;
            self.tokenize_source(&file_label(file), &source, &mut stream);
        }
        Ok(stream)
    }
}

/// Character-level front end: the kind of a token is its code point.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharTokenizer;

impl CharTokenizer {
    pub const DEFAULT_MIN_TOKEN_MATCH: usize = 10;

    pub fn tokenize_source(&self, file: &str, source: &str, out: &mut TokenStream) {
        let label: Arc<str> = Arc::from(file);
        let mut last_line = 1u32;
        for (i, text) in source.lines().enumerate() {
            let line = i as u32 + 1;
            last_line = line;
            for (c, ch) in text.chars().enumerate() {
                if !ch.is_whitespace() {
                    out.append(Token::new(
                        TokenKind(ch as u32),
                        label.clone(),
                        line,
                        c as u32 + 1,
                        1,
                    ));
                }
            }
        }
        out.append(Token::file_end(label, last_line));
    }
}

impl Tokenizer for CharTokenizer {
    fn name(&self) -> &'static str {
        "char"
    }

    fn suffixes(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_min_token_match(&self) -> usize {
        Self::DEFAULT_MIN_TOKEN_MATCH
    }

    fn tokenize(&mut self, root: &Path, files: &[PathBuf]) -> Result<TokenStream, TokenizeError> {
        if files.is_empty() {
            return Err(TokenizeError::NoFiles);
        }
        let mut stream = TokenStream::new();
        for file in files {
            let source = read_source(root, file)?;
            self.tokenize_source(&file_label(file), &source, &mut stream);
        }
        Ok(stream)
    }
}
