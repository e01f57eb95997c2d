//! Default tokenizer.
//!
//! Splits raw address text into words, numbers and single punctuation tokens,
//! keeping byte spans into the original text so components can be cut out of
//! it verbatim. Whitespace other than newlines is not emitted.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Word,
    Numeric,
    Punct,
    Comma,
    Hyphen,
    Dash,
    /// A hyphen or dash standing alone between spaces, e.g. "Main St - Springfield".
    BreakingDash,
    Newline,
    Semicolon,
    PunctOpen,
    PunctClose,
    AtSign,
    Period,
    Colon,
    InvalidChar,
}

impl TokenType {
    /// Hard separators never appear inside a dictionary phrase.
    pub fn is_separator(self) -> bool {
        matches!(
            self,
            TokenType::Comma
                | TokenType::Newline
                | TokenType::Hyphen
                | TokenType::Dash
                | TokenType::BreakingDash
                | TokenType::Semicolon
                | TokenType::PunctOpen
                | TokenType::PunctClose
                | TokenType::AtSign
        )
    }

    /// Separators that end an address field.
    pub fn is_field_separator(self) -> bool {
        matches!(
            self,
            TokenType::Comma | TokenType::Newline | TokenType::Semicolon | TokenType::BreakingDash
        )
    }

    pub fn is_ignorable(self) -> bool {
        matches!(self, TokenType::InvalidChar | TokenType::Period | TokenType::Colon)
    }

    pub fn is_word_like(self) -> bool {
        matches!(self, TokenType::Word | TokenType::Numeric)
    }

    /// Type of an already isolated token, used for pre-tokenized input.
    pub fn classify(s: &str) -> TokenType {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => TokenType::InvalidChar,
            (Some(c), None) if !is_word_char(c) => punct_type(c),
            _ => {
                if s.chars().any(char::is_numeric) {
                    TokenType::Numeric
                } else if s.chars().any(char::is_alphabetic) {
                    TokenType::Word
                } else {
                    TokenType::Punct
                }
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

fn punct_type(c: char) -> TokenType {
    match c {
        ',' | '\u{3001}' | '\u{ff0c}' => TokenType::Comma,
        '-' | '\u{2010}' | '\u{2011}' => TokenType::Hyphen,
        '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => TokenType::Dash,
        '\n' => TokenType::Newline,
        ';' => TokenType::Semicolon,
        '(' | '[' | '{' => TokenType::PunctOpen,
        ')' | ']' | '}' => TokenType::PunctClose,
        '@' => TokenType::AtSign,
        '.' | '\u{3002}' => TokenType::Period,
        ':' => TokenType::Colon,
        '\u{fffd}' => TokenType::InvalidChar,
        c if c.is_control() => TokenType::InvalidChar,
        _ => TokenType::Punct,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Byte offset into the original text.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    pub kind: TokenType,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// The original text and its tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizedString {
    text: String,
    tokens: Vec<Token>,
}

impl TokenizedString {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), tokens: Vec::new() }
    }

    /// Appends a token; the span must lie on char boundaries of the text.
    pub fn push(&mut self, offset: usize, len: usize, kind: TokenType) {
        debug_assert!(self.text.is_char_boundary(offset) && self.text.is_char_boundary(offset + len));
        self.tokens.push(Token { offset, len, kind });
    }

    /// Builds a tokenized string from tokens that are already split, joining
    /// them with single spaces.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            if i > 0 {
                text.push(' ');
            }
            spans.push(Token { offset: text.len(), len: token.len(), kind: TokenType::classify(token) });
            text.push_str(token);
        }
        Self { text, tokens: spans }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_str(&self, i: usize) -> &str {
        let t = &self.tokens[i];
        &self.text[t.offset..t.end()]
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.tokens.clear();
    }
}

pub fn tokenize(text: &str) -> TokenizedString {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map(|&(b, _)| b).unwrap_or(text.len());
    let mut out = TokenizedString::new(text);

    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        if c == '\n' {
            out.push(offset, c.len_utf8(), TokenType::Newline);
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if is_word_char(c) {
            let start = i;
            let mut numeric = false;
            while i < chars.len() {
                let c = chars[i].1;
                if is_word_char(c) {
                    numeric |= c.is_numeric();
                    i += 1;
                } else if is_apostrophe(c)
                    && chars.get(i + 1).map_or(false, |&(_, n)| n.is_alphabetic())
                {
                    // O'Brien, l'Église
                    i += 1;
                } else {
                    break;
                }
            }
            let kind = if numeric { TokenType::Numeric } else { TokenType::Word };
            out.push(offset, byte_at(i) - byte_at(start), kind);
        } else {
            let mut kind = punct_type(c);
            if matches!(kind, TokenType::Hyphen | TokenType::Dash) {
                let space_before = i == 0 || chars[i - 1].1.is_whitespace();
                let space_after = i + 1 == chars.len() || chars[i + 1].1.is_whitespace();
                if space_before && space_after {
                    kind = TokenType::BreakingDash;
                }
            }
            out.push(offset, c.len_utf8(), kind);
            i += 1;
        }
    }
    out
}
