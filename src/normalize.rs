//! String and token normalization applied before any dictionary or model
//! lookup. Dictionaries and feature names are keyed by these forms.

use bitflags::bitflags;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::tokenizer::{tokenize, TokenType};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenOptions: u16 {
        const DELETE_HYPHENS = 1 << 0;
        const DELETE_FINAL_PERIOD = 1 << 1;
        const DELETE_ACRONYM_PERIODS = 1 << 2;
        const REPLACE_DIGITS = 1 << 3;
    }
}

pub const ADDRESS_PARSER_TOKEN_OPTIONS: TokenOptions = TokenOptions::all();

/// Digits are collapsed to this class character.
pub const DIGIT_CLASS: char = 'D';

/// Decompose, drop combining marks, lowercase and fold to Latin ASCII where a
/// simple mapping exists.
pub fn normalize_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        for lc in c.to_lowercase() {
            push_latin_ascii(&mut out, lc);
        }
    }
    out
}

fn push_latin_ascii(out: &mut String, c: char) {
    match c {
        'ß' => out.push_str("ss"),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'þ' => out.push_str("th"),
        'ø' => out.push('o'),
        'đ' | 'ð' => out.push('d'),
        'ł' => out.push('l'),
        'ı' => out.push('i'),
        '\u{2018}' | '\u{2019}' => out.push('\''),
        _ => out.push(c),
    }
}

/// "u.s.a." style: single letters separated by periods.
fn is_acronym(s: &str) -> bool {
    let mut letters = 0;
    for part in s.split('.') {
        let mut chars = part.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(c), None) if c.is_alphabetic() => letters += 1,
            _ => return false,
        }
    }
    letters >= 2 && s.contains('.')
}

pub fn normalize_token_with(text: &str, kind: TokenType, options: TokenOptions) -> String {
    let s = normalize_string(text);
    if !kind.is_word_like() {
        return s;
    }
    let acronym = options.contains(TokenOptions::DELETE_ACRONYM_PERIODS) && is_acronym(&s);
    let last = s.len().saturating_sub(1);
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '-' if options.contains(TokenOptions::DELETE_HYPHENS) => {}
            '.' if acronym => {}
            '.' if i == last && options.contains(TokenOptions::DELETE_FINAL_PERIOD) => {}
            c if c.is_numeric() && options.contains(TokenOptions::REPLACE_DIGITS) => {
                out.push(DIGIT_CLASS)
            }
            c => out.push(c),
        }
    }
    out
}

/// Token normalization used by the parser.
pub fn normalize_token(text: &str, kind: TokenType) -> String {
    normalize_token_with(text, kind, ADDRESS_PARSER_TOKEN_OPTIONS)
}

/// Normalizes a dictionary phrase into the space-joined key form the tries
/// are searched with. Separators and ignorable tokens are dropped.
pub fn normalize_phrase(phrase: &str) -> String {
    let tokenized = tokenize(phrase);
    let mut out = String::with_capacity(phrase.len());
    for (i, token) in tokenized.tokens().iter().enumerate() {
        if token.kind.is_separator() || token.kind.is_ignorable() {
            continue;
        }
        let norm = normalize_token(tokenized.token_str(i), token.kind);
        if norm.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&norm);
    }
    out
}
