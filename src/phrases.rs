//! Phrase dictionaries: scoped tries from normalized phrases to a phrase id
//! and a type bitmask.
//!
//! The same phrase can mean different things per language ("st" is a street
//! type in English and a saint elsewhere), so keys are prefixed with a scope
//! and lookups fall back from language+country to language to global.

use bitflags::bitflags;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::format::{put_block, ByteReader};
use crate::normalize::normalize_phrase;
use crate::trie::{NodeId, Trie, ROOT};

bitflags! {
    /// Address dictionary phrase types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct DictionaryType: u32 {
        const STREET_TYPE = 1 << 0;
        const DIRECTIONAL = 1 << 1;
        const BUILDING_TYPE = 1 << 2;
        const LEVEL = 1 << 3;
        const UNIT = 1 << 4;
        const POST_OFFICE = 1 << 5;
        const PERSONAL_TITLE = 1 << 6;
        const TOPONYM = 1 << 7;
        const NUMBER = 1 << 8;
        const STOPWORD = 1 << 9;
        const QUALIFIER = 1 << 10;
        const PLACE_NAME = 1 << 11;
    }
}

bitflags! {
    /// Geographic database phrase types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct GeoType: u32 {
        const COUNTRY = 1 << 0;
        const ADMIN1 = 1 << 1;
        const ADMIN2 = 1 << 2;
        const ADMIN3 = 1 << 3;
        const LOCALITY = 1 << 4;
        const NEIGHBORHOOD = 1 << 5;
        const POSTAL_CODE = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    LanguageCountry(&'a str, &'a str),
    Language(&'a str),
    Global,
}

impl<'a> Scope<'a> {
    /// Key prefix of the scope. Codes are case-insensitive.
    pub fn prefix(&self) -> String {
        match self {
            Scope::LanguageCountry(l, c) => {
                format!("{}|{}|", l.to_ascii_lowercase(), c.to_ascii_lowercase())
            }
            Scope::Language(l) => format!("{}||", l.to_ascii_lowercase()),
            Scope::Global => "||".to_string(),
        }
    }

    /// Lookup order, most specific first.
    pub fn chain(language: &'a str, country: &'a str) -> [Scope<'a>; 3] {
        [Scope::LanguageCountry(language, country), Scope::Language(language), Scope::Global]
    }
}

/// A dictionary phrase found in a token sequence. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    pub start: usize,
    pub end: usize,
    pub phrase_id: u32,
    pub types: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhrasePosition {
    Unit,
    Begin,
    Inside,
    End,
}

impl PhrasePosition {
    pub fn name(self) -> &'static str {
        match self {
            PhrasePosition::Unit => "unit",
            PhrasePosition::Begin => "begin",
            PhrasePosition::Inside => "inside",
            PhrasePosition::End => "end",
        }
    }
}

impl PhraseMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Where token `i` (which must lie inside the match) sits in the phrase.
    pub fn position_of(&self, i: usize) -> PhrasePosition {
        if self.len() == 1 {
            PhrasePosition::Unit
        } else if i == self.start {
            PhrasePosition::Begin
        } else if i + 1 == self.end {
            PhrasePosition::End
        } else {
            PhrasePosition::Inside
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhraseTrie {
    trie: Trie,
    /// Type bitmask per phrase id.
    types: Vec<u32>,
}

impl PhraseTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Adds an already normalized phrase, returning its phrase id. Adding a
    /// phrase twice in the same scope replaces its types.
    pub fn insert(&mut self, scope: Scope<'_>, phrase: &str, types: u32) -> u32 {
        let key = scope.prefix() + phrase;
        if let Some(id) = self.trie.get(&key) {
            self.types[id as usize] = types;
            return id;
        }
        let id = self.types.len() as u32;
        self.trie.insert(&key, id);
        self.types.push(types);
        id
    }

    /// Normalizes raw phrase text the way tokens are normalized at parse
    /// time, then inserts it.
    pub fn add_phrase(&mut self, scope: Scope<'_>, phrase: &str, types: u32) -> Option<u32> {
        let key = normalize_phrase(phrase);
        if key.is_empty() {
            return None;
        }
        Some(self.insert(scope, &key, types))
    }

    pub fn types(&self, phrase_id: u32) -> Option<u32> {
        self.types.get(phrase_id as usize).copied()
    }

    /// Exact lookup of one phrase in one scope: `(phrase_id, types)`.
    pub fn get(&self, scope: Scope<'_>, phrase: &str) -> Option<(u32, u32)> {
        let id = self.trie.get(&(scope.prefix() + phrase))?;
        Some((id, self.types[id as usize]))
    }

    /// Trie nodes of the scopes present in this dictionary, most specific
    /// first. Resolved once per parse.
    pub fn scope_roots(&self, language: &str, country: &str) -> Vec<NodeId> {
        Scope::chain(language, country)
            .iter()
            .filter_map(|scope| self.trie.walk(ROOT, &scope.prefix()))
            .collect()
    }

    /// Longest phrase starting at `tokens[start]` in the first scope that has
    /// one. Returns the exclusive end and the phrase id.
    pub fn search<S: AsRef<str>>(
        &self,
        roots: &[NodeId],
        tokens: &[S],
        start: usize,
    ) -> Option<(usize, u32)> {
        roots
            .iter()
            .find_map(|&root| self.trie.search_longest_prefix_from(root, tokens, start))
    }

    /// `(scoped key, types)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (String, u32)> + '_ {
        self.trie
            .iter()
            .map(move |(key, id)| (key, self.types[id as usize]))
    }

    pub fn save(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_block(&mut out, &self.trie.save());
        out.extend_from_slice(&(self.types.len() as u32).to_le_bytes());
        for t in &self.types {
            out.extend_from_slice(&t.to_le_bytes());
        }
        out
    }

    pub fn load(buf: &[u8]) -> Result<Self> {
        let mut rdr = ByteReader::new(buf, "phrase trie");
        let trie = Trie::load(rdr.read_block()?)?;
        let n = rdr.read_u32()? as usize;
        if n > rdr.remaining() / 4 {
            return Err(Error::invalid_model("truncated phrase types"));
        }
        let types = (0..n).map(|_| rdr.read_u32()).collect::<Result<Vec<_>>>()?;
        rdr.finish()?;
        if trie.len() != n {
            return Err(Error::invalid_model(format!(
                "phrase trie has {} keys but {} type records",
                trie.len(),
                n
            )));
        }
        if let Some((key, id)) = trie.iter().find(|&(_, id)| id as usize >= n) {
            return Err(Error::invalid_model(format!("phrase {key:?} has bad id {id}")));
        }
        Ok(Self { trie, types })
    }
}

/// External dictionaries consulted alongside the model's own phrase types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gazetteers {
    pub address_dictionary: PhraseTrie,
    pub geodb: PhraseTrie,
}
