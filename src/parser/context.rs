use crate::normalize::normalize_token;
use crate::perceptron::FeatureSet;
use crate::phrases::{PhraseMatch, PhraseTrie};
use crate::tokenizer::{TokenType, TokenizedString};
use crate::trie::NodeId;

use super::AddressParser;

/// How a token separates the tokens around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeparatorKind {
    None,
    /// Skipped by phrase matching, e.g. a period.
    Ignorable,
    /// Separates tokens within one field, e.g. a hyphen.
    FieldInternal,
    /// Ends a field, e.g. a comma.
    Field,
}

impl SeparatorKind {
    pub fn of(kind: TokenType) -> Self {
        if kind.is_field_separator() {
            SeparatorKind::Field
        } else if kind.is_separator() {
            SeparatorKind::FieldInternal
        } else if kind.is_ignorable() {
            SeparatorKind::Ignorable
        } else {
            SeparatorKind::None
        }
    }

    /// No phrase may span a hard separator.
    pub fn is_hard(self) -> bool {
        matches!(self, SeparatorKind::FieldInternal | SeparatorKind::Field)
    }
}

/// Matches of one phrase trie and, per token, the index of the match that
/// covers it.
#[derive(Debug, Clone, Default)]
pub struct PhraseMemberships {
    phrases: Vec<PhraseMatch>,
    memberships: Vec<Option<usize>>,
}

impl PhraseMemberships {
    pub fn phrases(&self) -> &[PhraseMatch] {
        &self.phrases
    }

    pub fn memberships(&self) -> &[Option<usize>] {
        &self.memberships
    }

    /// The match covering token `i`, if any.
    pub fn get(&self, i: usize) -> Option<&PhraseMatch> {
        self.memberships
            .get(i)
            .copied()
            .flatten()
            .map(|m| &self.phrases[m])
    }

    fn clear(&mut self) {
        self.phrases.clear();
        self.memberships.clear();
    }

    fn fill(&mut self, trie: &PhraseTrie, roots: &[NodeId], normalized: &[String], separators: &[SeparatorKind]) {
        self.clear();
        self.memberships.resize(normalized.len(), None);
        if roots.is_empty() {
            return;
        }

        // positions of matchable tokens in the current segment
        let mut positions: Vec<usize> = Vec::new();
        let mut words: Vec<&str> = Vec::new();
        let mut i = 0;
        while i <= normalized.len() {
            let at_boundary = i == normalized.len() || separators[i].is_hard();
            if !at_boundary {
                if separators[i] != SeparatorKind::Ignorable {
                    positions.push(i);
                    words.push(&normalized[i]);
                }
                i += 1;
                continue;
            }
            self.scan_segment(trie, roots, &positions, &words);
            positions.clear();
            words.clear();
            i += 1;
        }
    }

    fn scan_segment(&mut self, trie: &PhraseTrie, roots: &[NodeId], positions: &[usize], words: &[&str]) {
        let mut j = 0;
        while j < words.len() {
            let Some((end, phrase_id)) = trie.search(roots, words, j) else {
                j += 1;
                continue;
            };
            let m = PhraseMatch {
                start: positions[j],
                end: positions[end - 1] + 1,
                phrase_id,
                types: trie.types(phrase_id).unwrap_or_default(),
            };
            let index = self.phrases.len();
            for membership in &mut self.memberships[m.start..m.end] {
                *membership = Some(index);
            }
            self.phrases.push(m);
            j = end;
        }
    }
}

/// Per-parse working state. Reusable across parses: [`AddressParser::parse`]
/// refills it and nothing from a previous parse leaks into the next.
#[derive(Debug, Default)]
pub struct AddressParserContext {
    language: String,
    country: String,
    tokenized: TokenizedString,
    normalized: Vec<String>,
    separators: Vec<SeparatorKind>,
    vocab: Vec<Option<u32>>,
    pub address_dictionary: PhraseMemberships,
    pub geodb: PhraseMemberships,
    pub component_phrases: PhraseMemberships,
    pub(crate) features: FeatureSet,
}

impl AddressParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn tokenized(&self) -> &TokenizedString {
        &self.tokenized
    }

    pub fn normalized(&self) -> &[String] {
        &self.normalized
    }

    pub fn separators(&self) -> &[SeparatorKind] {
        &self.separators
    }

    /// Vocabulary id of each token.
    pub fn vocab(&self) -> &[Option<u32>] {
        &self.vocab
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn clear(&mut self) {
        self.language.clear();
        self.country.clear();
        self.tokenized.clear();
        self.normalized.clear();
        self.separators.clear();
        self.vocab.clear();
        self.address_dictionary.clear();
        self.geodb.clear();
        self.component_phrases.clear();
        self.features.clear();
    }

    /// Normalizes and classifies every token, then runs the phrase scans of
    /// the three dictionaries. Each scan is independent of the others.
    pub fn fill(&mut self, parser: &AddressParser, tokenized: TokenizedString, language: &str, country: &str) {
        self.clear();
        self.language.push_str(&language.to_ascii_lowercase());
        self.country.push_str(&country.to_ascii_lowercase());
        self.tokenized = tokenized;

        for (i, token) in self.tokenized.tokens().iter().enumerate() {
            let normalized = normalize_token(self.tokenized.token_str(i), token.kind);
            self.vocab.push(parser.vocab().get(&normalized));
            self.normalized.push(normalized);
            self.separators.push(SeparatorKind::of(token.kind));
        }

        let (language, country) = (self.language.as_str(), self.country.as_str());
        let gazetteers = parser.gazetteers();
        let scans = [
            (&mut self.address_dictionary, &gazetteers.address_dictionary),
            (&mut self.geodb, &gazetteers.geodb),
            (&mut self.component_phrases, parser.phrase_types()),
        ];
        for (memberships, trie) in scans {
            let roots = trie.scope_roots(language, country);
            memberships.fill(trie, &roots, &self.normalized, &self.separators);
        }

        debug_assert_eq!(self.separators.len(), self.normalized.len());
        debug_assert_eq!(self.vocab.len(), self.normalized.len());
        debug_assert_eq!(self.geodb.memberships.len(), self.normalized.len());
    }
}
