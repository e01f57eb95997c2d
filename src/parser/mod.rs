//! The address parser: a trained model plus the dictionaries its features
//! are computed from.

pub mod context;
pub mod features;
pub mod io;
pub mod module;
pub mod response;

use crate::label::Label;
use crate::perceptron::{self, AveragedPerceptron};
use crate::phrases::{Gazetteers, PhraseTrie};
use crate::tokenizer::{tokenize, TokenizedString};
use crate::trie::Trie;

pub use context::{AddressParserContext, SeparatorKind};
pub use module::ParserModule;
pub use response::{ParseResponse, ParsedComponent};

/// Immutable once built. Share it behind an `Arc`; every parse brings its
/// own [`AddressParserContext`].
#[derive(Debug, Clone, Default)]
pub struct AddressParser {
    model: AveragedPerceptron,
    /// Normalized token to vocabulary id.
    vocab: Trie,
    /// Component phrases with packed `AddressParserTypes`.
    phrase_types: PhraseTrie,
    gazetteers: Gazetteers,
}

impl AddressParser {
    pub fn new(model: AveragedPerceptron, vocab: Trie, phrase_types: PhraseTrie, gazetteers: Gazetteers) -> Self {
        Self { model, vocab, phrase_types, gazetteers }
    }

    pub fn model(&self) -> &AveragedPerceptron {
        &self.model
    }

    pub fn vocab(&self) -> &Trie {
        &self.vocab
    }

    pub fn phrase_types(&self) -> &PhraseTrie {
        &self.phrase_types
    }

    pub fn gazetteers(&self) -> &Gazetteers {
        &self.gazetteers
    }

    pub fn with_gazetteers(mut self, gazetteers: Gazetteers) -> Self {
        self.gazetteers = gazetteers;
        self
    }

    /// Tokenizes and parses raw address text.
    pub fn parse(
        &self,
        address: &str,
        language: &str,
        country: &str,
        ctx: &mut AddressParserContext,
    ) -> ParseResponse {
        self.parse_tokenized(tokenize(address), language, country, ctx)
    }

    /// Parses tokens that were split by the caller. The component text joins
    /// them with single spaces.
    pub fn parse_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        language: &str,
        country: &str,
        ctx: &mut AddressParserContext,
    ) -> ParseResponse {
        self.parse_tokenized(TokenizedString::from_tokens(tokens), language, country, ctx)
    }

    pub fn parse_tokenized(
        &self,
        tokenized: TokenizedString,
        language: &str,
        country: &str,
        ctx: &mut AddressParserContext,
    ) -> ParseResponse {
        ctx.fill(self, tokenized, language, country);
        let labels = self.tag(ctx);
        let response = ParseResponse::from_labels(ctx.tokenized(), ctx.separators(), &labels);
        log::debug!(
            "parsed {} tokens into {} components ({}/{})",
            labels.len(),
            response.len(),
            ctx.language(),
            ctx.country()
        );
        response
    }

    /// One label per token of an already filled context.
    pub fn tag(&self, ctx: &mut AddressParserContext) -> Vec<Label> {
        let mut features = std::mem::take(&mut ctx.features);
        let mut labels = Vec::with_capacity(ctx.len());
        perceptron::tag(&self.model, self, ctx, &Label::COMPONENTS, &mut features, &mut labels);
        ctx.features = features;
        labels
    }
}
