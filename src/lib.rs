//! Postal address parser.
//!
//! Labels each token of a free-form address (house number, road, city,
//! state, postcode, ...) with a greedy averaged perceptron whose features come
//! from the normalized tokens, the tagging history and three phrase
//! dictionaries, then merges consecutive tokens with the same label into
//! components.
//!
//! ```no_run
//! use address_parser::{AddressParserContext, ParserModule};
//!
//! let module = ParserModule::new();
//! module.setup("/usr/share/address_parser")?;
//! let mut ctx = AddressParserContext::new();
//! for component in &module.parse("123 Fake Street Brooklyn NY 12345", "en", "us", &mut ctx)? {
//!     println!("{}: {}", component.label, component.text);
//! }
//! # Ok::<(), address_parser::Error>(())
//! ```

pub mod dataset;
pub mod error;
pub mod evaluation;
mod format;
pub mod label;
pub mod normalize;
pub mod parser;
pub mod perceptron;
pub mod phrases;
pub mod quark;
pub mod tokenizer;
pub mod trie;

pub use dataset::{Dataset, LabeledAddress};
pub use error::{Error, Result};
pub use evaluation::{evaluate_parser, Evaluation};
pub use format::FORMAT_VERSION;
pub use label::{AddressParserTypes, ComponentSet, ComponentType, Label};
pub use parser::{
    AddressParser, AddressParserContext, ParseResponse, ParsedComponent, ParserModule, SeparatorKind,
};
pub use perceptron::{AveragedPerceptron, FeatureSet};
pub use phrases::{DictionaryType, Gazetteers, GeoType, PhraseTrie, Scope};
pub use tokenizer::{tokenize, TokenType, TokenizedString};
pub use trie::Trie;
