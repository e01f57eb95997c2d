//! Feature function of the address parser.
//!
//! Every family has its own name prefix so a weight lookup can never
//! confuse two families. Names are stable: they are the keys of the trained
//! weight table.

use crate::label::{AddressParserTypes, Label};
use crate::perceptron::{FeatureFunction, FeatureSet};
use crate::phrases::{DictionaryType, GeoType};

use super::context::{AddressParserContext, PhraseMemberships, SeparatorKind};
use super::AddressParser;

const ADDRESS_DICTIONARY_PREFIX: &str = "adict";
const GEODB_PREFIX: &str = "geo";
const COMPONENT_PHRASE_PREFIX: &str = "comp";

impl FeatureFunction for AddressParser {
    type Context = AddressParserContext;

    fn num_positions(&self, ctx: &AddressParserContext) -> usize {
        ctx.len()
    }

    fn fixed_label(&self, ctx: &AddressParserContext, i: usize) -> Option<Label> {
        match ctx.separators()[i] {
            SeparatorKind::Field => Some(Label::FieldSeparator),
            SeparatorKind::FieldInternal | SeparatorKind::Ignorable => Some(Label::Separator),
            SeparatorKind::None => None,
        }
    }

    fn features(
        &self,
        ctx: &AddressParserContext,
        i: usize,
        prev: Label,
        prev2: Label,
        out: &mut FeatureSet,
    ) {
        address_parser_features(ctx, i, prev, prev2, out)
    }
}

/// Features of token `i` given the two labels assigned before it.
pub fn address_parser_features(
    ctx: &AddressParserContext,
    i: usize,
    prev: Label,
    prev2: Label,
    out: &mut FeatureSet,
) {
    let normalized = ctx.normalized();
    let separators = ctx.separators();
    let n = normalized.len();
    let word = &normalized[i];

    out.add("bias");
    out.add(format!("word={word}"));
    if i > 0 {
        out.add(format!("prev_word={}", normalized[i - 1]));
    }
    if i + 1 < n {
        out.add(format!("next_word={}", normalized[i + 1]));
    }
    if let Some(id) = ctx.vocab()[i] {
        out.add(format!("vocab={id}"));
    }

    phrase_features(out, ADDRESS_DICTIONARY_PREFIX, &ctx.address_dictionary, i, |out, types| {
        for (name, _) in DictionaryType::from_bits_truncate(types).iter_names() {
            out.add(format!("{ADDRESS_DICTIONARY_PREFIX}_type={}", name.to_ascii_lowercase()));
        }
    });
    phrase_features(out, GEODB_PREFIX, &ctx.geodb, i, |out, types| {
        for (name, _) in GeoType::from_bits_truncate(types).iter_names() {
            out.add(format!("{GEODB_PREFIX}_type={}", name.to_ascii_lowercase()));
        }
    });
    phrase_features(out, COMPONENT_PHRASE_PREFIX, &ctx.component_phrases, i, |out, types| {
        if let Some(types) = AddressParserTypes::unpack(types) {
            for (name, _) in types.components.iter_names() {
                out.add(format!("{COMPONENT_PHRASE_PREFIX}_type={}", name.to_ascii_lowercase()));
            }
            out.add(format!(
                "{COMPONENT_PHRASE_PREFIX}_most_common={}",
                types.most_common.label()
            ));
        }
    });

    if i > 0 {
        separator_features(out, "prev", separators[i - 1]);
    }
    if i + 1 < n {
        separator_features(out, "next", separators[i + 1]);
    }

    out.add(format!("prev_label={prev}"));
    out.add(format!("label_history={prev2}|{prev}"));
    out.add(format!("prev_label_word={prev}|{word}"));

    if i == 0 {
        out.add("first_token");
    }
    if i + 1 == n {
        out.add("last_token");
    }
}

fn phrase_features<F>(out: &mut FeatureSet, prefix: &str, memberships: &PhraseMemberships, i: usize, types: F)
where
    F: FnOnce(&mut FeatureSet, u32),
{
    let Some(phrase) = memberships.get(i) else {
        return;
    };
    out.add(format!("{prefix}_phrase={}", phrase.phrase_id));
    out.add(format!("{prefix}_types={}", phrase.types));
    out.add(format!("{prefix}_pos={}", phrase.position_of(i).name()));
    types(out, phrase.types);
}

fn separator_features(out: &mut FeatureSet, side: &str, kind: SeparatorKind) {
    if kind.is_hard() {
        out.add(format!("{side}_is_sep"));
    }
    if kind == SeparatorKind::Field {
        out.add(format!("{side}_is_field_sep"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{ComponentSet, ComponentType};
    use crate::perceptron::AveragedPerceptron;
    use crate::phrases::{Gazetteers, PhraseTrie, Scope};
    use crate::tokenizer::tokenize;
    use crate::trie::Trie;

    fn parser() -> AddressParser {
        let mut gazetteers = Gazetteers::default();
        gazetteers
            .address_dictionary
            .insert(Scope::Language("en"), "street", DictionaryType::STREET_TYPE.bits());
        gazetteers
            .geodb
            .insert(Scope::Global, "new york", (GeoType::LOCALITY | GeoType::ADMIN1).bits());
        let mut phrase_types = PhraseTrie::new();
        let types = AddressParserTypes::new(ComponentSet::SUBURB, ComponentType::City);
        phrase_types.insert(Scope::Global, "new york", types.pack());
        let mut vocab = Trie::new();
        vocab.insert("fake", 3);
        AddressParser::new(AveragedPerceptron::new(), vocab, phrase_types, gazetteers)
    }

    fn features_at(text: &str, i: usize, prev: Label, prev2: Label) -> FeatureSet {
        let p = parser();
        let mut ctx = AddressParserContext::new();
        ctx.fill(&p, tokenize(text), "en", "us");
        let mut out = FeatureSet::new();
        p.features(&ctx, i, prev, prev2, &mut out);
        out
    }

    #[test]
    fn first_token_sees_start_history() {
        let f = features_at("123 Fake Street", 0, Label::Start, Label::Start);
        for name in [
            "bias",
            "word=DDD",
            "next_word=fake",
            "prev_label=start",
            "label_history=start|start",
            "prev_label_word=start|DDD",
            "first_token",
        ] {
            assert!(f.contains(name), "missing {name}");
        }
        assert!(!f.iter().any(|n| n.starts_with("prev_word=")));
        assert!(!f.contains("last_token"));
    }

    #[test]
    fn dictionary_and_vocab_features() {
        let f = features_at("123 Fake Street", 2, Label::Road, Label::HouseNumber);
        assert!(f.contains("adict_type=street_type"));
        assert!(f.contains("adict_pos=unit"));
        assert!(f.contains(&format!("adict_types={}", DictionaryType::STREET_TYPE.bits())));
        assert!(f.contains("label_history=house_number|road"));
        assert!(f.contains("last_token"));

        let f = features_at("123 Fake Street", 1, Label::HouseNumber, Label::Start);
        assert!(f.contains("vocab=3"));
        assert!(f.contains("prev_word=DDD"));
    }

    #[test]
    fn multi_token_phrase_features() {
        let begin = features_at("New York, NY", 0, Label::Start, Label::Start);
        assert!(begin.contains("geo_pos=begin"));
        assert!(begin.contains("geo_type=locality"));
        assert!(begin.contains("geo_type=admin1"));
        assert!(begin.contains("comp_type=suburb"));
        assert!(begin.contains("comp_type=city"));
        assert!(begin.contains("comp_most_common=city"));

        let end = features_at("New York, NY", 1, Label::City, Label::Start);
        assert!(end.contains("geo_pos=end"));
        assert!(end.contains("next_is_sep"));
        assert!(end.contains("next_is_field_sep"));
        assert!(!end.iter().any(|n| n.starts_with("adict_")));
    }

    #[test]
    fn separators_get_fixed_labels() {
        let p = parser();
        let mut ctx = AddressParserContext::new();
        ctx.fill(&p, tokenize("12-14 Main St., NY"), "en", "us");
        let fixed: Vec<Option<Label>> = (0..ctx.len()).map(|i| p.fixed_label(&ctx, i)).collect();
        assert_eq!(
            fixed,
            vec![
                None,
                Some(Label::Separator),
                None,
                None,
                None,
                Some(Label::Separator),
                Some(Label::FieldSeparator),
                None,
            ]
        );
    }

    #[test]
    fn deterministic_and_history_sensitive() {
        let a = features_at("123 Fake Street", 1, Label::HouseNumber, Label::Start);
        let b = features_at("123 Fake Street", 1, Label::HouseNumber, Label::Start);
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
        let c = features_at("123 Fake Street", 1, Label::Road, Label::Start);
        assert!(c.contains("prev_label=road"));
        assert!(!c.contains("prev_label=house_number"));
    }

    #[test]
    fn feature_names_are_distinct() {
        for i in 0..3 {
            let f = features_at("New York, NY", i, Label::City, Label::Start);
            let mut names: Vec<&str> = f.iter().collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), f.len(), "duplicate feature at {i}");
        }
    }
}
