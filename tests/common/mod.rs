#![allow(dead_code)]

use address_parser::{
    AddressParser, AveragedPerceptron, DictionaryType, Gazetteers, GeoType, Label, PhraseTrie, Scope, Trie,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Weights for a small model that knows US style addresses: house numbers
/// are three digits, postcodes five, street types and places come from the
/// dictionaries.
pub fn model() -> AveragedPerceptron {
    let mut model = AveragedPerceptron::new();
    model.set_weight("word=DDD", Label::HouseNumber, 2.0);
    model.set_weight("word=DD", Label::HouseNumber, 2.0);
    model.set_weight("prev_label=house_number", Label::Road, 1.5);
    model.set_weight("adict_type=street_type", Label::Road, 3.0);
    model.set_weight("geo_type=locality", Label::City, 3.0);
    model.set_weight("geo_type=admin1", Label::State, 3.0);
    model.set_weight("word=DDDDD", Label::Postcode, 2.0);
    model.set_weight("last_token", Label::Postcode, 1.0);
    model
}

pub fn gazetteers(ny: GeoType) -> Gazetteers {
    let mut gazetteers = Gazetteers::default();
    gazetteers
        .address_dictionary
        .insert(Scope::Language("en"), "street", DictionaryType::STREET_TYPE.bits());
    gazetteers
        .address_dictionary
        .add_phrase(Scope::Language("en"), "St.", DictionaryType::STREET_TYPE.bits());
    gazetteers.geodb.insert(Scope::Global, "brooklyn", GeoType::LOCALITY.bits());
    gazetteers.geodb.insert(Scope::LanguageCountry("en", "us"), "ny", ny.bits());
    gazetteers
}

pub fn vocab() -> Trie {
    let mut vocab = Trie::new();
    for (i, word) in ["fake", "street", "brooklyn", "ny", "DDD", "DDDDD"].iter().enumerate() {
        vocab.insert(word, i as u32);
    }
    vocab
}

/// "NY" is a state.
pub fn parser() -> AddressParser {
    AddressParser::new(model(), vocab(), PhraseTrie::new(), gazetteers(GeoType::ADMIN1))
}

/// "NY" is wrongly known only as a city.
pub fn parser_with_ny_as_city() -> AddressParser {
    AddressParser::new(model(), vocab(), PhraseTrie::new(), gazetteers(GeoType::LOCALITY))
}
