mod common;

use std::fs;
use std::path::Path;

use address_parser::parser::io::{ADDRESS_DICTIONARY_FILENAME, GEODB_FILENAME, MODEL_FILENAME};
use address_parser::{AddressParser, AddressParserContext, Error, Label, ParserModule, FORMAT_VERSION};

fn saved_model() -> tempfile::TempDir {
    common::init_logger();
    let dir = tempfile::tempdir().unwrap();
    common::parser().save(dir.path()).unwrap();
    dir
}

fn rewrite(path: &Path, f: impl FnOnce(&mut Vec<u8>)) {
    let mut buf = fs::read(path).unwrap();
    f(&mut buf);
    fs::write(path, buf).unwrap();
}

#[test]
fn test_save_and_load_model() {
    let dir = saved_model();
    let original = common::parser();
    let loaded = AddressParser::load(dir.path()).unwrap();

    assert_eq!(loaded.model(), original.model());
    assert_eq!(loaded.vocab(), original.vocab());
    assert_eq!(loaded.phrase_types(), original.phrase_types());
    assert_eq!(loaded.gazetteers(), original.gazetteers());
    assert_eq!(loaded.model().weight("adict_type=street_type", Label::Road), 3.0);

    let mut ctx = AddressParserContext::new();
    let text = "123 Fake Street Brooklyn NY 12345";
    assert_eq!(
        loaded.parse(text, "en", "us", &mut ctx),
        original.parse(text, "en", "us", &mut ctx)
    );
}

#[test]
fn test_setup_from_directory() {
    let dir = saved_model();
    let module = ParserModule::new();
    module.setup(dir.path()).unwrap();
    let response = module
        .parse("123 Fake Street Brooklyn NY 12345", "en", "us", &mut AddressParserContext::new())
        .unwrap();
    assert_eq!(response.get(Label::Postcode), Some("12345"));
}

#[test]
fn test_truncated_model_leaves_module_not_ready() {
    let dir = saved_model();
    rewrite(&dir.path().join(MODEL_FILENAME), |buf| buf.truncate(buf.len() / 2));

    let module = ParserModule::new();
    match module.setup(dir.path()) {
        Err(Error::InvalidModel(..)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!module.is_ready());
    match module.parse("123 Fake Street", "en", "us", &mut AddressParserContext::new()) {
        Err(Error::NotReady) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_failed_reload_drops_previous_model() {
    let dir = saved_model();
    let module = ParserModule::new();
    module.setup(dir.path()).unwrap();

    rewrite(&dir.path().join(MODEL_FILENAME), |buf| buf.truncate(10));
    assert!(module.setup(dir.path()).is_err());
    assert!(!module.is_ready());
}

#[test]
fn test_version_mismatch() {
    let dir = saved_model();
    rewrite(&dir.path().join(MODEL_FILENAME), |buf| {
        buf[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes())
    });
    match AddressParser::load(dir.path()) {
        Err(Error::VersionMismatch { expected, found }) => {
            assert_eq!(expected, FORMAT_VERSION);
            assert_eq!(found, FORMAT_VERSION + 1);
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_checksum_mismatch() {
    let dir = saved_model();
    rewrite(&dir.path().join(MODEL_FILENAME), |buf| {
        let last = buf.len() - 1;
        buf[last] ^= 0x5a;
    });
    match AddressParser::load(dir.path()) {
        Err(Error::InvalidModel(msg)) => assert!(msg.contains("checksum"), "{msg}"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    match AddressParser::load(&missing) {
        Err(Error::MissingDirectory(path)) => assert_eq!(path, missing),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_model_file() {
    let dir = tempfile::tempdir().unwrap();
    match AddressParser::load(dir.path()) {
        Err(Error::InvalidModel(..)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_corrupt_gazetteer_fails_load() {
    let dir = saved_model();
    rewrite(&dir.path().join(ADDRESS_DICTIONARY_FILENAME), |buf| {
        buf.truncate(buf.len() - 4)
    });
    assert!(matches!(AddressParser::load(dir.path()), Err(Error::InvalidModel(..))));
}

#[test]
fn test_missing_gazetteer_loads_empty() {
    let dir = saved_model();
    fs::remove_file(dir.path().join(GEODB_FILENAME)).unwrap();
    let parser = AddressParser::load(dir.path()).unwrap();
    assert!(parser.gazetteers().geodb.is_empty());
    assert!(!parser.gazetteers().address_dictionary.is_empty());

    // without the geodb nothing is known to be a city or a state
    let response = parser.parse("123 Fake Street Brooklyn NY 12345", "en", "us", &mut AddressParserContext::new());
    assert_eq!(response.get(Label::State), None);
    assert_eq!(response.get(Label::City), None);
}
