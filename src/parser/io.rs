//! Model directory layout:
//!
//! * `address_parser.dat`: labels, feature names, weights, vocabulary and
//!   component phrases. Required.
//! * `address_dictionary.dat`, `geodb.dat`: gazetteers, one phrase trie
//!   each. Optional, a missing file loads as an empty dictionary.
//!
//! Loading is all or nothing: a damaged section anywhere fails the whole
//! load and nothing partially built escapes.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{read_container, write_container, TAG_FEATURES, TAG_LABELS, TAG_PHRASES, TAG_VOCAB, TAG_WEIGHTS};
use crate::perceptron::AveragedPerceptron;
use crate::phrases::{Gazetteers, PhraseTrie};
use crate::trie::Trie;

use super::AddressParser;

pub const MODEL_FILENAME: &str = "address_parser.dat";
pub const ADDRESS_DICTIONARY_FILENAME: &str = "address_dictionary.dat";
pub const GEODB_FILENAME: &str = "geodb.dat";

const MODEL_MAGIC: &[u8; 4] = b"lAPR";
const GAZETTEER_MAGIC: &[u8; 4] = b"lGAZ";

const MODEL_SECTIONS: [[u8; 4]; 5] = [TAG_LABELS, TAG_FEATURES, TAG_WEIGHTS, TAG_VOCAB, TAG_PHRASES];

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::invalid_model(format!("cannot read {}: {e}", path.display())))
}

impl AddressParser {
    /// Loads a model directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingDirectory(dir.to_path_buf()));
        }
        let parser = Self::from_memory(&read_file(&dir.join(MODEL_FILENAME))?)?;
        let gazetteers = Gazetteers {
            address_dictionary: load_gazetteer(&dir.join(ADDRESS_DICTIONARY_FILENAME))?,
            geodb: load_gazetteer(&dir.join(GEODB_FILENAME))?,
        };
        log::info!(
            "loaded address parser from {}: {} features, {} vocab entries, {} component phrases, {} dictionary phrases, {} geodb phrases",
            dir.display(),
            parser.model.num_features(),
            parser.vocab.len(),
            parser.phrase_types.len(),
            gazetteers.address_dictionary.len(),
            gazetteers.geodb.len()
        );
        Ok(parser.with_gazetteers(gazetteers))
    }

    /// Reads the contents of a model file. Gazetteers are left empty.
    pub fn from_memory(buf: &[u8]) -> Result<Self> {
        let sections = read_container(MODEL_MAGIC, buf, &MODEL_SECTIONS)?;
        let model = AveragedPerceptron::from_sections(sections[0], sections[1], sections[2])?;
        let vocab = Trie::load(sections[3])?;
        let phrase_types = PhraseTrie::load(sections[4])?;
        Ok(Self::new(model, vocab, phrase_types, Gazetteers::default()))
    }

    /// Bytes of the model file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut sections = self.model.to_sections()?;
        sections.push((TAG_VOCAB, self.vocab.save()));
        sections.push((TAG_PHRASES, self.phrase_types.save()));
        Ok(write_container(MODEL_MAGIC, &sections))
    }

    /// Writes the model and both gazetteers into `dir`, creating it if
    /// needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let model = self.to_bytes()?;
        fs::write(dir.join(MODEL_FILENAME), &model)?;
        fs::write(
            dir.join(ADDRESS_DICTIONARY_FILENAME),
            gazetteer_bytes(&self.gazetteers.address_dictionary),
        )?;
        fs::write(dir.join(GEODB_FILENAME), gazetteer_bytes(&self.gazetteers.geodb))?;
        log::info!("saved address parser to {} ({} bytes)", dir.display(), model.len());
        Ok(())
    }
}

fn gazetteer_bytes(trie: &PhraseTrie) -> Vec<u8> {
    write_container(GAZETTEER_MAGIC, &[(TAG_PHRASES, trie.save())])
}

fn load_gazetteer(path: &Path) -> Result<PhraseTrie> {
    let buf = match fs::read(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::warn!("no gazetteer at {}, using an empty one", path.display());
            return Ok(PhraseTrie::new());
        }
        Err(e) => return Err(e.into()),
    };
    let sections = read_container(GAZETTEER_MAGIC, &buf, &[TAG_PHRASES])?;
    PhraseTrie::load(sections[0])
        .map_err(|e| Error::invalid_model(format!("{}: {e}", path.display())))
}
