use std::{
    convert::TryFrom,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::label::Label;

/// One line of labeled data:
///
/// ```text
/// en\tus\t123/house_number Fake/road Street/road Brooklyn/city NY/state 12345/postcode
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledAddress {
    pub language: String,
    pub country: String,
    pub tokens: Vec<String>,
    pub labels: Vec<Label>,
}

impl LabeledAddress {
    pub fn push(&mut self, token: &str, label: Label) {
        self.tokens.push(token.to_string());
        self.labels.push(label);
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// `None` if a field is missing or a token has no known label.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(3, '\t');
        let (language, country, tagged) = (fields.next()?, fields.next()?, fields.next()?);
        let mut address = LabeledAddress {
            language: language.to_string(),
            country: country.to_string(),
            ..Default::default()
        };
        for tagged in tagged.split_whitespace() {
            // tokens may contain slashes themselves, e.g. "1/2"
            let (token, label) = tagged.rsplit_once('/')?;
            if token.is_empty() {
                return None;
            }
            address.push(token, Label::from_name(label)?);
        }
        (!address.is_empty()).then_some(address)
    }
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub v: Vec<LabeledAddress>,
}

impl Dataset {
    /// Appends the addresses read from `reader`. Blank lines are skipped,
    /// malformed ones logged and skipped.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<(), std::io::Error> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match LabeledAddress::parse_line(&line) {
                Some(address) => self.v.push(address),
                None => log::warn!("invalid line: {line}"),
            }
        }
        Ok(())
    }

    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        self.read(BufReader::new(File::open(path)?))
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledAddress> {
        self.v.iter()
    }

    pub fn max_length(&self) -> usize {
        self.v.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.v.iter().map(|x| x.len()).sum()
    }
}

impl TryFrom<File> for Dataset {
    type Error = std::io::Error;

    fn try_from(file: File) -> Result<Self, Self::Error> {
        let mut dataset = Dataset::default();
        dataset.read(BufReader::new(file))?;
        Ok(dataset)
    }
}
