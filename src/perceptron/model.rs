use std::io::{self, Cursor};

use cqdb::{CQDBWriter, CQDB};

use crate::error::{Error, Result};
use crate::format::{ByteReader, SectionTag, TAG_FEATURES, TAG_LABELS, TAG_WEIGHTS};
use crate::label::{Label, NUM_CLASSES};
use crate::quark::{Quark, StringTable, TextVectorizer};

use super::FeatureSet;

/// Averaged weights, one row of [`NUM_CLASSES`] columns per feature name.
///
/// Read only during parsing. The setters exist so an exported model or a
/// test fixture can be assembled in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AveragedPerceptron {
    features: Quark,
    /// Row-major, `features.len() * NUM_CLASSES`.
    weights: Vec<f64>,
}

impl AveragedPerceptron {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn features(&self) -> &Quark {
        &self.features
    }

    fn row(&self, fid: usize) -> &[f64] {
        &self.weights[fid * NUM_CLASSES..(fid + 1) * NUM_CLASSES]
    }

    /// Sets the weight of `feature` for `label`. `Label::Start` has no column
    /// and is ignored.
    pub fn set_weight(&mut self, feature: &str, label: Label, weight: f64) {
        let Some(col) = label.index() else {
            return;
        };
        let fid = self.features.find_or_insert(feature);
        let needed = (fid + 1) * NUM_CLASSES;
        if self.weights.len() < needed {
            self.weights.resize(needed, 0.0);
        }
        self.weights[fid * NUM_CLASSES + col] = weight;
    }

    pub fn weight(&self, feature: &str, label: Label) -> f64 {
        match (self.features.to_id(feature), label.index()) {
            (Some(fid), Some(col)) => self.row(fid)[col],
            _ => 0.0,
        }
    }

    /// Per-class sums over the active features. Unknown names add nothing.
    pub fn scores(&self, features: &FeatureSet) -> [f64; NUM_CLASSES] {
        let mut scores = [0.0; NUM_CLASSES];
        for fid in features.iter().filter_map(|f| self.features.to_id(f)) {
            for (s, w) in scores.iter_mut().zip(self.row(fid)) {
                *s += w;
            }
        }
        scores
    }

    /// Highest scoring candidate. A candidate must beat the current best
    /// strictly, so ties go to the one listed first.
    pub fn predict(&self, features: &FeatureSet, candidates: &[Label]) -> Option<Label> {
        let scores = self.scores(features);
        let mut best: Option<(Label, f64)> = None;
        for &label in candidates {
            let Some(col) = label.index() else {
                continue;
            };
            match best {
                Some((_, s)) if scores[col] <= s => {}
                _ => best = Some((label, scores[col])),
            }
        }
        best.map(|(label, _)| label)
    }

    pub(crate) fn to_sections(&self) -> io::Result<Vec<(SectionTag, Vec<u8>)>> {
        let labels = write_cqdb(Label::CLASSES.iter().map(|l| l.name()))?;
        let features = write_cqdb(self.features.iter())?;

        let mut weights = Vec::with_capacity(8 + self.weights.len() * 8);
        weights.extend_from_slice(&(self.num_features() as u32).to_le_bytes());
        weights.extend_from_slice(&(NUM_CLASSES as u32).to_le_bytes());
        for w in &self.weights {
            weights.extend_from_slice(&w.to_le_bytes());
        }
        Ok(vec![(TAG_LABELS, labels), (TAG_FEATURES, features), (TAG_WEIGHTS, weights)])
    }

    pub(crate) fn from_sections(labels: &[u8], features: &[u8], weights: &[u8]) -> Result<Self> {
        check_label_table(labels)?;

        let mut rdr = ByteReader::new(weights, "weights");
        let n_features = rdr.read_u32()? as usize;
        let n_labels = rdr.read_u32()? as usize;
        if n_labels != NUM_CLASSES {
            return Err(Error::invalid_model(format!(
                "weights have {n_labels} label columns, expected {NUM_CLASSES}"
            )));
        }
        let n_weights = n_features
            .checked_mul(NUM_CLASSES)
            .filter(|&n| n <= rdr.remaining() / 8)
            .ok_or_else(|| Error::invalid_model("truncated weights"))?;
        let mut ws = Vec::with_capacity(n_weights);
        for _ in 0..n_weights {
            let w = rdr.read_f64()?;
            if !w.is_finite() {
                return Err(Error::invalid_model("non-finite weight"));
            }
            ws.push(w);
        }
        rdr.finish()?;

        let features = read_feature_table(features, n_features)?;
        Ok(Self { features, weights: ws })
    }
}

fn write_cqdb<'a>(keys: impl Iterator<Item = &'a str>) -> io::Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        // the database is finalized when the writer is dropped
        let mut writer = CQDBWriter::new(&mut cursor)?;
        for (id, key) in keys.enumerate() {
            writer.put(key, id as u32)?;
        }
    }
    Ok(cursor.into_inner())
}

/// The stored label table must be exactly the label enumeration, since
/// weight columns are addressed by enumeration index.
fn check_label_table(buf: &[u8]) -> Result<()> {
    let db = CQDB::new(buf).map_err(|e| Error::invalid_model(format!("bad label table: {e}")))?;
    let mut seen = [false; NUM_CLASSES];
    for entry in db.iter() {
        let (id, name) = entry.map_err(|e| Error::invalid_model(format!("bad label table: {e}")))?;
        let expected = Label::CLASSES.get(id as usize).map(|l| l.name());
        if expected.map_or(true, |e| name != e) || seen[id as usize] {
            return Err(Error::invalid_model(format!("unexpected label {name:?} with id {id}")));
        }
        seen[id as usize] = true;
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(Error::invalid_model(format!(
            "label table is missing {}",
            Label::CLASSES[missing]
        )));
    }
    Ok(())
}

fn read_feature_table(buf: &[u8], n_features: usize) -> Result<Quark> {
    let db = CQDB::new(buf).map_err(|e| Error::invalid_model(format!("bad feature table: {e}")))?;
    let mut names: Vec<Option<String>> = vec![None; n_features];
    for entry in db.iter() {
        let (id, name) =
            entry.map_err(|e| Error::invalid_model(format!("bad feature table: {e}")))?;
        match names.get_mut(id as usize) {
            Some(slot) if slot.is_none() => *slot = Some(name.to_string()),
            _ => return Err(Error::invalid_model(format!("bad feature id {id} for {name:?}"))),
        }
    }
    let names = names
        .into_iter()
        .enumerate()
        .map(|(id, name)| {
            name.ok_or_else(|| Error::invalid_model(format!("feature {id} has no name")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Quark::from(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> AveragedPerceptron {
        let mut m = AveragedPerceptron::new();
        m.set_weight("word=DDD", Label::HouseNumber, 2.0);
        m.set_weight("word=DDD", Label::Postcode, 0.5);
        m.set_weight("bias", Label::Road, 0.25);
        m.set_weight("bias", Label::City, 0.25);
        m
    }

    fn features(names: &[&str]) -> FeatureSet {
        let mut f = FeatureSet::new();
        for n in names {
            f.add(*n);
        }
        f
    }

    #[test]
    fn scores_sum_active_rows() {
        let m = model();
        let scores = m.scores(&features(&["word=DDD", "bias", "unknown"]));
        assert_eq!(scores[Label::HouseNumber as usize], 2.0);
        assert_eq!(scores[Label::Postcode as usize], 0.5);
        assert_eq!(scores[Label::Road as usize], 0.25);
        assert_eq!(scores[Label::House as usize], 0.0);
        assert_eq!(m.weight("bias", Label::City), 0.25);
        assert_eq!(m.weight("bias", Label::Start), 0.0);
    }

    #[test]
    fn ties_go_to_earlier_label() {
        let m = model();
        let f = features(&["bias"]);
        assert_eq!(m.predict(&f, &Label::COMPONENTS), Some(Label::Road));
        assert_eq!(m.predict(&f, &[Label::City, Label::Road]), Some(Label::City));
        // nothing fires: all zero, first candidate wins
        assert_eq!(m.predict(&FeatureSet::new(), &Label::COMPONENTS), Some(Label::House));
        assert_eq!(m.predict(&f, &[]), None);
    }

    #[test]
    fn sections_round_trip() {
        let m = model();
        let sections = m.to_sections().unwrap();
        let loaded =
            AveragedPerceptron::from_sections(&sections[0].1, &sections[1].1, &sections[2].1)
                .unwrap();
        assert_eq!(loaded.num_features(), 2);
        assert_eq!(loaded.weight("word=DDD", Label::Postcode), 0.5);
        assert_eq!(loaded.weight("bias", Label::Road), 0.25);
    }

    #[test]
    fn rejects_inconsistent_sections() {
        let m = model();
        let sections = m.to_sections().unwrap();
        let (labels, feats, weights) = (&sections[0].1, &sections[1].1, &sections[2].1);

        assert!(AveragedPerceptron::from_sections(labels, feats, &weights[..weights.len() - 8]).is_err());

        let mut wrong_count = weights.clone();
        wrong_count[0..4].copy_from_slice(&3u32.to_le_bytes());
        assert!(AveragedPerceptron::from_sections(labels, feats, &wrong_count).is_err());

        let other_labels = write_cqdb(["house", "road"].into_iter()).unwrap();
        assert!(AveragedPerceptron::from_sections(&other_labels, feats, weights).is_err());

        // right names, wrong order
        let swapped = write_cqdb(Label::CLASSES.iter().rev().map(|l| l.name())).unwrap();
        assert!(AveragedPerceptron::from_sections(&swapped, feats, weights).is_err());

        let mut nan = weights.clone();
        nan[8..16].copy_from_slice(&f64::NAN.to_le_bytes());
        assert!(AveragedPerceptron::from_sections(labels, feats, &nan).is_err());
    }
}
