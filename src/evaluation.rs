use std::{collections::BTreeMap, fmt::Display, iter::zip};

use crate::dataset::Dataset;
use crate::label::Label;
use crate::parser::{AddressParser, AddressParserContext};
use crate::tokenizer::TokenizedString;

/// Label-wise performance values.
#[derive(Debug, Default)]
struct LabelMeasure {
    /// Number of correct predictions.
    num_correct: usize,
    /** Number of occurrences of the label in the gold-standard data. */
    num_observation: usize,
    /** Number of predictions. */
    num_prediction: usize,
    precision: f64,
    recall: f64,
    fmeasure: f64,
}

/// Tagging accuracy against labeled addresses.
///
/// Structural labels are fixed by the token type rather than predicted, so
/// positions labeled `sep` or `fsep` in the reference are not counted.
#[derive(Debug, Default)]
pub struct Evaluation {
    tbl: BTreeMap<Label, LabelMeasure>,

    /** Number of correctly predicted items. */
    item_total_correct: usize,
    /** Total number of items. */
    item_total_num: usize,
    item_accuracy: f64,

    /** Number of correctly predicted instances. */
    inst_total_correct: usize,
    /** Total number of instances. */
    inst_total_num: usize,
    inst_accuracy: f64,

    macro_precision: f64,
    macro_recall: f64,
    macro_fmeasure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
    pub item_accuracy: f64,
    pub sequence_accuracy: f64,
}

impl Evaluation {
    pub fn accumulate(&mut self, reference: &[Label], prediction: &[Label]) {
        let mut all_matched = reference.len() == prediction.len();
        for (&r, &p) in zip(reference, prediction) {
            if r.is_structural() {
                continue;
            }
            self.tbl.entry(r).or_default().num_observation += 1;
            self.tbl.entry(p).or_default().num_prediction += 1;
            if r == p {
                self.tbl.entry(r).or_default().num_correct += 1;
                self.item_total_correct += 1;
            } else {
                all_matched = false;
            }
            self.item_total_num += 1;
        }

        if all_matched {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
    }

    /// Computes the scores from everything accumulated so far. Macro
    /// averages run over the labels seen in the reference.
    pub fn evaluate(&mut self) -> Estimation {
        let mut num_labels = 0;
        self.macro_precision = 0.0;
        self.macro_recall = 0.0;
        self.macro_fmeasure = 0.0;

        for lev in self.tbl.values_mut() {
            lev.precision = 0.0;
            lev.recall = 0.0;
            lev.fmeasure = 0.0;
            if lev.num_prediction > 0 {
                lev.precision = lev.num_correct as f64 / lev.num_prediction as f64;
            }
            if lev.num_observation == 0 {
                continue;
            }
            num_labels += 1;
            lev.recall = lev.num_correct as f64 / lev.num_observation as f64;
            if lev.precision + lev.recall > 0.0 {
                lev.fmeasure = lev.precision * lev.recall * 2.0 / (lev.precision + lev.recall);
            }
            self.macro_precision += lev.precision;
            self.macro_recall += lev.recall;
            self.macro_fmeasure += lev.fmeasure;
        }

        if num_labels > 0 {
            self.macro_precision /= num_labels as f64;
            self.macro_recall /= num_labels as f64;
            self.macro_fmeasure /= num_labels as f64;
        }
        if self.item_total_num > 0 {
            self.item_accuracy = self.item_total_correct as f64 / self.item_total_num as f64;
        }
        if self.inst_total_num > 0 {
            self.inst_accuracy = self.inst_total_correct as f64 / self.inst_total_num as f64;
        }
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
            item_accuracy: self.item_accuracy,
            sequence_accuracy: self.inst_accuracy,
        }
    }
}

/// Tags every address of `dataset` with `parser` and scores the labels.
pub fn evaluate_parser(parser: &AddressParser, dataset: &Dataset) -> Evaluation {
    let mut ctx = AddressParserContext::new();
    let mut evaluation = Evaluation::default();
    for address in dataset.iter() {
        let tokenized = TokenizedString::from_tokens(&address.tokens);
        ctx.fill(parser, tokenized, &address.language, &address.country);
        let predicted = parser.tag(&mut ctx);
        evaluation.accumulate(&address.labels, &predicted);
    }
    evaluation.evaluate();
    evaluation
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(f, "\t{}: ({}, {}, {}) (******, ******, ******)", label, lev.num_correct, lev.num_prediction, lev.num_observation)?;
            } else {
                writeln!(f, "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})", label, lev.num_correct, lev.num_prediction, lev.num_observation,
                    lev.precision, lev.recall, lev.fmeasure
                )?;
            }
        }
        writeln!(f, "Macro-average precision, recall, F1: ({:.4}, {:.4}, {:.4})", self.macro_precision, self.macro_recall, self.macro_fmeasure)?;
        writeln!(f, "Item accuracy: {}/{} => {:.4}", self.item_total_correct, self.item_total_num, self.item_accuracy)?;
        writeln!(f, "Sequence accuracy: {}/{} => {:.4}", self.inst_total_correct, self.inst_total_num, self.inst_accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::*;

    #[test]
    fn per_label_and_totals() {
        let mut ev = Evaluation::default();
        ev.accumulate(&[HouseNumber, Road, Road], &[HouseNumber, Road, City]);
        ev.accumulate(&[City, FieldSeparator, State], &[City, FieldSeparator, State]);
        let est = ev.evaluate();

        assert_eq!(est.item_accuracy, 4.0 / 5.0);
        assert_eq!(est.sequence_accuracy, 0.5);
        let road = &ev.tbl[&Road];
        assert_eq!((road.num_correct, road.num_prediction, road.num_observation), (1, 1, 2));
        assert_eq!(road.recall, 0.5);
        let city = &ev.tbl[&City];
        assert_eq!(city.precision, 0.5);
        assert!(!ev.tbl.contains_key(&FieldSeparator));

        // re-evaluating does not double count
        assert_eq!(ev.evaluate(), est);
        assert!(ev.to_string().contains("Sequence accuracy: 1/2"));
    }
}
