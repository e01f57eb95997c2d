use serde::Serialize;

use crate::label::Label;
use crate::tokenizer::TokenizedString;

use super::context::SeparatorKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedComponent {
    pub label: Label,
    #[serde(rename = "value")]
    pub text: String,
}

/// Labeled components in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParseResponse {
    components: Vec<ParsedComponent>,
}

impl ParseResponse {
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[ParsedComponent] {
        &self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParsedComponent> {
        self.components.iter()
    }

    /// Text of the first component with `label`.
    pub fn get(&self, label: Label) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.text.as_str())
    }

    /// `(text, label name)` pairs.
    pub fn pairs(&self) -> Vec<(&str, &'static str)> {
        self.components
            .iter()
            .map(|c| (c.text.as_str(), c.label.name()))
            .collect()
    }

    /// Merges runs of tokens with the same component label.
    ///
    /// A run's text is the original text from its first to its last token,
    /// so whatever separated the tokens is kept verbatim. Field separators
    /// always end a run. Intra-field separators and ignorable tokens join
    /// two tokens of the same label and are dropped otherwise. Structural
    /// labels are never emitted.
    pub fn from_labels(tokenized: &TokenizedString, separators: &[SeparatorKind], labels: &[Label]) -> Self {
        let tokens = tokenized.tokens();
        let mut components = Vec::new();
        // label, first token, last token
        let mut run: Option<(Label, usize, usize)> = None;

        let mut flush = |run: &mut Option<(Label, usize, usize)>| {
            if let Some((label, first, last)) = run.take() {
                let text = &tokenized.text()[tokens[first].offset..tokens[last].end()];
                components.push(ParsedComponent { label, text: text.to_string() });
            }
        };

        for (i, &label) in labels.iter().enumerate() {
            if label == Label::FieldSeparator || separators.get(i) == Some(&SeparatorKind::Field) {
                flush(&mut run);
                continue;
            }
            if label.is_structural() {
                continue;
            }
            if let Some((current, _, last)) = &mut run {
                if *current == label {
                    *last = i;
                    continue;
                }
            }
            flush(&mut run);
            run = Some((label, i, i));
        }
        flush(&mut run);
        Self { components }
    }
}

impl<'a> IntoIterator for &'a ParseResponse {
    type Item = &'a ParsedComponent;
    type IntoIter = std::slice::Iter<'a, ParsedComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
