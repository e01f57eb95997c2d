//! Averaged-perceptron scoring and greedy sequence decoding.

pub mod model;
pub mod tagger;

pub use model::AveragedPerceptron;
pub use tagger::{tag, FeatureFunction};

/// Active feature names for one decoding step, in the order they were added.
/// Names are not de-duplicated; a feature added twice counts twice.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    names: Vec<String>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_keeps_order() {
        let mut f = FeatureSet::new();
        f.add("bias");
        f.add(format!("word={}", "fake"));
        assert_eq!(f.iter().collect::<Vec<_>>(), ["bias", "word=fake"]);
        assert!(f.contains("word=fake"));
        f.clear();
        assert!(f.is_empty());
    }
}
