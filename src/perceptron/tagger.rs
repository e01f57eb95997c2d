use crate::label::Label;

use super::{AveragedPerceptron, FeatureSet};

/// Feature extraction for greedy decoding.
pub trait FeatureFunction {
    type Context: ?Sized;

    fn num_positions(&self, ctx: &Self::Context) -> usize;

    /// A label assigned at `i` without scoring, e.g. for separators.
    fn fixed_label(&self, ctx: &Self::Context, i: usize) -> Option<Label>;

    /// Writes the features active at `i` given the two labels assigned
    /// before it. Must not depend on anything but its arguments.
    fn features(&self, ctx: &Self::Context, i: usize, prev: Label, prev2: Label, out: &mut FeatureSet);
}

/// Greedy left-to-right decoding: each position takes the best scoring
/// label among `candidates` given the labels already chosen, and is never
/// revisited. Both history slots start as [`Label::Start`]. Every position
/// gets exactly one label, so `candidates` must not be empty.
pub fn tag<F>(
    model: &AveragedPerceptron,
    function: &F,
    ctx: &F::Context,
    candidates: &[Label],
    features: &mut FeatureSet,
    labels: &mut Vec<Label>,
) where
    F: FeatureFunction + ?Sized,
{
    debug_assert!(!candidates.is_empty());
    labels.clear();
    let mut prev = Label::Start;
    let mut prev2 = Label::Start;
    for i in 0..function.num_positions(ctx) {
        let label = match function.fixed_label(ctx, i) {
            Some(label) => label,
            None => {
                features.clear();
                function.features(ctx, i, prev, prev2, features);
                model.predict(features, candidates).unwrap_or(Label::House)
            }
        };
        log::trace!("position {i}: {label}");
        labels.push(label);
        prev2 = prev;
        prev = label;
    }
}
