//! Searching for the input that produces a glyph
//!
//! A glyph can be reached directly through the character map, or as the
//! output of a single or ligature substitution. A substitution only fires if
//! its lookup is active, which happens either because a feature turns it on
//! or because a chaining contextual rule (itself active) applies it. We walk
//! all of these paths depth first and keep the smallest answer.
//!
//! Cycles in the rule graph (a -> b, b -> a) are cut by tracking the glyphs
//! currently being resolved on the active path. The set is per path, not
//! global: a glyph abandoned on one branch can still be used on another.
//!
//! Chaining lookups are tracked the same way, but only while we walk from a
//! lookup to the chains that apply it. Once a feature switches a chain on,
//! each context glyph is its own search, and may well be produced by that
//! same chain.

use std::collections::HashSet;

use write_fonts::types::Tag;

use crate::{
    cmap::ReverseCharacterMap,
    glyph_names::GlyphName,
    graph::{LookupIndex, SubstitutionGraph},
    metrics::GlyphMetrics,
};

/// Text and features that, when shaped, produce some glyph.
///
/// Ordering compares the features element-wise first and then the text;
/// it only exists to pick one answer deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedInput {
    pub features: Vec<Tag>,
    pub text: String,
}

/// The glyphs (and chaining lookups) being resolved on the current search path.
#[derive(Clone, Debug, Default)]
pub struct InProgress {
    glyphs: HashSet<GlyphName>,
    // chains entered since the last sequence of glyphs started resolving
    chains: HashSet<LookupIndex>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Step {
    Glyph(GlyphName),
    // a chaining lookup whose context we are currently resolving
    Chain(LookupIndex),
}

/// Removes its step from the in-progress set when dropped.
struct Visit<'a> {
    set: &'a mut InProgress,
    step: Step,
}

/// Finds input for glyphs in one font.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    cmap: &'a ReverseCharacterMap,
    graph: &'a SubstitutionGraph,
    metrics: &'a GlyphMetrics,
}

impl ResolvedInput {
    pub fn new(features: Vec<Tag>, text: impl Into<String>) -> Self {
        ResolvedInput {
            features,
            text: text.into(),
        }
    }
}

impl InProgress {
    pub fn contains(&self, glyph: &GlyphName) -> bool {
        self.glyphs.contains(glyph)
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty() && self.chains.is_empty()
    }

    /// Mark `glyph` as in progress until the returned guard is dropped.
    ///
    /// Returns `None` if the glyph is already in progress.
    fn enter(&mut self, glyph: &GlyphName) -> Option<Visit<'_>> {
        self.enter_step(Step::Glyph(glyph.clone()))
    }

    fn enter_chain(&mut self, lookup: LookupIndex) -> Option<Visit<'_>> {
        self.enter_step(Step::Chain(lookup))
    }

    fn enter_step(&mut self, step: Step) -> Option<Visit<'_>> {
        let inserted = match &step {
            Step::Glyph(glyph) => self.glyphs.insert(glyph.clone()),
            Step::Chain(lookup) => self.chains.insert(*lookup),
        };
        if !inserted {
            return None;
        }
        Some(Visit { set: self, step })
    }
}

impl Visit<'_> {
    fn in_progress(&mut self) -> &mut InProgress {
        self.set
    }
}

impl Drop for Visit<'_> {
    fn drop(&mut self) {
        match &self.step {
            Step::Glyph(glyph) => self.set.glyphs.remove(glyph),
            Step::Chain(lookup) => self.set.chains.remove(lookup),
        };
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        cmap: &'a ReverseCharacterMap,
        graph: &'a SubstitutionGraph,
        metrics: &'a GlyphMetrics,
    ) -> Self {
        Resolver {
            cmap,
            graph,
            metrics,
        }
    }

    /// Find input for `glyph`, starting with no active features.
    ///
    /// If `pad` is set, the text is prefixed with enough spaces to cover the
    /// glyph's visible width, so that zero-width glyphs have something to sit
    /// on when rendered.
    pub fn input_for(&self, glyph: &GlyphName, pad: bool) -> Option<ResolvedInput> {
        let mut in_progress = InProgress::default();
        let mut input = self.resolve(glyph, &[], &mut in_progress)?;
        debug_assert!(in_progress.is_empty());
        if pad {
            let padding = self.metrics.padding_for(glyph);
            if padding > 0 {
                input.text.insert_str(0, &" ".repeat(padding));
            }
        }
        Some(input)
    }

    /// Find the smallest input that produces `target`, given that `features`
    /// are already active.
    ///
    /// Returns `None` if the glyph is unreachable, or if it is already being
    /// resolved further up this path.
    pub fn resolve(
        &self,
        target: &GlyphName,
        features: &[Tag],
        in_progress: &mut InProgress,
    ) -> Option<ResolvedInput> {
        let mut visit = in_progress.enter(target)?;

        let direct = self
            .cmap
            .get(target)
            .map(|chr| ResolvedInput::new(features.to_vec(), chr));

        let mut best = direct;
        for producer in self.graph.producers_of(target) {
            let candidate = self.resolve_with_context(
                &producer.input,
                producer.lookup,
                features,
                visit.in_progress(),
            );
            best = min_candidate(best, candidate);
        }
        best
    }

    /// Find the smallest input that makes `lookup` fire on `glyphs`.
    pub fn resolve_with_context(
        &self,
        glyphs: &[GlyphName],
        lookup: LookupIndex,
        features: &[Tag],
        in_progress: &mut InProgress,
    ) -> Option<ResolvedInput> {
        let mut best = None;

        for tag in self.graph.features_activating(lookup) {
            let mut with_tag = features.to_vec();
            with_tag.push(tag);
            let candidate = self.resolve_sequence(glyphs, with_tag, in_progress);
            best = min_candidate(best, candidate);
        }

        for (chain_lookup, rule) in self.graph.chain_rules_invoking(lookup) {
            if !rule.input_is_within(glyphs) {
                continue;
            }
            // a chaining lookup that leads back to itself can't help
            let Some(mut visit) = in_progress.enter_chain(chain_lookup) else {
                continue;
            };
            let extended = rule.with_context(glyphs);
            let candidate = self.resolve_with_context(
                &extended,
                chain_lookup,
                features,
                visit.in_progress(),
            );
            best = min_candidate(best, candidate);
        }

        best
    }

    /// Resolve each glyph in turn, concatenating the text.
    ///
    /// Features found for one glyph stay active for the glyphs after it.
    pub fn resolve_sequence(
        &self,
        glyphs: &[GlyphName],
        features: Vec<Tag>,
        in_progress: &mut InProgress,
    ) -> Option<ResolvedInput> {
        let outer_chains = std::mem::take(&mut in_progress.chains);
        let result = self.resolve_each(glyphs, features, in_progress);
        in_progress.chains = outer_chains;
        result
    }

    fn resolve_each(
        &self,
        glyphs: &[GlyphName],
        features: Vec<Tag>,
        in_progress: &mut InProgress,
    ) -> Option<ResolvedInput> {
        let mut result = ResolvedInput {
            features,
            text: String::new(),
        };
        for glyph in glyphs {
            let next = self.resolve(glyph, &result.features, in_progress)?;
            result.features = next.features;
            result.text.push_str(&next.text);
        }
        Some(result)
    }
}

fn min_candidate(
    best: Option<ResolvedInput>,
    candidate: Option<ResolvedInput>,
) -> Option<ResolvedInput> {
    match (best, candidate) {
        (Some(best), Some(candidate)) => Some(best.min(candidate)),
        (best, candidate) => best.or(candidate),
    }
}
