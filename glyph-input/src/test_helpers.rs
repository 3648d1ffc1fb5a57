//! Building fonts for tests without going through binary tables

use write_fonts::types::Tag;

use crate::{
    cmap::ReverseCharacterMap,
    font::FontSnapshot,
    glyph_names::{GlyphName, NameMap},
    graph::{
        ChainContextSubst, ChainRule, FeatureRecord, Ligature, LigatureSubst, Lookup, LookupIndex,
        NestedLookup, SingleSubst, SubstitutionGraph,
    },
    metrics::{GlyphMetrics, GlyphWidth},
    resolve::ResolvedInput,
};

const DEFAULT_ADVANCE: u32 = 500;

/// `backtrack` is given in text order.
fn chain_rule(
    backtrack: &[&str],
    input: &[&str],
    lookahead: &[&str],
    lookup: LookupIndex,
) -> ChainRule {
    let mut backtrack = glyphs(backtrack);
    backtrack.reverse();
    ChainRule {
        backtrack,
        input: glyphs(input),
        lookahead: glyphs(lookahead),
        lookups: vec![NestedLookup {
            sequence_index: 0,
            lookup_index: lookup,
        }],
    }
}

pub(crate) fn glyphs(names: &[&str]) -> Vec<GlyphName> {
    names.iter().copied().map(GlyphName::from).collect()
}

pub(crate) fn input(features: &[&str], text: &str) -> ResolvedInput {
    ResolvedInput::new(
        features.iter().map(|tag| tag.parse::<Tag>().unwrap()).collect(),
        text,
    )
}

/// Builds a [`FontSnapshot`] one table at a time.
///
/// Lookups are numbered in the order they are added.
#[derive(Default)]
pub(crate) struct TestFont {
    glyphs: Vec<GlyphName>,
    cmap: Vec<(char, GlyphName)>,
    widths: Vec<(GlyphName, GlyphWidth)>,
    lookups: Vec<Lookup>,
    features: Vec<FeatureRecord>,
}

impl TestFont {
    /// Every glyph gets a default advance; `.notdef` is added in front.
    pub(crate) fn new(names: &[&str]) -> Self {
        let glyphs: Vec<_> = std::iter::once(GlyphName::NOTDEF)
            .chain(names.iter().copied().map(GlyphName::from))
            .collect();
        let widths = glyphs
            .iter()
            .map(|name| (name.clone(), GlyphWidth::new(DEFAULT_ADVANCE, None)))
            .collect();
        TestFont {
            glyphs,
            widths,
            ..Default::default()
        }
    }

    pub(crate) fn map(mut self, chr: char, glyph: &str) -> Self {
        self.cmap.push((chr, glyph.into()));
        self
    }

    pub(crate) fn width(mut self, glyph: &str, advance: u32, bbox: Option<u32>) -> Self {
        // later entries win when collected into the metrics map
        self.widths
            .push((glyph.into(), GlyphWidth::new(advance, bbox)));
        self
    }

    pub(crate) fn single_sub(mut self, mapping: &[(&str, &str)]) -> Self {
        let mapping = mapping
            .iter()
            .map(|(input, output)| (GlyphName::from(*input), GlyphName::from(*output)))
            .collect();
        self.lookups
            .push(Lookup::Single(vec![SingleSubst { mapping }]));
        self
    }

    pub(crate) fn ligature_sub(mut self, components: &[&str], ligature: &str) -> Self {
        let mut components = glyphs(components);
        let first = components.remove(0);
        let ligature = Ligature {
            components,
            glyph: ligature.into(),
        };
        self.lookups.push(Lookup::Ligature(vec![LigatureSubst {
            ligature_sets: vec![(first, vec![ligature])],
        }]));
        self
    }

    /// A chaining lookup with one rule applying `lookup` to its first input glyph.
    pub(crate) fn chain_sub(
        mut self,
        backtrack: &[&str],
        input: &[&str],
        lookahead: &[&str],
        lookup: LookupIndex,
    ) -> Self {
        let rule = chain_rule(backtrack, input, lookahead, lookup);
        self.lookups
            .push(Lookup::ChainContextual(vec![ChainContextSubst {
                rules: vec![rule],
            }]));
        self
    }

    /// Add another rule to the first subtable of chaining lookup `chain`.
    pub(crate) fn chain_rule(
        mut self,
        chain: LookupIndex,
        backtrack: &[&str],
        input: &[&str],
        lookahead: &[&str],
        lookup: LookupIndex,
    ) -> Self {
        let rule = chain_rule(backtrack, input, lookahead, lookup);
        match self.lookups.get_mut(chain as usize) {
            Some(Lookup::ChainContextual(subtables)) if !subtables.is_empty() => {
                subtables[0].rules.push(rule)
            }
            _ => panic!("lookup {chain} is not a chaining lookup"),
        }
        self
    }

    /// Make the rules of chaining lookup `chain` also apply `lookup`.
    pub(crate) fn also_apply(mut self, chain: LookupIndex, lookup: LookupIndex) -> Self {
        if let Some(Lookup::ChainContextual(subtables)) = self.lookups.get_mut(chain as usize) {
            for rule in subtables.iter_mut().flat_map(|sub| sub.rules.iter_mut()) {
                rule.lookups.push(NestedLookup {
                    sequence_index: 0,
                    lookup_index: lookup,
                });
            }
        }
        self
    }

    pub(crate) fn other(mut self) -> Self {
        self.lookups.push(Lookup::Other);
        self
    }

    pub(crate) fn feature(mut self, tag: &str, lookups: &[LookupIndex]) -> Self {
        self.features.push(FeatureRecord {
            tag: tag.parse().unwrap(),
            lookups: lookups.to_vec(),
        });
        self
    }

    pub(crate) fn build(self) -> FontSnapshot {
        let glyph_order: NameMap = self.glyphs.into_iter().collect();
        let cmap = ReverseCharacterMap::new(self.cmap);
        let metrics = GlyphMetrics::new(self.widths, cmap.space_glyph());
        let graph = SubstitutionGraph::new(self.lookups, self.features);
        FontSnapshot::new(glyph_order, cmap, metrics, graph)
    }
}
