//! A typed snapshot of a font's substitution rules
//!
//! This holds just the parts of GSUB that the input search walks: single and
//! ligature substitutions (which produce glyphs), chaining contextual rules
//! (which activate other lookups) and the feature records (which activate
//! lookups directly). Everything is keyed by glyph name.

use std::collections::HashMap;

use write_fonts::types::Tag;

use crate::glyph_names::GlyphName;

/// The index of a lookup in the GSUB lookup list.
pub type LookupIndex = u16;

/// One GSUB lookup, with its subtables.
///
/// Lookup types that can't help us reach a glyph are kept as [`Lookup::Other`]
/// so that the indices of the remaining lookups match the font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Single(Vec<SingleSubst>),
    Ligature(Vec<LigatureSubst>),
    ChainContextual(Vec<ChainContextSubst>),
    Other,
}

/// A single substitution subtable: input glyph -> output glyph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleSubst {
    pub mapping: Vec<(GlyphName, GlyphName)>,
}

/// A ligature substitution subtable, keyed on the first component.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LigatureSubst {
    pub ligature_sets: Vec<(GlyphName, Vec<Ligature>)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ligature {
    /// The components after the first one.
    pub components: Vec<GlyphName>,
    pub glyph: GlyphName,
}

/// A chaining contextual subtable, flattened into its rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainContextSubst {
    pub rules: Vec<ChainRule>,
}

/// One chaining contextual rule.
///
/// Each position holds a single representative glyph: the lowest gid that
/// matches that position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainRule {
    /// The backtrack glyphs as stored in the font: closest to the input first.
    pub backtrack: Vec<GlyphName>,
    pub input: Vec<GlyphName>,
    pub lookahead: Vec<GlyphName>,
    pub lookups: Vec<NestedLookup>,
}

/// A lookup applied by a contextual rule at a position in its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NestedLookup {
    pub sequence_index: u16,
    pub lookup_index: LookupIndex,
}

/// A feature tag and the lookups it turns on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRecord {
    pub tag: Tag,
    pub lookups: Vec<LookupIndex>,
}

/// A glyph sequence that some lookup rewrites into a particular glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Producer {
    pub lookup: LookupIndex,
    pub input: Vec<GlyphName>,
}

/// The substitution rules of a font.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionGraph {
    lookups: Vec<Lookup>,
    features: Vec<FeatureRecord>,
    // output glyph -> every (lookup, input sequence) that produces it
    producers: HashMap<GlyphName, Vec<Producer>>,
}

impl ChainRule {
    pub fn invokes(&self, lookup: LookupIndex) -> bool {
        self.lookups.iter().any(|rec| rec.lookup_index == lookup)
    }

    /// The backtrack glyphs in the order they appear in text.
    pub fn backtrack_in_text_order(&self) -> impl Iterator<Item = &GlyphName> + '_ {
        self.backtrack.iter().rev()
    }

    /// Whether this rule's input occurs as a contiguous run in `glyphs`.
    pub fn input_is_within(&self, glyphs: &[GlyphName]) -> bool {
        self.input.is_empty()
            || glyphs
                .windows(self.input.len())
                .any(|window| window == self.input.as_slice())
    }

    /// Surround `glyphs` with this rule's backtrack and lookahead context.
    pub fn with_context(&self, glyphs: &[GlyphName]) -> Vec<GlyphName> {
        self.backtrack_in_text_order()
            .chain(glyphs)
            .chain(&self.lookahead)
            .cloned()
            .collect()
    }
}

impl SubstitutionGraph {
    pub fn new(lookups: Vec<Lookup>, features: Vec<FeatureRecord>) -> Self {
        let mut producers: HashMap<GlyphName, Vec<Producer>> = HashMap::new();
        for (idx, lookup) in lookups.iter().enumerate() {
            let Ok(idx) = LookupIndex::try_from(idx) else {
                log::warn!("ignoring lookup {idx}, past the end of the addressable range");
                break;
            };
            match lookup {
                Lookup::Single(subtables) => {
                    for (input, output) in subtables.iter().flat_map(|sub| sub.mapping.iter()) {
                        producers.entry(output.clone()).or_default().push(Producer {
                            lookup: idx,
                            input: vec![input.clone()],
                        });
                    }
                }
                Lookup::Ligature(subtables) => {
                    for (first, ligature) in subtables
                        .iter()
                        .flat_map(|sub| sub.ligature_sets.iter())
                        .flat_map(|(first, ligs)| ligs.iter().map(move |lig| (first, lig)))
                    {
                        let input = std::iter::once(first)
                            .chain(&ligature.components)
                            .cloned()
                            .collect();
                        producers
                            .entry(ligature.glyph.clone())
                            .or_default()
                            .push(Producer { lookup: idx, input });
                    }
                }
                Lookup::ChainContextual(_) | Lookup::Other => (),
            }
        }
        SubstitutionGraph {
            lookups,
            features,
            producers,
        }
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Every single or ligature substitution whose output is `glyph`.
    pub fn producers_of(&self, glyph: &GlyphName) -> &[Producer] {
        self.producers
            .get(glyph)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The tags of all features that turn on `lookup`, in font order.
    pub fn features_activating(&self, lookup: LookupIndex) -> impl Iterator<Item = Tag> + '_ {
        self.features
            .iter()
            .filter(move |rec| rec.lookups.contains(&lookup))
            .map(|rec| rec.tag)
    }

    /// Every chaining rule that applies `lookup`, with the index of the
    /// chaining lookup it belongs to.
    pub fn chain_rules_invoking(
        &self,
        lookup: LookupIndex,
    ) -> impl Iterator<Item = (LookupIndex, &ChainRule)> + '_ {
        self.lookups
            .iter()
            .enumerate()
            .filter_map(|(idx, candidate)| match candidate {
                Lookup::ChainContextual(subtables) => {
                    LookupIndex::try_from(idx).ok().map(|idx| (idx, subtables))
                }
                _ => None,
            })
            .flat_map(|(idx, subtables)| {
                subtables
                    .iter()
                    .flat_map(|sub| sub.rules.iter())
                    .map(move |rule| (idx, rule))
            })
            .filter(move |(_, rule)| rule.invokes(lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{glyphs, TestFont};

    #[test]
    fn chain_rule_context() {
        let rule = ChainRule {
            backtrack: glyphs(&["b1", "b2"]),
            input: glyphs(&["x"]),
            lookahead: glyphs(&["l1", "l2"]),
            lookups: vec![],
        };
        let extended = rule.with_context(&glyphs(&["w", "x"]));
        assert_eq!(extended, glyphs(&["b2", "b1", "w", "x", "l1", "l2"]));
    }

    #[test]
    fn contiguous_input() {
        let rule = ChainRule {
            input: glyphs(&["b", "c"]),
            ..Default::default()
        };
        assert!(rule.input_is_within(&glyphs(&["a", "b", "c"])));
        assert!(rule.input_is_within(&glyphs(&["b", "c"])));
        assert!(!rule.input_is_within(&glyphs(&["b", "a", "c"])));
        assert!(!rule.input_is_within(&glyphs(&["b"])));
    }

    #[test]
    fn producers_are_indexed_by_output() {
        let font = TestFont::new(&["f", "i", "fi", "a", "a.alt"])
            .single_sub(&[("a", "a.alt")])
            .ligature_sub(&["f", "i"], "fi")
            .build();
        let graph = font.graph();

        let alt = graph.producers_of(&"a.alt".into());
        assert_eq!(alt.len(), 1);
        assert_eq!(alt[0].lookup, 0);
        assert_eq!(alt[0].input, glyphs(&["a"]));

        let fi = graph.producers_of(&"fi".into());
        assert_eq!(fi.len(), 1);
        assert_eq!(fi[0].lookup, 1);
        assert_eq!(fi[0].input, glyphs(&["f", "i"]));

        assert!(graph.producers_of(&"f".into()).is_empty());
    }

    #[test]
    fn features_and_chains_by_lookup() {
        let font = TestFont::new(&["x", "x.alt", "y"])
            .single_sub(&[("x", "x.alt")])
            .chain_sub(&["y"], &["x"], &[], 0)
            .feature("calt", &[1])
            .feature("ss01", &[0, 1])
            .build();
        let graph = font.graph();

        let tags = graph.features_activating(1).collect::<Vec<_>>();
        assert_eq!(tags, [Tag::new(b"calt"), Tag::new(b"ss01")]);

        let chains = graph.chain_rules_invoking(0).collect::<Vec<_>>();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].0, 1);
        assert_eq!(chains[0].1.input, glyphs(&["x"]));
        assert_eq!(graph.chain_rules_invoking(1).count(), 0);
    }
}
