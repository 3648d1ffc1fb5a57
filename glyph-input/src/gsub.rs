//! Reading GSUB into a [`SubstitutionGraph`]
//!
//! Only the lookup types that can produce a glyph (single, ligature) or
//! activate another lookup (chaining contextual) are decoded; everything else
//! becomes [`Lookup::Other`]. Bad data is skipped with a warning rather than
//! failing the whole font.

use std::collections::{HashMap, HashSet};

use write_fonts::read::{
    tables::{
        gsub::{
            LigatureSubstFormat1, SingleSubst, SubstitutionLookupList, SubstitutionSubtables,
        },
        layout::{
            ChainedSequenceContext, ChainedSequenceContextFormat1,
            ChainedSequenceContextFormat2, ChainedSequenceContextFormat3, ClassDef,
            CoverageTable, FeatureList, SequenceLookupRecord,
        },
    },
    types::{BigEndian, GlyphId16},
    FontRef, ReadError, TableProvider,
};

use crate::{
    glyph_names::{GlyphName, NameMap},
    graph::{
        self, ChainContextSubst, ChainRule, FeatureRecord, LigatureSubst, Lookup, NestedLookup,
        SubstitutionGraph,
    },
};

/// Build the substitution graph for a font.
///
/// A font without GSUB (or without a lookup or feature list) has an empty graph.
pub(crate) fn substitution_graph(font: &FontRef, names: &NameMap) -> SubstitutionGraph {
    let Ok(gsub) = font.gsub() else {
        log::debug!("font has no GSUB table");
        return SubstitutionGraph::default();
    };
    let lookups = match gsub.lookup_list() {
        Ok(list) => read_lookups(&list, names),
        Err(e) => {
            log::warn!("could not read GSUB lookup list: {e}");
            Vec::new()
        }
    };
    let features = match gsub.feature_list() {
        Ok(list) => read_features(&list),
        Err(e) => {
            log::warn!("could not read GSUB feature list: {e}");
            Vec::new()
        }
    };
    SubstitutionGraph::new(lookups, features)
}

/// Decode every lookup, keeping one entry per lookup so indices stay stable.
pub(crate) fn read_lookups(list: &SubstitutionLookupList, names: &NameMap) -> Vec<Lookup> {
    list.lookups()
        .iter()
        .enumerate()
        .map(|(idx, lookup)| {
            match lookup.and_then(|lookup| lookup.subtables()) {
                Ok(subtables) => read_lookup(subtables, idx, names),
                Err(e) => {
                    log::warn!("could not read GSUB lookup {idx}: {e}");
                    Lookup::Other
                }
            }
        })
        .collect()
}

/// The lookups turned on by each feature record, in font order.
pub(crate) fn read_features(list: &FeatureList) -> Vec<FeatureRecord> {
    list.feature_records()
        .iter()
        .filter_map(|record| {
            let tag = record.feature_tag();
            match record.feature(list.offset_data()) {
                Ok(feature) => Some(FeatureRecord {
                    tag,
                    lookups: feature
                        .lookup_list_indices()
                        .iter()
                        .map(|idx| idx.get())
                        .collect(),
                }),
                Err(e) => {
                    log::warn!("skipping unreadable feature '{tag}': {e}");
                    None
                }
            }
        })
        .collect()
}

fn read_lookup(subtables: SubstitutionSubtables, lookup: usize, names: &NameMap) -> Lookup {
    match subtables {
        SubstitutionSubtables::Single(subs) => Lookup::Single(read_subtables(
            subs.iter(),
            lookup,
            |sub| single_subst(&sub, names),
        )),
        SubstitutionSubtables::Ligature(subs) => Lookup::Ligature(read_subtables(
            subs.iter(),
            lookup,
            |sub| ligature_subst(&sub, names),
        )),
        SubstitutionSubtables::ChainContextual(subs) => {
            Lookup::ChainContextual(read_subtables(subs.iter(), lookup, |sub| {
                chain_context_subst(&sub, names)
            }))
        }
        _ => Lookup::Other,
    }
}

fn read_subtables<T, U>(
    subtables: impl Iterator<Item = Result<T, ReadError>>,
    lookup: usize,
    mut read: impl FnMut(T) -> Result<U, ReadError>,
) -> Vec<U> {
    subtables
        .enumerate()
        .filter_map(|(i, sub)| match sub.and_then(&mut read) {
            Ok(sub) => Some(sub),
            Err(e) => {
                log::warn!("skipping unreadable subtable {i} in GSUB lookup {lookup}: {e}");
                None
            }
        })
        .collect()
}

pub(crate) fn single_subst(
    subtable: &SingleSubst,
    names: &NameMap,
) -> Result<graph::SingleSubst, ReadError> {
    let pairs: Vec<_> = match subtable {
        SingleSubst::Format1(sub) => {
            let delta = sub.delta_glyph_id();
            sub.coverage()?
                .iter()
                .map(|gid| (gid, GlyphId16::new(gid.to_u16().wrapping_add_signed(delta))))
                .collect()
        }
        SingleSubst::Format2(sub) => sub
            .coverage()?
            .iter()
            .zip(sub.substitute_glyph_ids())
            .map(|(gid, replacement)| (gid, replacement.get()))
            .collect(),
    };
    let mapping = pairs
        .into_iter()
        .filter_map(|(input, output)| Some((names.get(input)?.clone(), names.get(output)?.clone())))
        .collect();
    Ok(graph::SingleSubst { mapping })
}

pub(crate) fn ligature_subst(
    subtable: &LigatureSubstFormat1,
    names: &NameMap,
) -> Result<LigatureSubst, ReadError> {
    let coverage = subtable.coverage()?;
    let mut ligature_sets = Vec::new();
    for (first, set) in coverage.iter().zip(subtable.ligature_sets().iter()) {
        let set = set?;
        let Some(first) = names.get(first) else {
            continue;
        };
        let mut ligatures = Vec::new();
        for ligature in set.ligatures().iter() {
            let ligature = ligature?;
            let components = ligature.component_glyph_ids().iter().map(BigEndian::get);
            if let (Some(glyph), Some(components)) = (
                names.get(ligature.ligature_glyph()),
                named(names, components),
            ) {
                ligatures.push(graph::Ligature {
                    components,
                    glyph: glyph.clone(),
                });
            }
        }
        ligature_sets.push((first.clone(), ligatures));
    }
    Ok(LigatureSubst { ligature_sets })
}

pub(crate) fn chain_context_subst(
    subtable: &ChainedSequenceContext,
    names: &NameMap,
) -> Result<ChainContextSubst, ReadError> {
    let rules = match subtable {
        ChainedSequenceContext::Format1(sub) => chain_rules_format1(sub, names)?,
        ChainedSequenceContext::Format2(sub) => chain_rules_format2(sub, names)?,
        ChainedSequenceContext::Format3(sub) => {
            chain_rule_format3(sub, names)?.into_iter().collect()
        }
    };
    Ok(ChainContextSubst { rules })
}

fn chain_rules_format1(
    subtable: &ChainedSequenceContextFormat1,
    names: &NameMap,
) -> Result<Vec<ChainRule>, ReadError> {
    let coverage = subtable.coverage()?;
    let mut rules = Vec::new();
    for (first, rule_set) in coverage.iter().zip(subtable.chained_seq_rule_sets().iter()) {
        let Some(rule_set) = rule_set.transpose()? else {
            continue;
        };
        for rule in rule_set.chained_seq_rules().iter() {
            let rule = rule?;
            let input = std::iter::once(first).chain(rule.input_sequence().iter().map(BigEndian::get));
            let (Some(backtrack), Some(input), Some(lookahead)) = (
                named(names, rule.backtrack_sequence().iter().map(BigEndian::get)),
                named(names, input),
                named(names, rule.lookahead_sequence().iter().map(BigEndian::get)),
            ) else {
                continue;
            };
            rules.push(ChainRule {
                backtrack,
                input,
                lookahead,
                lookups: nested_lookups(rule.seq_lookup_records()),
            });
        }
    }
    Ok(rules)
}

fn chain_rules_format2(
    subtable: &ChainedSequenceContextFormat2,
    names: &NameMap,
) -> Result<Vec<ChainRule>, ReadError> {
    let num_glyphs = names.len();
    let input_class_def = subtable.input_class_def()?;
    let backtrack_classes = ClassRepresentatives::new(&subtable.backtrack_class_def()?, num_glyphs);
    let input_classes = ClassRepresentatives::new(&input_class_def, num_glyphs);
    let lookahead_classes =
        ClassRepresentatives::new(&subtable.lookahead_class_def()?, num_glyphs);
    // the first input glyph must also be in the coverage table
    let first_classes = ClassRepresentatives::for_coverage(&input_class_def, &subtable.coverage()?);

    let mut rules = Vec::new();
    for (class, rule_set) in subtable.chained_class_seq_rule_sets().iter().enumerate() {
        let Some(rule_set) = rule_set.transpose()? else {
            continue;
        };
        let Some(first) = u16::try_from(class).ok().and_then(|class| first_classes.get(class))
        else {
            log::debug!("no glyph in input class {class}, skipping its rules");
            continue;
        };
        for rule in rule_set.chained_class_seq_rules().iter() {
            let rule = rule?;
            let (Some(backtrack), Some(input), Some(lookahead)) = (
                backtrack_classes.glyphs(rule.backtrack_sequence()),
                input_classes.glyphs(rule.input_sequence()),
                lookahead_classes.glyphs(rule.lookahead_sequence()),
            ) else {
                continue;
            };
            let input = std::iter::once(first).chain(input);
            let (Some(backtrack), Some(input), Some(lookahead)) = (
                named(names, backtrack),
                named(names, input),
                named(names, lookahead),
            ) else {
                continue;
            };
            rules.push(ChainRule {
                backtrack,
                input,
                lookahead,
                lookups: nested_lookups(rule.seq_lookup_records()),
            });
        }
    }
    Ok(rules)
}

fn chain_rule_format3(
    subtable: &ChainedSequenceContextFormat3,
    names: &NameMap,
) -> Result<Option<ChainRule>, ReadError> {
    fn lowest_glyphs<'a>(
        coverages: impl Iterator<Item = Result<CoverageTable<'a>, ReadError>>,
    ) -> Result<Option<Vec<GlyphId16>>, ReadError> {
        let mut result = Vec::new();
        for coverage in coverages {
            let Some(gid) = coverage?.iter().min() else {
                return Ok(None);
            };
            result.push(gid);
        }
        Ok(Some(result))
    }

    let (Some(backtrack), Some(input), Some(lookahead)) = (
        lowest_glyphs(subtable.backtrack_coverages().iter())?,
        lowest_glyphs(subtable.input_coverages().iter())?,
        lowest_glyphs(subtable.lookahead_coverages().iter())?,
    ) else {
        return Ok(None);
    };
    let (Some(backtrack), Some(input), Some(lookahead)) = (
        named(names, backtrack),
        named(names, input),
        named(names, lookahead),
    ) else {
        return Ok(None);
    };
    Ok(Some(ChainRule {
        backtrack,
        input,
        lookahead,
        lookups: nested_lookups(subtable.seq_lookup_records()),
    }))
}

fn nested_lookups(records: &[SequenceLookupRecord]) -> Vec<NestedLookup> {
    records
        .iter()
        .map(|rec| NestedLookup {
            sequence_index: rec.sequence_index(),
            lookup_index: rec.lookup_list_index(),
        })
        .collect()
}

/// Names for a run of glyphs, or `None` if any gid is past the end of the font.
fn named(names: &NameMap, gids: impl IntoIterator<Item = GlyphId16>) -> Option<Vec<GlyphName>> {
    gids.into_iter()
        .map(|gid| names.get(gid).cloned())
        .collect()
}

/// The lowest glyph in each class of a class definition.
struct ClassRepresentatives(HashMap<u16, GlyphId16>);

impl ClassRepresentatives {
    /// Class 0 is every glyph the class def doesn't mention; `.notdef` is
    /// never chosen for it.
    fn new(class_def: &ClassDef, num_glyphs: usize) -> Self {
        let mut reps = HashMap::new();
        let mut assigned = HashSet::new();
        for (gid, class) in class_def.iter() {
            assigned.insert(gid);
            Self::insert(&mut reps, class, gid);
        }
        let num_glyphs = u16::try_from(num_glyphs).unwrap_or(u16::MAX);
        if let Some(gid) = (1..num_glyphs)
            .map(GlyphId16::new)
            .find(|gid| !assigned.contains(gid))
        {
            Self::insert(&mut reps, 0, gid);
        }
        ClassRepresentatives(reps)
    }

    /// Like [`ClassRepresentatives::new`], but only considering glyphs in `coverage`.
    fn for_coverage(class_def: &ClassDef, coverage: &CoverageTable) -> Self {
        let classes: HashMap<_, _> = class_def.iter().collect();
        let mut reps = HashMap::new();
        for gid in coverage.iter() {
            let class = classes.get(&gid).copied().unwrap_or(0);
            Self::insert(&mut reps, class, gid);
        }
        ClassRepresentatives(reps)
    }

    fn insert(reps: &mut HashMap<u16, GlyphId16>, class: u16, gid: GlyphId16) {
        let rep = reps.entry(class).or_insert(gid);
        *rep = gid.min(*rep);
    }

    fn get(&self, class: u16) -> Option<GlyphId16> {
        self.0.get(&class).copied()
    }

    /// Representatives for a sequence of classes, or `None` if any class is empty.
    fn glyphs(&self, classes: &[BigEndian<u16>]) -> Option<Vec<GlyphId16>> {
        classes.iter().map(|class| self.get(class.get())).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use write_fonts::{
        read::{tables::gsub as rgsub, tables::layout as rlayout, FontData, FontRead},
        tables::{gsub as wgsub, layout as wlayout},
        types::Tag,
    };

    use super::*;
    use crate::test_helpers::glyphs;

    fn names(names: &[&str]) -> NameMap {
        names.iter().copied().map(GlyphName::from).collect()
    }

    fn gids(gids: &[u16]) -> Vec<GlyphId16> {
        gids.iter().copied().map(GlyphId16::new).collect()
    }

    fn coverage(glyphs: &[u16]) -> wlayout::CoverageTable {
        gids(glyphs).into_iter().collect()
    }

    fn class_def(classes: &[(u16, u16)]) -> wlayout::ClassDef {
        classes
            .iter()
            .map(|(gid, class)| (GlyphId16::new(*gid), *class))
            .collect()
    }

    fn name_pairs(subst: &graph::SingleSubst) -> Vec<(&str, &str)> {
        subst
            .mapping
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect()
    }

    const GLYPHS: &[&str] = &[".notdef", "a", "b", "c", "a.alt", "b.alt", "f", "i", "fi"];

    #[test]
    fn single_format_1() {
        let table = wgsub::SingleSubst::format_1(coverage(&[1, 2]), 3);
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rgsub::SingleSubst::read(FontData::new(&bytes)).unwrap();

        let subst = single_subst(&table, &names(GLYPHS)).unwrap();
        assert_eq!(name_pairs(&subst), [("a", "a.alt"), ("b", "b.alt")]);
    }

    #[test]
    fn single_format_2() {
        let table = wgsub::SingleSubst::format_2(coverage(&[1, 2]), gids(&[5, 4]));
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rgsub::SingleSubst::read(FontData::new(&bytes)).unwrap();

        let subst = single_subst(&table, &names(GLYPHS)).unwrap();
        assert_eq!(name_pairs(&subst), [("a", "b.alt"), ("b", "a.alt")]);
    }

    #[test]
    fn single_out_of_range_is_dropped() {
        let table = wgsub::SingleSubst::format_2(coverage(&[1, 2]), gids(&[4, 400]));
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rgsub::SingleSubst::read(FontData::new(&bytes)).unwrap();

        let subst = single_subst(&table, &names(GLYPHS)).unwrap();
        assert_eq!(name_pairs(&subst), [("a", "a.alt")]);
    }

    #[test]
    fn ligatures() {
        let table = wgsub::LigatureSubstFormat1::new(
            coverage(&[6]),
            vec![wgsub::LigatureSet::new(vec![wgsub::Ligature::new(
                GlyphId16::new(8),
                gids(&[7]),
            )])],
        );
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rgsub::LigatureSubstFormat1::read(FontData::new(&bytes)).unwrap();

        let subst = ligature_subst(&table, &names(GLYPHS)).unwrap();
        assert_eq!(subst.ligature_sets.len(), 1);
        let (first, ligatures) = &subst.ligature_sets[0];
        assert_eq!(first.as_str(), "f");
        assert_eq!(
            ligatures,
            &[graph::Ligature {
                components: glyphs(&["i"]),
                glyph: "fi".into(),
            }]
        );
    }

    #[test]
    fn feature_list() {
        let table = wlayout::FeatureList::new(vec![
            wlayout::FeatureRecord::new(Tag::new(b"liga"), wlayout::Feature::new(None, vec![0, 2])),
            wlayout::FeatureRecord::new(Tag::new(b"calt"), wlayout::Feature::new(None, vec![1])),
        ]);
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rlayout::FeatureList::read(FontData::new(&bytes)).unwrap();

        assert_eq!(
            read_features(&table),
            [
                FeatureRecord {
                    tag: Tag::new(b"liga"),
                    lookups: vec![0, 2],
                },
                FeatureRecord {
                    tag: Tag::new(b"calt"),
                    lookups: vec![1],
                },
            ]
        );
    }

    fn read_chain(table: wlayout::ChainedSequenceContext) -> Vec<ChainRule> {
        let bytes = write_fonts::dump_table(&table).unwrap();
        let table = rlayout::ChainedSequenceContext::read(FontData::new(&bytes)).unwrap();
        chain_context_subst(&table, &names(GLYPHS)).unwrap().rules
    }

    #[test]
    fn chain_format_1() {
        // b a [c] -> lookup 3 at the first input position
        let table = wlayout::ChainedSequenceContext::format_1(
            coverage(&[1]),
            vec![Some(wlayout::ChainedSequenceRuleSet::new(vec![
                wlayout::ChainedSequenceRule::new(
                    gids(&[2]),
                    gids(&[2]),
                    gids(&[3]),
                    vec![wlayout::SequenceLookupRecord::new(0, 3)],
                ),
            ]))],
        );
        assert_eq!(
            read_chain(table),
            [ChainRule {
                backtrack: glyphs(&["b"]),
                input: glyphs(&["a", "b"]),
                lookahead: glyphs(&["c"]),
                lookups: vec![NestedLookup {
                    sequence_index: 0,
                    lookup_index: 3,
                }],
            }]
        );
    }

    #[test]
    fn chain_format_2() {
        // input class 1 = {b, a}; the rule is "class 1 then class 0"
        let table = wlayout::ChainedSequenceContext::format_2(
            coverage(&[1, 2]),
            class_def(&[(6, 1)]),
            class_def(&[(2, 1), (1, 1)]),
            class_def(&[]),
            vec![
                None,
                Some(wlayout::ChainedClassSequenceRuleSet::new(vec![
                    wlayout::ChainedClassSequenceRule::new(
                        vec![1],
                        vec![0],
                        vec![],
                        vec![wlayout::SequenceLookupRecord::new(1, 0)],
                    ),
                ])),
            ],
        );
        assert_eq!(
            read_chain(table),
            [ChainRule {
                backtrack: glyphs(&["f"]),
                input: glyphs(&["a", "c"]),
                lookahead: vec![],
                lookups: vec![NestedLookup {
                    sequence_index: 1,
                    lookup_index: 0,
                }],
            }]
        );
    }

    #[test]
    fn chain_format_2_empty_class_is_skipped() {
        let table = wlayout::ChainedSequenceContext::format_2(
            coverage(&[1]),
            class_def(&[]),
            class_def(&[(1, 1)]),
            class_def(&[]),
            vec![
                None,
                Some(wlayout::ChainedClassSequenceRuleSet::new(vec![
                    // class 7 has no glyphs
                    wlayout::ChainedClassSequenceRule::new(
                        vec![],
                        vec![7],
                        vec![],
                        vec![wlayout::SequenceLookupRecord::new(0, 0)],
                    ),
                ])),
            ],
        );
        assert!(read_chain(table).is_empty());
    }

    #[test]
    fn chain_format_3() {
        let table = wlayout::ChainedSequenceContext::format_3(
            vec![coverage(&[3, 2]), coverage(&[6])],
            vec![coverage(&[7, 1])],
            vec![],
            vec![wlayout::SequenceLookupRecord::new(0, 2)],
        );
        assert_eq!(
            read_chain(table),
            [ChainRule {
                backtrack: glyphs(&["b", "f"]),
                input: glyphs(&["a"]),
                lookahead: vec![],
                lookups: vec![NestedLookup {
                    sequence_index: 0,
                    lookup_index: 2,
                }],
            }]
        );
    }
}
