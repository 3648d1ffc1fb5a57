//! Everything we need from a font, read once up front

use std::path::Path;

use write_fonts::read::{FileRef, ReadError};

use crate::{
    cmap::{self, ReverseCharacterMap},
    error::Error,
    glyph_names::{GlyphName, NameMap},
    graph::SubstitutionGraph,
    gsub,
    metrics::GlyphMetrics,
    resolve::Resolver,
};

/// An immutable view of one font: names, character map, widths and GSUB.
///
/// Nothing here borrows the font data, so a snapshot can outlive the bytes
/// it was read from and be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct FontSnapshot {
    glyph_order: NameMap,
    cmap: ReverseCharacterMap,
    metrics: GlyphMetrics,
    graph: SubstitutionGraph,
}

impl FontSnapshot {
    pub fn new(
        glyph_order: NameMap,
        cmap: ReverseCharacterMap,
        metrics: GlyphMetrics,
        graph: SubstitutionGraph,
    ) -> Self {
        FontSnapshot {
            glyph_order,
            cmap,
            metrics,
            graph,
        }
    }

    /// Read the font at `path`; `index` selects a member of a collection.
    pub fn load(path: &Path, index: Option<u32>) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|inner| Error::Load {
            path: path.to_owned(),
            inner,
        })?;
        Self::from_bytes(&data, index)
    }

    /// Parse a font (or one member of a collection) from raw bytes.
    pub fn from_bytes(data: &[u8], index: Option<u32>) -> Result<Self, Error> {
        let index = index.unwrap_or(0);
        let font = match FileRef::new(data)? {
            FileRef::Collection(collection) => collection.get(index)?,
            FileRef::Font(font) if index == 0 => font,
            FileRef::Font(_) => return Err(ReadError::InvalidCollectionIndex(index).into()),
        };

        let mappings = cmap::largest_unicode_subtable(&font)?;
        let glyph_order = NameMap::from_font(&font, &cmap::smallest_codepoints(&mappings))?;
        let cmap = ReverseCharacterMap::new(mappings.iter().filter_map(|(unicode, gid)| {
            let chr = char::from_u32(*unicode)?;
            let name = glyph_order.get(*gid)?;
            Some((chr, name.clone()))
        }));

        let metrics = match skrifa::FontRef::from_index(data, index) {
            Ok(font) => GlyphMetrics::from_font(&font, &glyph_order, cmap.space_glyph()),
            Err(e) => {
                log::warn!("could not read glyph metrics, treating all widths as 0: {e}");
                GlyphMetrics::new([], cmap.space_glyph())
            }
        };

        let graph = gsub::substitution_graph(&font, &glyph_order);
        log::debug!(
            "loaded {} glyphs, {} mapped characters, {} lookups",
            glyph_order.len(),
            cmap.len(),
            graph.lookups().len()
        );

        Ok(FontSnapshot {
            glyph_order,
            cmap,
            metrics,
            graph,
        })
    }

    pub fn glyph_order(&self) -> &NameMap {
        &self.glyph_order
    }

    pub fn cmap(&self) -> &ReverseCharacterMap {
        &self.cmap
    }

    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    pub fn graph(&self) -> &SubstitutionGraph {
        &self.graph
    }

    pub fn contains(&self, glyph: &GlyphName) -> bool {
        self.glyph_order.contains(glyph.as_str())
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.cmap, &self.graph, &self.metrics)
    }
}
