//! Glyph widths, used to pad the input for zero-width glyphs

use std::collections::HashMap;

use skrifa::{
    instance::{LocationRef, Size},
    MetadataProvider,
};

use crate::glyph_names::{GlyphName, NameMap};

/// The horizontal extent of one glyph, in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphWidth {
    pub advance: u32,
    /// The width of the glyph's bounding box, if it has an outline.
    pub bbox: Option<u32>,
}

impl GlyphWidth {
    pub fn new(advance: u32, bbox: Option<u32>) -> Self {
        GlyphWidth { advance, bbox }
    }

    /// The advance, or for glyphs that don't advance, their ink width.
    pub fn visible_width(&self) -> u32 {
        if self.advance != 0 {
            self.advance
        } else {
            self.bbox.unwrap_or(0)
        }
    }
}

/// Per-glyph widths, plus the width of the space glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    widths: HashMap<GlyphName, GlyphWidth>,
    space_width: Option<u32>,
}

impl GlyphMetrics {
    /// `space` is the glyph the space character maps to, if any.
    pub fn new(
        widths: impl IntoIterator<Item = (GlyphName, GlyphWidth)>,
        space: Option<&GlyphName>,
    ) -> Self {
        let widths: HashMap<_, _> = widths.into_iter().collect();
        let space_width = space
            .and_then(|space| widths.get(space))
            .map(GlyphWidth::visible_width)
            .filter(|width| *width != 0);
        GlyphMetrics {
            widths,
            space_width,
        }
    }

    /// Read the default-instance metrics of every glyph in the font.
    pub(crate) fn from_font(
        font: &skrifa::FontRef,
        names: &NameMap,
        space: Option<&GlyphName>,
    ) -> Self {
        let metrics = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let widths = names.iter().enumerate().map(|(gid, name)| {
            let gid = skrifa::GlyphId::new(gid as u32);
            let advance = metrics
                .advance_width(gid)
                .map(|adv| adv.round().max(0.0) as u32)
                .unwrap_or(0);
            let bbox = metrics
                .bounds(gid)
                .map(|bounds| (bounds.x_max - bounds.x_min).abs().round() as u32);
            (name.clone(), GlyphWidth::new(advance, bbox))
        });
        Self::new(widths, space)
    }

    pub fn get(&self, glyph: &GlyphName) -> GlyphWidth {
        self.widths.get(glyph).copied().unwrap_or_default()
    }

    /// Whether this glyph has an advance of exactly zero.
    pub fn is_zero_advance(&self, glyph: &GlyphName) -> bool {
        self.get(glyph).advance == 0
    }

    /// The width of the space glyph, if the font has one with a non-zero width.
    pub fn space_width(&self) -> Option<u32> {
        self.space_width
    }

    /// The number of spaces needed to cover the visible width of `glyph`.
    ///
    /// This is zero if the font has no usable space glyph.
    pub fn padding_for(&self, glyph: &GlyphName) -> usize {
        let Some(space) = self.space_width else {
            return 0;
        };
        self.get(glyph).visible_width().div_ceil(space) as usize
    }
}
