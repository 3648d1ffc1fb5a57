//! Glyph identifiers and the gid -> name mapping for a binary font
//!
//! Everything past the loader refers to glyphs by name; names come from the
//! `post` table, with fallbacks derived from the character map or the gid.

use std::{
    collections::{HashMap, HashSet},
    fmt::{Debug, Display},
};

use smol_str::SmolStr;
use write_fonts::read::{
    types::{GlyphId16, Tag},
    FontRef, TableProvider,
};

use crate::error::Error;

/// The name of a glyph in the font's glyph order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphName(SmolStr);

impl GlyphName {
    /// The name of the undefined glyph
    pub const NOTDEF: GlyphName = GlyphName(SmolStr::new_inline(".notdef"));

    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for GlyphName {
    fn from(value: &str) -> Self {
        GlyphName(value.into())
    }
}

impl From<SmolStr> for GlyphName {
    fn from(value: SmolStr) -> Self {
        GlyphName(value)
    }
}

impl Debug for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// lets a HashSet<GlyphName> be queried with a &str
impl std::borrow::Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl PartialEq<&str> for GlyphName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// The glyph order of a font: a name for every gid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameMap(Vec<GlyphName>);

impl NameMap {
    /// Create a name mapping for the glyphs in the provided font.
    ///
    /// `reverse_cmap` supplies the codepoint used to name glyphs that have
    /// no `post` name.
    pub fn from_font(
        font: &FontRef,
        reverse_cmap: &HashMap<GlyphId16, u32>,
    ) -> Result<NameMap, Error> {
        let num_glyphs = font
            .maxp()
            .map_err(|_| Error::MissingTable(Tag::new(b"maxp")))?
            .num_glyphs();
        let post = font.post().ok();
        let names = (0..num_glyphs).map(|gid| {
            let gid = GlyphId16::new(gid);
            if gid == GlyphId16::NOTDEF {
                return GlyphName::NOTDEF;
            }
            if let Some(name) = post.as_ref().and_then(|post| post.glyph_name(gid)) {
                return GlyphName::new(name);
            }
            fallback_name(gid, reverse_cmap.get(&gid).copied())
        });
        Ok(names.collect())
    }

    /// Returns the name for this gid, if it is in the font.
    pub fn get(&self, gid: GlyphId16) -> Option<&GlyphName> {
        self.0.get(gid.to_u16() as usize)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|glyph| glyph.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The names in glyph order.
    pub fn iter(&self) -> impl Iterator<Item = &GlyphName> + '_ {
        self.0.iter()
    }
}

/// Builds a glyph order, making duplicate names unique.
///
/// A repeated name gets a `#n` suffix, as fontTools does, so that every gid
/// has its own identifier.
impl FromIterator<GlyphName> for NameMap {
    fn from_iter<T: IntoIterator<Item = GlyphName>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let names = iter
            .into_iter()
            .map(|name| {
                if seen.insert(name.clone()) {
                    return name;
                }
                let mut n = 1;
                let unique = loop {
                    let candidate = GlyphName::new(format!("{name}#{n}"));
                    if !seen.contains(&candidate) {
                        break candidate;
                    }
                    n += 1;
                };
                seen.insert(unique.clone());
                unique
            })
            .collect();
        NameMap(names)
    }
}

fn fallback_name(gid: GlyphId16, codepoint: Option<u32>) -> GlyphName {
    match codepoint {
        Some(raw) if raw <= 0xFFFF => smol_str::format_smolstr!("uni{raw:04X}").into(),
        Some(raw) => smol_str::format_smolstr!("u{raw:X}").into(),
        None => smol_str::format_smolstr!("glyph.{:05}", gid.to_u16()).into(),
    }
}
