//! Mapping glyphs back to the characters that reach them

use std::collections::HashMap;

use write_fonts::read::{
    tables::cmap::{CmapSubtable, EncodingRecord, PlatformId},
    types::{GlyphId, GlyphId16, Tag},
    FontRef, TableProvider,
};

use crate::{error::Error, glyph_names::GlyphName};

const SPACE: char = ' ';

/// For each glyph reachable from the character map, the smallest character
/// that maps to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReverseCharacterMap {
    chars: HashMap<GlyphName, char>,
    space: Option<GlyphName>,
}

impl ReverseCharacterMap {
    /// Invert a set of character -> glyph mappings.
    pub fn new(mappings: impl IntoIterator<Item = (char, GlyphName)>) -> Self {
        let mut chars = HashMap::new();
        let mut space = None;
        for (chr, glyph) in mappings {
            if chr == SPACE {
                space = Some(glyph.clone());
            }
            // several characters may map to the same glyph; keep the lowest.
            let val = chars.entry(glyph).or_insert(chr);
            *val = chr.min(*val);
        }
        ReverseCharacterMap { chars, space }
    }

    pub fn get(&self, glyph: &GlyphName) -> Option<char> {
        self.chars.get(glyph).copied()
    }

    /// The glyph that U+0020 maps to, if any.
    pub fn space_glyph(&self) -> Option<&GlyphName> {
        self.space.as_ref()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// The mappings in the font's Unicode cmap subtable with the most entries.
pub(crate) fn largest_unicode_subtable(font: &FontRef) -> Result<Vec<(u32, GlyphId16)>, Error> {
    // <https://github.com/fonttools/fonttools/blob/6fa1a76e061c2e84243d8cac/Lib/fontTools/ttLib/tables/_c_m_a_p.py#L334>
    fn is_unicode(record: &&EncodingRecord) -> bool {
        record.platform_id() == PlatformId::Unicode
            || record.platform_id() == PlatformId::Windows
                && [0, 1, 10].contains(&record.encoding_id())
    }

    let cmap = font
        .cmap()
        .map_err(|_| Error::MissingTable(Tag::new(b"cmap")))?;
    let offset_data = cmap.offset_data();

    let largest = cmap
        .encoding_records()
        .iter()
        .filter(is_unicode)
        .filter_map(|rec| match rec.subtable(offset_data) {
            Ok(subtable) => Some(subtable),
            Err(e) => {
                log::warn!(
                    "skipping unreadable cmap subtable ({:?}, {}): {e}",
                    rec.platform_id(),
                    rec.encoding_id()
                );
                None
            }
        })
        .map(|subtable| {
            let mut mappings = Vec::new();
            let mut push = |(unicode, gid): (u32, GlyphId)| {
                if let Ok(gid) = GlyphId16::try_from(gid) {
                    mappings.push((unicode, gid));
                }
            };
            match subtable {
                CmapSubtable::Format4(subtable) => subtable.iter().for_each(&mut push),
                CmapSubtable::Format12(subtable) => subtable.iter().for_each(&mut push),
                _ => (),
            }
            mappings
        })
        // max_by_key returns the last maximum; we want the first one in the font
        .fold(Vec::new(), |best, next| {
            if next.len() > best.len() {
                next
            } else {
                best
            }
        });

    Ok(largest)
}

/// For each gid, the smallest codepoint that maps to it.
pub(crate) fn smallest_codepoints(mappings: &[(u32, GlyphId16)]) -> HashMap<GlyphId16, u32> {
    let mut result = HashMap::new();
    for (unicode, gid) in mappings {
        let val = result.entry(*gid).or_insert(*unicode);
        *val = (*unicode).min(*val);
    }
    result
}
