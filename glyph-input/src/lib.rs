//! Generating shaping input for the glyphs in a font
//!
//! For every glyph we search the character map and the GSUB rule graph
//! (single, ligature and chaining contextual substitutions) for a short piece
//! of text, plus the feature tags to enable, that a shaping engine would turn
//! into that glyph. The results are meant to be fed to a shaper in regression
//! tests.

pub mod args;
pub mod batch;
mod cmap;
mod error;
mod font;
mod glyph_names;
pub mod graph;
mod gsub;
mod metrics;
pub mod output;
mod resolve;

#[cfg(test)]
mod test_helpers;

pub use batch::{resolve_all, resolve_glyphs, GlyphOutcome, Parallelism};
pub use cmap::ReverseCharacterMap;
pub use error::Error;
pub use font::FontSnapshot;
pub use glyph_names::{GlyphName, NameMap};
pub use metrics::{GlyphMetrics, GlyphWidth};
pub use resolve::{InProgress, ResolvedInput, Resolver};
