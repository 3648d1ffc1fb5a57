//! Finding input for many glyphs at once

use rayon::prelude::*;

use crate::{error::Error, font::FontSnapshot, glyph_names::GlyphName, resolve::ResolvedInput};

/// The result of resolving one glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphOutcome {
    pub glyph: GlyphName,
    /// `None` if no input reaches this glyph.
    pub input: Option<ResolvedInput>,
}

/// How to spread the work across threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    Serial,
    /// Use rayon; `Some(n)` builds a dedicated pool with `n` threads.
    Parallel(Option<usize>),
    /// Use the global rayon pool.
    #[default]
    Auto,
}

impl Parallelism {
    /// The setting implied by a `--threads` argument.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None => Parallelism::Auto,
            Some(0 | 1) => Parallelism::Serial,
            Some(n) => Parallelism::Parallel(Some(n)),
        }
    }
}

impl GlyphOutcome {
    pub fn is_found(&self) -> bool {
        self.input.is_some()
    }
}

/// Resolve every glyph in the font, in glyph order.
///
/// Glyphs with an advance of exactly zero are padded with spaces.
/// Unreachable glyphs are logged, at `warn` if `warn` is set and otherwise
/// at `debug`.
pub fn resolve_all(
    font: &FontSnapshot,
    parallelism: Parallelism,
    warn: bool,
) -> Result<Vec<GlyphOutcome>, Error> {
    let glyphs: Vec<_> = font.glyph_order().iter().cloned().collect();
    run(font, glyphs, parallelism, warn)
}

/// Resolve only the named glyphs, in the order given.
pub fn resolve_glyphs(
    font: &FontSnapshot,
    glyphs: &[GlyphName],
    parallelism: Parallelism,
    warn: bool,
) -> Result<Vec<GlyphOutcome>, Error> {
    if let Some(unknown) = glyphs.iter().find(|glyph| !font.contains(glyph)) {
        return Err(Error::UnknownGlyph(unknown.clone()));
    }
    run(font, glyphs.to_vec(), parallelism, warn)
}

fn run(
    font: &FontSnapshot,
    glyphs: Vec<GlyphName>,
    parallelism: Parallelism,
    warn: bool,
) -> Result<Vec<GlyphOutcome>, Error> {
    if font.metrics().space_width().is_none() {
        log::warn!("font has no usable space glyph, zero-width glyphs will not be padded");
    }

    let resolve_one = |glyph: GlyphName| resolve_glyph(font, glyph, warn);
    let outcomes = match parallelism {
        Parallelism::Serial => glyphs.into_iter().map(resolve_one).collect(),
        Parallelism::Auto => glyphs.into_par_iter().map(resolve_one).collect(),
        Parallelism::Parallel(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads.unwrap_or_default())
                .build()?;
            pool.install(|| glyphs.into_par_iter().map(resolve_one).collect())
        }
    };
    Ok(outcomes)
}

fn resolve_glyph(font: &FontSnapshot, glyph: GlyphName, warn: bool) -> GlyphOutcome {
    let pad = font.metrics().is_zero_advance(&glyph);
    let input = font.resolver().input_for(&glyph, pad);
    if input.is_none() {
        if warn {
            log::warn!("not tested (unreachable?): {glyph}");
        } else {
            log::debug!("not tested (unreachable?): {glyph}");
        }
    }
    GlyphOutcome { glyph, input }
}
