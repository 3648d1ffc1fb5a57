//! Writing the results

use std::io;

use serde::Serialize;

use crate::{batch::GlyphOutcome, error::Error, resolve::ResolvedInput};

/// One line of `hb-shape` arguments: `--features=a,b "text"`.
///
/// The text is written as a quoted, escaped string so that spaces and
/// combining marks are visible.
pub fn hb_shape_args(input: &ResolvedInput) -> String {
    if input.features.is_empty() {
        return format!("{:?}", input.text);
    }
    let features = input
        .features
        .iter()
        .map(|tag| tag.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("--features={features} {:?}", input.text)
}

/// Write one line per reachable glyph; unreachable glyphs are skipped.
///
/// With `names`, each line starts with the glyph name and a tab.
pub fn write_hb_shape(
    f: &mut dyn io::Write,
    outcomes: &[GlyphOutcome],
    names: bool,
) -> Result<(), Error> {
    for outcome in outcomes {
        let Some(input) = outcome.input.as_ref() else {
            continue;
        };
        if names {
            write!(f, "{}\t", outcome.glyph)?;
        }
        writeln!(f, "{}", hb_shape_args(input))?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    glyph: &'a str,
    features: Option<Vec<String>>,
    text: Option<&'a str>,
}

impl<'a> From<&'a GlyphOutcome> for JsonOutcome<'a> {
    fn from(outcome: &'a GlyphOutcome) -> Self {
        JsonOutcome {
            glyph: outcome.glyph.as_str(),
            features: outcome
                .input
                .as_ref()
                .map(|input| input.features.iter().map(|tag| tag.to_string()).collect()),
            text: outcome.input.as_ref().map(|input| input.text.as_str()),
        }
    }
}

/// Write every outcome as a JSON array; unreachable glyphs have null fields.
pub fn write_json(f: &mut dyn io::Write, outcomes: &[GlyphOutcome]) -> Result<(), Error> {
    let outcomes = outcomes.iter().map(JsonOutcome::from).collect::<Vec<_>>();
    serde_json::to_writer_pretty(&mut *f, &outcomes)?;
    writeln!(f)?;
    Ok(())
}
