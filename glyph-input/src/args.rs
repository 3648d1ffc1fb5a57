use std::{path::PathBuf, str::FromStr};

use crate::{batch::Parallelism, glyph_names::GlyphName};

#[derive(Clone, Debug, clap::Parser)]
pub struct Args {
    pub font_path: PathBuf,
    #[arg(short, long)]
    /// Optional destination path for writing output. Default is stdout.
    pub out: Option<PathBuf>,
    /// Index of font to examine, if target is a font collection
    #[arg(short, long)]
    pub index: Option<u32>,
    /// Only generate input for these glyphs (may be repeated)
    #[arg(short, long = "glyph")]
    pub glyphs: Vec<String>,
    /// Output format, one of hb-shape/json (case insensitive)
    #[arg(short, long, default_value_t)]
    pub format: Format,
    /// Shorthand for `--format json`
    #[arg(long)]
    pub json: bool,
    /// Prefix each hb-shape line with the glyph name
    #[arg(long)]
    pub names: bool,
    /// Log unreachable glyphs as warnings
    #[arg(long)]
    pub warn: bool,
    /// Number of worker threads; 1 runs everything on the main thread
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

impl Args {
    pub fn format(&self) -> Format {
        if self.json {
            Format::Json
        } else {
            self.format.clone()
        }
    }

    pub fn glyphs(&self) -> Vec<GlyphName> {
        self.glyphs.iter().map(GlyphName::new).collect()
    }

    pub fn parallelism(&self) -> Parallelism {
        Parallelism::from_threads(self.threads)
    }
}

/// How to write the results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    HbShape,
    Json,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Format::HbShape => f.write_str("hb-shape"),
            Format::Json => f.write_str("json"),
        }
    }
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static ERR_MSG: &str = "expected one of 'hb-shape', 'json'";
        match s.to_ascii_lowercase().trim() {
            "hb-shape" | "hb_shape" => Ok(Self::HbShape),
            "json" => Ok(Self::Json),
            _ => Err(ERR_MSG),
        }
    }
}
