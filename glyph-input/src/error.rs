use std::path::PathBuf;

use write_fonts::{read::ReadError, types::Tag};

use crate::glyph_names::GlyphName;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read font file {}: {inner}", path.display())]
    Load {
        path: PathBuf,
        inner: std::io::Error,
    },
    #[error("failed to create output file {}: {inner}", path.display())]
    FileWrite {
        path: PathBuf,
        inner: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to serialize output as json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed font: {0}")]
    FontRead(#[from] ReadError),
    #[error("missing table '{0}'")]
    MissingTable(Tag),
    #[error("no glyph named '{0}' in font")]
    UnknownGlyph(GlyphName),
    #[error("could not start worker threads: '{0}'")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
