//! CLI app for generating shaping input for every glyph in a font

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use clap::Parser;
use glyph_input::{args, output, Error, FontSnapshot};

fn main() -> Result<(), Error> {
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            writeln!(
                buf,
                "{}: {:?}: {}: {}",
                ts,
                std::thread::current().id(),
                record.level(),
                record.args()
            )
        })
        .init();

    let args = args::Args::parse();
    let font = FontSnapshot::load(&args.font_path, args.index)?;

    let mut out = output_target(args.out.as_deref())?;

    let glyphs = args.glyphs();
    let outcomes = if glyphs.is_empty() {
        glyph_input::resolve_all(&font, args.parallelism(), args.warn)?
    } else {
        glyph_input::resolve_glyphs(&font, &glyphs, args.parallelism(), args.warn)?
    };

    let found = outcomes.iter().filter(|outcome| outcome.is_found()).count();
    log::info!(
        "found input for {found} glyphs, {} unreachable",
        outcomes.len() - found
    );

    match args.format() {
        args::Format::HbShape => output::write_hb_shape(&mut out, &outcomes, args.names)?,
        args::Format::Json => output::write_json(&mut out, &outcomes)?,
    }
    out.flush()?;

    Ok(())
}

/// Buffered writer for `path`, or stdout if there is none.
fn output_target(path: Option<&Path>) -> Result<Box<dyn Write>, Error> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    };
    let file = File::create(path).map_err(|inner| Error::FileWrite {
        path: path.to_owned(),
        inner,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}
