use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use html2docx::{build_document, convert, docx};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HTML file (one or more <html> roots, optional inline <style>).
    #[arg(long)]
    html_file: PathBuf,

    /// Output .docx path.
    #[arg(long)]
    docx: PathBuf,

    /// Output .pdf path.
    #[arg(long)]
    pdf: PathBuf,

    /// Header/footer marker text.
    #[arg(long, default_value = "CONFIDENTIAL")]
    marker: String,

    /// DOCX-to-PDF converter program.
    #[arg(long, default_value = convert::DEFAULT_CONVERTER)]
    converter: String,

    /// Stop after writing the .docx artifact.
    #[arg(long)]
    skip_pdf: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut html = String::new();
    File::open(&args.html_file)
        .with_context(|| format!("open {}", args.html_file.display()))?
        .read_to_string(&mut html)
        .with_context(|| format!("read {}", args.html_file.display()))?;

    let started = Instant::now();
    let doc = build_document(&html, &args.marker)?;
    docx::save_docx(&doc, &args.docx)?;
    info!(
        "docx written to {} in {:.2?}",
        args.docx.display(),
        started.elapsed()
    );

    if args.skip_pdf {
        return Ok(());
    }

    let started = Instant::now();
    convert::docx_to_pdf(&args.docx, &args.pdf, &args.converter)?;
    info!("pdf conversion took {:.2?}", started.elapsed());
    Ok(())
}
