//! Conversion gateway to the external DOCX-to-PDF renderer.
//!
//! The converter is an opaque collaborator driven through its CLI contract
//! (LibreOffice-compatible: `--headless --convert-to pdf --outdir`). Any
//! failure is propagated unchanged; the docx artifact already on disk is
//! left in place for inspection.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

/// Default converter program name.
pub const DEFAULT_CONVERTER: &str = "soffice";

fn converter_command(program: &str, docx: &Path, outdir: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir)
        .arg(docx);
    cmd
}

/// Renders `docx` to `pdf` with the given converter program. No retry, no
/// interpretation of converter diagnostics.
pub fn docx_to_pdf(docx: &Path, pdf: &Path, program: &str) -> Result<()> {
    let outdir = pdf.parent().filter(|p| !p.as_os_str().is_empty());
    let outdir = match outdir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => Path::new(".").to_path_buf(),
    };

    let mut cmd = converter_command(program, docx, &outdir);
    debug!("invoking converter: {:?}", cmd);
    let status = cmd.status().map_err(|source| Error::ConverterLaunch {
        program: program.to_string(),
        source,
    })?;
    if !status.success() {
        return Err(Error::ConverterFailed {
            program: program.to_string(),
            status,
        });
    }

    // The converter names its output after the input stem.
    let produced = outdir
        .join(docx.file_stem().unwrap_or_default())
        .with_extension("pdf");
    if !produced.exists() {
        return Err(Error::ConverterOutputMissing(produced));
    }
    if produced != pdf {
        fs::rename(&produced, pdf)?;
    }
    info!("pdf written to {}", pdf.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn command_follows_the_converter_contract() {
        let cmd = converter_command(
            DEFAULT_CONVERTER,
            Path::new("report.docx"),
            Path::new("/tmp/out"),
        );
        assert_eq!(cmd.get_program(), OsStr::new("soffice"));
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("--headless"),
                OsStr::new("--convert-to"),
                OsStr::new("pdf"),
                OsStr::new("--outdir"),
                OsStr::new("/tmp/out"),
                OsStr::new("report.docx"),
            ]
        );
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = docx_to_pdf(
            &dir.path().join("in.docx"),
            &dir.path().join("out.pdf"),
            "definitely-not-a-real-converter",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConverterLaunch { .. }));
    }
}
