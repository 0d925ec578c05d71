//! Error types for html2docx.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for html2docx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading input or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input text is empty or whitespace-only.
    #[error("empty html input")]
    EmptyInput,

    /// An `<img>` element has no `src` attribute.
    #[error("<img> element is missing its src attribute")]
    MissingImageSource,

    /// An `<img>` width/height attribute is not a pixel count.
    #[error("invalid image dimension attribute: {0:?}")]
    BadImageDimension(String),

    /// The image file extension maps to no known docx content type.
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(PathBuf),

    /// Failed to probe an image file for its intrinsic dimensions.
    #[error("image probe error: {0}")]
    ImageProbe(#[from] image::ImageError),

    /// Error assembling the docx zip package.
    #[error("docx package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The external DOCX-to-PDF converter could not be started.
    #[error("failed to launch converter {program:?}: {source}")]
    ConverterLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external converter exited unsuccessfully.
    #[error("converter {program:?} failed with {status}")]
    ConverterFailed { program: String, status: ExitStatus },

    /// The converter reported success but produced no output file.
    #[error("converter produced no output at {0}")]
    ConverterOutputMissing(PathBuf),
}
