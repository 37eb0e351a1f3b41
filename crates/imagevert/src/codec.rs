//! Decoding and encoding through the [`image`] crate.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::error::UnsupportedErrorKind;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use tempfile::NamedTempFile;

use crate::config::{ColorPolicy, OutputFormat};
use crate::report::{Failure, FailureKind};

/// Decode the image at the given path.
///
/// The format is sniffed from the file contents, falling back to the
/// extension. The file is closed before this returns.
pub(crate) fn decode(path: &Path) -> Result<DynamicImage, Failure> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| Failure::new(FailureKind::Decode, e))?;

    reader
        .decode()
        .map_err(|e| classify(e, FailureKind::Decode, FailureKind::Decode))
}

/// Prepare a decoded image for encoding.
pub(crate) fn normalize(image: DynamicImage, policy: ColorPolicy) -> DynamicImage {
    match policy {
        ColorPolicy::Rgb => match image {
            DynamicImage::ImageRgb8(..) => image,
            image => DynamicImage::ImageRgb8(image.to_rgb8()),
        },
        ColorPolicy::Preserve => image,
    }
}

/// Encode the image into the given path.
///
/// The image is written to a temporary file next to the destination, which
/// is synced and then renamed over the destination. On failure the
/// destination is left untouched.
pub(crate) fn encode(
    image: &DynamicImage,
    path: &Path,
    format: &OutputFormat,
    quality: u8,
) -> Result<(), Failure> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".imagevert-");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| Failure::new(FailureKind::Write, e))?;

    write(image, &mut temp, format.format(), quality)?;

    temp.as_file()
        .sync_all()
        .map_err(|e| Failure::new(FailureKind::Write, e))?;

    temp.persist(path)
        .map_err(|e| Failure::new(FailureKind::Write, e.error))?;

    Ok(())
}

fn write(
    image: &DynamicImage,
    temp: &mut NamedTempFile,
    format: ImageFormat,
    quality: u8,
) -> Result<(), Failure> {
    let mut w = BufWriter::new(temp);

    let result = match format {
        ImageFormat::Jpeg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut w, quality))
        }
        format => image.write_to(&mut w, format),
    };

    result.map_err(|e| classify(e, FailureKind::Write, FailureKind::Encode))?;
    w.flush().map_err(|e| Failure::new(FailureKind::Write, e))?;
    Ok(())
}

/// Classify a codec error into a failure.
fn classify(error: ImageError, io: FailureKind, other: FailureKind) -> Failure {
    let kind = match &error {
        ImageError::IoError(..) => io,
        ImageError::Unsupported(e) if matches!(e.kind(), UnsupportedErrorKind::Color(..)) => {
            FailureKind::ColorMode
        }
        _ => other,
    };

    Failure::new(kind, error)
}
