use core::fmt;

use std::path::PathBuf;

use anyhow::{Result, bail};
use image::ImageFormat;

/// JPEG quality used unless configured otherwise.
pub const DEFAULT_QUALITY: u8 = 90;

/// How decoded images are prepared before they are encoded.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPolicy {
    /// Convert to 8-bit RGB, dropping alpha and any other color mode.
    #[default]
    Rgb,
    /// Encode the decoded image as-is.
    Preserve,
}

/// The format images are converted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    token: String,
    format: ImageFormat,
}

impl OutputFormat {
    /// Resolve an output format from a token like `jpeg` or `png`.
    pub fn parse(token: &str) -> Result<Self> {
        let token = normalize_token(token)?;

        let Some(format) = ImageFormat::from_extension(&token) else {
            bail!("Unknown output format `{token}`");
        };

        if !format.writing_enabled() {
            bail!("Writing images in format `{token}` is not supported");
        }

        Ok(Self { token, format })
    }

    /// The lower-cased token, used as the extension of converted files.
    #[inline]
    pub fn extension(&self) -> &str {
        &self.token
    }

    /// The codec format.
    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl fmt::Display for OutputFormat {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token.to_uppercase())
    }
}

/// The configuration of a single conversion run.
#[derive(Debug, Clone)]
pub struct Job {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Lower-cased extension token without a leading dot.
    pub input_format: String,
    pub output_format: OutputFormat,
    /// Descend into subdirectories of the input directory.
    pub recursive: bool,
    /// Delete each source file once it has been converted.
    pub delete_original: bool,
    /// Quality used for lossy encodes.
    pub quality: u8,
    pub color: ColorPolicy,
}

impl Job {
    /// Construct a new job with default options.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        input_format: &str,
        output_format: &str,
    ) -> Result<Self> {
        Ok(Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            input_format: normalize_token(input_format)?,
            output_format: OutputFormat::parse(output_format)?,
            recursive: false,
            delete_original: false,
            quality: DEFAULT_QUALITY,
            color: ColorPolicy::default(),
        })
    }

    /// Set whether subdirectories are visited.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set whether sources are deleted after conversion.
    pub fn delete_original(mut self, delete_original: bool) -> Self {
        self.delete_original = delete_original;
        self
    }

    /// Set the quality used for lossy encodes.
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the color policy.
    pub fn color(mut self, color: ColorPolicy) -> Self {
        self.color = color;
        self
    }

    /// The suffix a file name must end with, once lower-cased, to be
    /// converted.
    pub fn suffix(&self) -> String {
        format!(".{}", self.input_format)
    }
}

fn normalize_token(token: &str) -> Result<String> {
    let token = token.trim();
    let token = token.strip_prefix('.').unwrap_or(token);

    if token.is_empty() {
        bail!("Image format must not be empty");
    }

    Ok(token.to_lowercase())
}
