use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::StandardStream;

use crate::config::{ColorPolicy, DEFAULT_QUALITY, Job};
use crate::out::{Colors, Out, info};
use crate::{convert, interactive};

/// Batch conversion of images.
#[derive(Default, Debug, Clone, Parser)]
pub struct Imagevert {
    /// Directory containing input images.
    #[arg(
        long = "input_dir",
        visible_alias = "input-dir",
        value_name = "DIR",
        required_unless_present = "interactive"
    )]
    pub input_dir: Option<PathBuf>,
    /// Directory to save converted images.
    #[arg(
        long = "output_dir",
        visible_alias = "output-dir",
        value_name = "DIR",
        required_unless_present = "interactive"
    )]
    pub output_dir: Option<PathBuf>,
    /// Format of input images (e.g. tif, bmp).
    #[arg(
        long = "input_format",
        visible_alias = "input-format",
        value_name = "EXT",
        required_unless_present = "interactive"
    )]
    pub input_format: Option<String>,
    /// Format of output images (e.g. jpeg, png).
    #[arg(
        long = "output_format",
        visible_alias = "output-format",
        value_name = "EXT",
        required_unless_present = "interactive"
    )]
    pub output_format: Option<String>,
    /// Process subfolders recursively.
    #[arg(long = "include_subfolders", visible_alias = "include-subfolders")]
    pub include_subfolders: bool,
    /// Delete original files after they have been converted.
    #[arg(long = "delete_original", visible_alias = "delete-original")]
    pub delete_original: bool,
    /// Quality of lossy encodes, between 1 and 100.
    #[arg(
        long,
        default_value_t = DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,
    /// Keep transparency and the original color mode instead of converting
    /// to RGB.
    #[arg(long = "keep_alpha", visible_alias = "keep-alpha")]
    pub keep_alpha: bool,
    /// Prompt for options in an interactive form.
    #[arg(long, short = 'i')]
    pub interactive: bool,
    /// When to use colored output.
    #[arg(long, value_enum, default_value_t, value_name = "WHEN")]
    pub color: Colors,
}

impl Imagevert {
    /// Validate options into a job.
    pub fn job(&self) -> Result<Job> {
        let input_dir = self.input_dir.as_ref().context("Missing --input_dir")?;
        let output_dir = self.output_dir.as_ref().context("Missing --output_dir")?;

        let input_format = self
            .input_format
            .as_deref()
            .context("Missing --input_format")?;

        let output_format = self
            .output_format
            .as_deref()
            .context("Missing --output_format")?;

        let color = if self.keep_alpha {
            ColorPolicy::Preserve
        } else {
            ColorPolicy::Rgb
        };

        let job = Job::new(input_dir, output_dir, input_format, output_format)?
            .recursive(self.include_subfolders)
            .delete_original(self.delete_original)
            .quality(self.quality)
            .color(color);

        Ok(job)
    }
}

/// Entry point for the command line.
pub fn entry(opts: &Imagevert) -> Result<()> {
    let mut opts = opts.clone();

    if opts.interactive && !interactive::prompt(&mut opts)? {
        return Ok(());
    }

    let job = opts.job()?;

    let mut stdout = StandardStream::stdout(opts.color.choice());
    let mut o = Out::new(&mut stdout);

    info!(
        o,
        "Converting *.{} in `{}` to {} in `{}`",
        job.input_format,
        job.input_dir.display(),
        job.output_format,
        job.output_dir.display()
    );

    let report = convert::run(&job, &mut o)?;
    report.summary(&mut o)?;
    Ok(())
}
