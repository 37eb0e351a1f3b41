use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;

use crate::config::Job;
use crate::out::{Out, warning};

/// A file which matched the input format of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path to the source file.
    pub path: PathBuf,
    /// Directory of the source relative to the input directory.
    pub relative: PathBuf,
    /// File name without its extension.
    pub stem: OsString,
}

impl Candidate {
    /// Construct the mirrored output path under the output directory.
    pub fn destination(&self, job: &Job) -> PathBuf {
        let mut name = self.stem.clone();
        name.push(".");
        name.push(job.output_format.extension());

        let mut path = job.output_dir.join(&self.relative);
        path.push(name);
        path
    }
}

/// Test if a file name matches the given lower-cased suffix.
pub(crate) fn matches(name: &str, suffix: &str) -> bool {
    name.to_lowercase().ends_with(suffix)
}

/// Collect all candidate files of a job.
///
/// Everything is collected up front, so files written during the conversion
/// are never visited.
pub fn candidates(job: &Job, o: &mut Out<'_>) -> Result<Vec<Candidate>> {
    let suffix = job.suffix();

    let mut walker = WalkBuilder::new(&job.input_dir);
    walker
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    if !job.recursive {
        walker.max_depth(Some(1));
    } else if let Some(excluded) = nested_output(job) {
        walker.filter_entry(move |e| {
            if !e.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }

            e.path()
                .canonicalize()
                .map_or(true, |path| path != excluded)
        });
    }

    let mut candidates = Vec::new();

    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warning!(o, "{error}");
                continue;
            }
        };

        let path = entry.path();

        let is_file = match entry.file_type() {
            Some(t) if t.is_symlink() => path.is_file(),
            Some(t) => t.is_file(),
            None => false,
        };

        if !is_file {
            continue;
        }

        let name = entry.file_name().to_string_lossy();

        if !matches(&name, &suffix) {
            continue;
        }

        let relative = path
            .parent()
            .and_then(|p| p.strip_prefix(&job.input_dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let stem = path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| entry.file_name().to_os_string());

        candidates.push(Candidate {
            path: path.to_path_buf(),
            relative,
            stem,
        });
    }

    Ok(candidates)
}

/// The canonical output directory if it is strictly inside the input
/// directory.
fn nested_output(job: &Job) -> Option<PathBuf> {
    let input = job.input_dir.canonicalize().ok()?;
    let output = job.output_dir.canonicalize().ok()?;
    (output != input && output.starts_with(&input)).then_some(output)
}
