use core::fmt;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::out::{Out, blank, info, warning};

/// The kind of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source could not be read or decoded.
    Decode,
    /// The codec does not support the color type of the image.
    ColorMode,
    /// The image could not be encoded in the output format.
    Encode,
    /// The output could not be written to disk.
    Write,
    /// The source could not be deleted after conversion.
    Delete,
    /// Another file in the same run already produced this output.
    Collision,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Decode => "decode",
            FailureKind::ColorMode => "unsupported color mode",
            FailureKind::Encode => "encode",
            FailureKind::Write => "write",
            FailureKind::Delete => "delete",
            FailureKind::Collision => "output collision",
        };

        f.write_str(s)
    }
}

/// A recoverable failure to process a single file.
#[derive(Debug)]
pub struct Failure {
    pub kind: FailureKind,
    pub error: anyhow::Error,
}

impl Failure {
    #[inline]
    pub(crate) fn new(kind: FailureKind, error: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }
}

impl fmt::Display for Failure {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.kind, self.error)
    }
}

/// What happened to a single candidate file.
#[derive(Debug)]
pub enum Status {
    /// The file was converted.
    Converted {
        /// Whether the source was deleted afterwards.
        deleted: bool,
    },
    /// The file was converted, but the source could not be deleted.
    DeleteFailed(Failure),
    /// The file could not be converted.
    Failed(Failure),
}

/// The outcome for a single candidate file.
#[derive(Debug)]
pub struct Outcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: Status,
}

impl Outcome {
    /// Test if the output file was written.
    #[inline]
    pub fn is_converted(&self) -> bool {
        matches!(
            self.status,
            Status::Converted { .. } | Status::DeleteFailed(..)
        )
    }

    /// Returns the failure, if any.
    #[inline]
    pub fn failure(&self) -> Option<&Failure> {
        match &self.status {
            Status::Converted { .. } => None,
            Status::DeleteFailed(failure) | Status::Failed(failure) => Some(failure),
        }
    }
}

/// The outcomes of a conversion run, in processing order.
#[derive(Default, Debug)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    /// Look up the outcome for the given source path.
    pub fn get(&self, source: &Path) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }

    /// Count the number of files whose output was written.
    #[inline]
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_converted()).count()
    }

    /// Count the number of files which failed in any way.
    #[inline]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.failure().is_some())
            .count()
    }

    /// Count the number of deleted source files.
    #[inline]
    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, Status::Converted { deleted: true }))
            .count()
    }

    pub(crate) fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Print a summary of the run.
    pub fn summary(&self, o: &mut Out<'_>) -> Result<()> {
        if self.outcomes.is_empty() {
            warning!(o, "No matching files found");
            return Ok(());
        }

        info!(
            o,
            "{} converted, {} failed, {} deleted",
            self.converted(),
            self.failed(),
            self.deleted()
        );

        let mut o = o.indent(1);

        for outcome in &self.outcomes {
            if let Some(failure) = outcome.failure() {
                blank!(o, "{}: {failure}", outcome.source.display());
            }
        }

        Ok(())
    }
}
