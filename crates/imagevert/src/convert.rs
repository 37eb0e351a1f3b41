use core::fmt;

use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::codec;
use crate::config::Job;
use crate::out::{Out, error, info, warning};
use crate::report::{Failure, FailureKind, Outcome, Report, Status};
use crate::walk::{self, Candidate};

/// Error raised when the input directory of a job does not exist.
#[derive(Debug)]
pub struct MissingInputDirectory {
    pub path: PathBuf,
}

impl fmt::Display for MissingInputDirectory {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input directory `{}` does not exist", self.path.display())
    }
}

impl Error for MissingInputDirectory {}

/// Run a conversion job.
///
/// Per-file failures are recorded in the returned report and never abort the
/// run. Errors are only returned for problems with the job setup itself.
pub fn run(job: &Job, o: &mut Out<'_>) -> Result<Report> {
    if !job.input_dir.is_dir() {
        return Err(MissingInputDirectory {
            path: job.input_dir.clone(),
        }
        .into());
    }

    fs::create_dir_all(&job.output_dir).with_context(|| {
        format!(
            "Creating output directory `{}`",
            job.output_dir.display()
        )
    })?;

    let candidates = walk::candidates(job, o)?;

    let mut report = Report::default();
    let mut written = HashSet::new();

    for candidate in candidates {
        let destination = candidate.destination(job);
        let status = convert_one(job, &candidate, &destination, &mut written, o)?;

        report.push(Outcome {
            source: candidate.path,
            destination,
            status,
        });
    }

    Ok(report)
}

fn convert_one(
    job: &Job,
    candidate: &Candidate,
    destination: &Path,
    written: &mut HashSet<PathBuf>,
    o: &mut Out<'_>,
) -> Result<Status> {
    let source = &candidate.path;

    info!(
        o,
        "converting: {} -> {}",
        source.display(),
        destination.display()
    );

    if let Err(failure) = write_output(job, source, destination, written) {
        error!(o.indent(1), "{}: {failure}", source.display());
        return Ok(Status::Failed(failure));
    }

    if !job.delete_original {
        return Ok(Status::Converted { deleted: false });
    }

    if same_file(source, destination) {
        warning!(
            o.indent(1),
            "not deleting {}, it was overwritten by its output",
            source.display()
        );
        return Ok(Status::Converted { deleted: false });
    }

    if let Err(e) = fs::remove_file(source) {
        let failure = Failure::new(FailureKind::Delete, e);
        error!(o.indent(1), "{}: {failure}", source.display());
        return Ok(Status::DeleteFailed(failure));
    }

    info!(o.indent(1), "deleted: {}", source.display());
    Ok(Status::Converted { deleted: true })
}

fn write_output(
    job: &Job,
    source: &Path,
    destination: &Path,
    written: &mut HashSet<PathBuf>,
) -> Result<(), Failure> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| Failure::new(FailureKind::Write, e))?;
    }

    if written.contains(destination) {
        return Err(Failure::new(
            FailureKind::Collision,
            anyhow!("`{}` was already written", destination.display()),
        ));
    }

    let image = codec::decode(source)?;
    let image = codec::normalize(image, job.color);
    codec::encode(&image, destination, &job.output_format, job.quality)?;

    written.insert(destination.to_path_buf());
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
