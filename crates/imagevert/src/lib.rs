//! A tool to perform batch conversion of images.
//!
//! Every file below an input directory whose name ends with the configured
//! input extension is decoded, converted to RGB and written to a mirrored
//! path below the output directory in the configured output format.
//!
//! ```no_run
//! use imagevert::Job;
//! use imagevert::out::Out;
//! use termcolor::{ColorChoice, StandardStream};
//!
//! let job = Job::new("scans", "converted", "tif", "jpeg")?.recursive(true);
//!
//! let mut stdout = StandardStream::stdout(ColorChoice::Auto);
//! let report = imagevert::convert::run(&job, &mut Out::new(&mut stdout))?;
//! println!("{} files converted", report.converted());
//! # Ok::<_, anyhow::Error>(())
//! ```

pub mod cli;
mod codec;
pub mod config;
pub mod convert;
mod interactive;
pub mod out;
pub mod report;
pub mod walk;

pub use self::config::{ColorPolicy, Job, OutputFormat};
pub use self::convert::MissingInputDirectory;
pub use self::report::{Failure, FailureKind, Outcome, Report, Status};
