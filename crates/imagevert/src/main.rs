//! A tool to perform batch conversion of images.
//!
//! See [`imagevert`] documentation for more information.
//!
//! [`imagevert`]: https://crates.io/crates/imagevert

use anyhow::Result;
use clap::Parser;

const VERSION: &str = match option_env!("MEDIAVERT_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// A tool to perform batch conversion of images.
#[derive(Parser)]
#[command(author, version, about, max_term_width = 80, version = VERSION)]
struct Opts {
    #[command(flatten)]
    inner: imagevert::cli::Imagevert,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    imagevert::cli::entry(&opts.inner)
}
