//! # image-dedup CLI
//!
//! Command-line interface for the perceptual duplicate finder.
//!
//! ## Usage
//! ```bash
//! image-dedup scan ~/Pictures --algorithm phash --threshold 8
//! image-dedup scan ~/Pictures --action move --action-dir ~/dupes
//! ```

mod cli;

use image_dedup::Result;

fn main() -> Result<()> {
    image_dedup::init_tracing();
    cli::run()
}
