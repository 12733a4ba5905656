//! Outline command implementation

use crate::cli::{OutlineArgs, OutputFormat};
use crate::config::Config;
use crate::outline::{outline_file, FileOutline};
use crate::output;
use crate::walker::FileWalker;
use anyhow::{Context, Result};
use std::env;
use std::time::Instant;
use tracing::{info, warn};

/// Run the outline command
pub fn run(args: OutlineArgs) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if args.no_values {
        config.outline.include_values = false;
    }

    let path = match args.path {
        Some(p) => p,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    let start = Instant::now();
    let outlines: Vec<FileOutline> = if path.is_dir() {
        let files = FileWalker::new(&path, &config.outline)
            .walk()
            .with_context(|| format!("Failed to walk {}", path.display()))?;

        let mut outlines = Vec::with_capacity(files.len());
        for file in files {
            match outline_file(&file, &config) {
                Ok(outline) => outlines.push(outline),
                Err(e) => warn!(file = %file.display(), error = %e, "skipping file"),
            }
        }
        outlines
    } else {
        vec![outline_file(&path, &config)
            .with_context(|| format!("Failed to outline {}", path.display()))?]
    };

    info!(
        files = outlines.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "outlined"
    );

    let format = OutputFormat::from_json_flag(args.json);
    print!("{}", output::format_outlines(&outlines, format));
    Ok(())
}
