//! The `hound` command line front-end.
//!
//! Loads the configuration, captures live or reads a savefile, and prints the round-trip times
//! of every connection found.
use std::io::Write;

use anyhow::{Context, Result};

use hound::config::Config;

pub mod opts;
pub mod report;

pub use opts::Opts;
pub use report::Report;

/// Run one invocation, printing results to `out`.
pub fn run(opts: &Opts, out: &mut dyn Write) -> Result<()> {
    let config = Config::load(&opts.config)
        .with_context(|| format!("loading configuration {}", opts.config.display()))?;
    log::debug!("configuration {:?}", config);

    let input = match &opts.input {
        Some(input) => input.clone(),
        None => {
            log::info!("capturing for {}s: {}", config.duration, config.filter());
            let saved = hound::capture::capture(&config).context("live capture")?;
            writeln!(out, "packets captured saved in file {}", saved.display())?;
            saved
        },
    };

    if !opts.should_analyze() {
        return Ok(());
    }

    log::info!("analyzing {}", input.display());
    let table = hound::analyze(&input, &config)
        .with_context(|| format!("analyzing {}", input.display()))?;
    log::info!("found {} connections", table.len());

    if opts.stdout {
        let report = Report::new(&table);
        if opts.json {
            writeln!(out, "{}", report.to_json()?)?;
        } else {
            write!(out, "{}", report)?;
        }
    }
    Ok(())
}
