//! vmscan trace CLI Application
//!
//! Command-line front end for the vmscan-decoder library:
//! - Reads one or more ftrace text logs
//! - Decodes kswapd and direct reclaim intervals per thread
//! - Prints a TXT or JSON report

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use vmscan_decoder::{DecoderConfig, Importer};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::FileReport;

/// vmscan trace decoder - Build memory-reclaim timelines from ftrace logs
#[derive(Parser, Debug)]
#[command(name = "vmscan-cli")]
#[command(about = "Decode kswapd and direct reclaim intervals from ftrace text logs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to ftrace text log(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("vmscan trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", vmscan_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    // Command line wins over the config file
    config.input.files.extend(args.log.iter().cloned());
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.output_file = Some(output.clone());
    }

    if config.input.files.is_empty() {
        println!("vmscan trace decoder - No input specified");
        println!("\nQuick Start:");
        println!("  vmscan-cli --log trace.txt");
        println!("  vmscan-cli --log trace.txt --format json --output reclaim.json");
        println!("\nWith a config file:");
        println!("  vmscan-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let reports = decode_files(&config.input.files, &config.decoder)?;

    let rendered = match config.output.format {
        OutputFormat::Txt => report::render_txt(&reports, chrono::Utc::now())?,
        OutputFormat::Json => report::render_json(&reports, chrono::Utc::now())?,
    };

    match &config.output.output_file {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Decode every file independently; one importer per file
fn decode_files(files: &[PathBuf], decoder: &DecoderConfig) -> Result<Vec<FileReport>> {
    files
        .par_iter()
        .map(|path| decode_file(path, decoder))
        .collect()
}

fn decode_file(path: &Path, decoder: &DecoderConfig) -> Result<FileReport> {
    let mut importer = Importer::new(decoder.clone())?;
    importer
        .import_file(path)
        .with_context(|| format!("Failed to import trace: {:?}", path))?;
    let timeline = importer.finish();

    if timeline.stats.unhandled_events > 0 {
        log::warn!(
            "{:?}: {} vmscan records did not match their expected format",
            path,
            timeline.stats.unhandled_events
        );
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        timeline,
    })
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_files_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        fs::write(
            &first,
            " kswapd0-47 [000] .... 1.000000: mm_vmscan_kswapd_wake: nid=0 order=1\n \
             kswapd0-47 [000] .... 1.002000: mm_vmscan_kswapd_sleep: nid=0\n",
        )
        .unwrap();
        fs::write(&second, "# empty trace\n").unwrap();

        let reports = decode_files(&[first.clone(), second], &DecoderConfig::new()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, first);
        assert_eq!(reports[0].timeline.slice_count(), 1);
        assert_eq!(reports[1].timeline.slice_count(), 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(decode_files(&[missing], &DecoderConfig::new()).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "vmscan-cli", "--log", "a.txt", "--log", "b.txt", "--format", "json", "-vv",
        ]);
        assert_eq!(args.log.len(), 2);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.verbose, 2);
    }
}
