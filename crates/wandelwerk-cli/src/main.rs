// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandelwerk — command-line document converter
//
// Entry point. Initialises logging, loads settings, builds the converter
// registry, and dispatches the subcommand.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wandelwerk_core::ConversionConfig;
use wandelwerk_core::error::Result;
use wandelwerk_core::human_errors::humanize_error;
use wandelwerk_document::{
    ConverterRegistry, PageRasterizer, SourceDocument, default_rasterizer, merge_documents,
};

#[derive(Parser)]
#[command(name = "wandelwerk")]
#[command(version)]
#[command(about = "Convert documents between image, text, office, and PDF formats", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON settings file; missing fields keep their defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one file to another format
    Convert {
        /// Input file; its extension names the source format
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format extension (e.g. pdf, png, docx)
        #[arg(short, long, value_name = "EXT")]
        to: String,

        /// Output file (defaults to the input path with the target extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Concatenate PDFs in the order given
    Merge {
        /// Input PDFs
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output PDF
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// List every supported conversion
    Formats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            debug!(error = %err, "command failed");
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::from(human.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConversionConfig::load(path)?,
        None => ConversionConfig::default(),
    };
    let rasterizer = default_rasterizer();

    match cli.command {
        Commands::Convert { input, to, output } => {
            let registry = ConverterRegistry::standard(&config, rasterizer);
            let output = output.unwrap_or_else(|| default_output_path(&input, &to));
            convert_file(&registry, &input, &to, &output)
        }
        Commands::Merge { inputs, output } => merge_files(&inputs, &output),
        Commands::Formats => {
            let backend = rasterizer.backend();
            let registry = ConverterRegistry::standard(&config, rasterizer);
            print!("{}", formats_table(&registry, backend));
            Ok(())
        }
    }
}

/// Convert `input` to `target` and write the result to `output`.
fn convert_file(registry: &ConverterRegistry, input: &Path, target: &str, output: &Path) -> Result<()> {
    let source = SourceDocument::from_path(input)?;
    let converted = registry.convert(&source, target)?;
    std::fs::write(output, &converted.bytes)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        media_type = %converted.media_type,
        "converted"
    );
    Ok(())
}

fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let sources = inputs
        .iter()
        .map(SourceDocument::from_path)
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_documents(&sources)?;
    std::fs::write(output, &merged.bytes)?;
    info!(inputs = inputs.len(), output = %output.display(), "merged");
    Ok(())
}

/// The input path with its extension replaced by `target`. Refuses to
/// produce the input path itself.
fn default_output_path(input: &Path, target: &str) -> PathBuf {
    let candidate = input.with_extension(target);
    if candidate == input {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".into());
        return input.with_file_name(format!("{stem}.converted.{target}"));
    }
    candidate
}

fn formats_table(registry: &ConverterRegistry, backend: &str) -> String {
    let mut table = String::new();
    for (name, pairs) in registry.describe() {
        table.push_str(&format!("{name:<20} {pairs}\n"));
    }
    table.push_str(&format!("\nPDF page renderer: {backend}\n"));
    table
}
