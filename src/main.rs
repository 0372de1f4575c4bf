//! aozora-normalize - Aozora Bunko XHTML normalizer

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use aozora_normalize::{
    Diagnostics, Document, GaijiResolver, GaijiTable, Metadata, NoGaiji, NormalizeOptions,
    TocEntry,
};

#[derive(Parser)]
#[command(name = "aozora-normalize")]
#[command(version, about = "Normalize Aozora Bunko XHTML into portable markup", long_about = None)]
#[command(after_help = "EXAMPLES:
    aozora-normalize 789_14547.html -o out.html         Normalize a work
    aozora-normalize 789_14547.html --gaiji-table jis2ucs.csv
    aozora-normalize 789_14547.html --sections          Print the TOC as JSON")]
struct Cli {
    /// Input file (Aozora Bunko XHTML, any encoding)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Table mapping JIS X 0213 codes to Unicode (`3-2121,U+3000` lines)
    #[arg(long, value_name = "FILE")]
    gaiji_table: Option<PathBuf>,

    /// Write the table of contents, metadata and diagnostics as JSON instead
    /// of the document
    #[arg(long)]
    sections: bool,

    /// Encoding to assume when the input is not UTF-8 and declares nothing
    #[arg(long, value_name = "LABEL", default_value = "Shift_JIS")]
    fallback_encoding: String,

    /// Only log errors, hiding diagnostics
    #[arg(short, long)]
    quiet: bool,

    /// Log more (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(serde::Serialize)]
struct SectionsReport<'a> {
    metadata: &'a Metadata,
    toc: TocEntry,
    diagnostics: &'a Diagnostics,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let options = NormalizeOptions {
        fallback_encoding: cli.fallback_encoding.clone(),
        ..NormalizeOptions::default()
    };

    let doc = match &cli.gaiji_table {
        Some(path) => {
            let table =
                GaijiTable::from_path(path).map_err(|e| format!("{}: {e}", path.display()))?;
            normalize(&cli.input, &table, &options)?
        }
        None => normalize(&cli.input, &NoGaiji, &options)?,
    };

    // Diagnostics reach stderr through the logger as they are recorded.
    let output = if cli.sections {
        let report = SectionsReport {
            metadata: &doc.metadata,
            toc: doc.toc(),
            diagnostics: &doc.diagnostics,
        };
        let mut json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        json.push('\n');
        json
    } else {
        doc.render()
    };

    match &cli.output {
        Some(path) => std::fs::write(path, output).map_err(|e| format!("{}: {e}", path.display())),
        None => {
            print!("{output}");
            Ok(())
        }
    }
}

fn normalize<R: GaijiResolver>(
    path: &Path,
    resolver: &R,
    options: &NormalizeOptions,
) -> Result<Document, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Document::from_bytes(&bytes, resolver, options).map_err(|e| format!("{}: {e}", path.display()))
}
