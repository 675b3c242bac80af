//! Import a BibTeX file and report what the importer made of it.

use std::path::PathBuf;
use std::process::ExitCode;

use bibtex_import::{CommentHandling, Diagnostic, Document, KeywordCasing, Severity};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

/// Import a BibTeX file and print diagnostics, a summary or the document as JSON.
#[derive(Parser, Debug)]
#[command(name = "diagnose")]
#[command(author, version, about)]
struct Args {
    /// BibTeX file to import
    path: PathBuf,

    /// Print the imported document as JSON
    #[arg(long)]
    json: bool,

    /// Print element counts and inferred properties
    #[arg(short, long)]
    summary: bool,

    /// Drop comments from the document
    #[arg(long)]
    ignore_comments: bool,

    /// Casing of entry types and field names
    #[arg(long, value_enum, default_value_t = Casing::Lower)]
    casing: Casing,

    /// Only report diagnostics of at least this severity
    #[arg(long, value_enum, default_value_t = Level::Info)]
    min_severity: Level,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Casing {
    Lower,
    Initial,
    UpperCamel,
    LowerCamel,
    Upper,
}

impl From<Casing> for KeywordCasing {
    fn from(casing: Casing) -> Self {
        match casing {
            Casing::Lower => Self::LowerCase,
            Casing::Initial => Self::InitialCapital,
            Casing::UpperCamel => Self::UpperCamelCase,
            Casing::LowerCamel => Self::LowerCamelCase,
            Casing::Upper => Self::UpperCase,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Info,
    Warning,
    Error,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Info => Self::Info,
            Level::Warning => Self::Warning,
            Level::Error => Self::Error,
        }
    }
}

fn print_summary(doc: &Document) {
    let properties = doc.properties();
    print!("{}", doc.stats());
    println!("Encoding:         {}", properties.encoding);
    println!("String delimiter: {}", properties.string_delimiter);
    println!("Name formatting:  {:?}", properties.name_formatting);
    println!("Protect casing:   {}", properties.protect_casing);
    println!(
        "Comments:         {} ({:?})",
        properties.comment_context, properties.comment_prefix
    );
    if let Some(separator) = &properties.list_separator {
        println!("List separator:   {separator:?}");
    }
    println!("Sorted by id:     {}", properties.sorted_by_id);
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(?args, "CLI arguments parsed");

    let bytes = match std::fs::read(&args.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let comment_handling = if args.ignore_comments {
        CommentHandling::Ignore
    } else {
        CommentHandling::Keep
    };
    let mut options = Document::parser()
        .comment_handling(comment_handling)
        .keyword_casing(args.casing.into());

    let min_severity = Severity::from(args.min_severity);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = options.parse_bytes(&bytes, &mut diagnostics);

    for diagnostic in diagnostics.iter().filter(|d| d.severity >= min_severity) {
        eprintln!("{}: {diagnostic}", args.path.display());
    }

    let doc = match result {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };
    info!(elements = doc.len(), diagnostics = diagnostics.len(), "Import done");

    if args.summary {
        print_summary(&doc);
    }
    if args.json {
        match serde_json::to_string_pretty(&doc) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Cannot serialize document: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
