//! schemapeek - Infer relational schemas from a peek at tabular data

use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

use schemapeek::config::{Config, OutputFormat, PEEK_BYTES, PEEK_LINES};
use schemapeek::output::render_to_stdout;
use schemapeek::{ContentType, SchemaInferrer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Infer relational schemas from tabular data (CSV, JSON, NDJSON, line protocol, XLSX, ODS, Parquet), optionally gzip compressed
#[derive(Parser, Debug)]
#[command(name = "schemapeek")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log debugging information
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Infer the schema of a file, or of stdin when INPUT is `-`
    Infer {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Content type by name or MIME type; detected from the file name when omitted
        #[arg(short = 't', long)]
        content_type: Option<ContentType>,

        /// Sub-resource to read, e.g. a sheet name or index within a spreadsheet
        #[arg(short, long)]
        address: Option<String>,

        /// Table name; derived from the file name when omitted
        #[arg(long)]
        table_name: Option<String>,

        /// Primary key column; inferred when omitted
        #[arg(long)]
        primary_key: Option<String>,

        /// How many bytes to read from line-oriented input
        #[arg(long, default_value_t = PEEK_BYTES)]
        peek_bytes: u64,

        /// How many lines/records to read from input
        #[arg(long, default_value_t = PEEK_LINES)]
        peek_lines: usize,

        /// Input is gzip compressed; implied by a `.gz` file name
        #[arg(long)]
        gzip: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,
    },

    /// List supported content types
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Log to stderr. RUST_LOG takes precedence over the command line flags.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Info => {
            print_info();
            Ok(())
        }
        Command::Infer {
            input,
            content_type,
            address,
            table_name,
            primary_key,
            peek_bytes,
            peek_lines,
            gzip,
            format,
        } => {
            let mut config = Config::new()
                .with_peek_bytes(peek_bytes)
                .with_peek_lines(peek_lines)
                .with_gzip(gzip)
                .with_output_format(format.into());
            if let Some(content_type) = content_type {
                config = config.with_content_type(content_type);
            }
            if let Some(address) = address {
                config = config.with_address(address);
            }
            if let Some(name) = table_name {
                config = config.with_table_name(name);
            }
            if let Some(pk) = primary_key {
                config = config.with_primary_key(pk);
            }

            let output_format = config.output_format;
            let mut inferrer = SchemaInferrer::new(config);

            let inference = if input.as_os_str() == "-" {
                inferrer
                    .infer_detailed(io::stdin().lock(), None)
                    .context("Failed to infer schema from stdin")?
            } else {
                let file = File::open(&input)
                    .with_context(|| format!("Failed to open file: {}", input.display()))?;
                inferrer
                    .infer_detailed(BufReader::new(file), Some(input.as_path()))
                    .with_context(|| format!("Failed to infer schema: {}", input.display()))?
            };

            render_to_stdout(&inference, output_format)?;
            Ok(())
        }
    }
}

fn print_info() {
    let mut builder = Builder::default();
    builder.push_record(["Content type", "MIME type", "Suffixes"]);
    for content_type in ContentType::ALL {
        builder.push_record([
            content_type.name().to_string(),
            content_type.mime_type().to_string(),
            content_type.suffixes().join(", "),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern());
    println!("{}", table);
}
