//! markdown-highlight - Tokenize R Markdown from the command line
//!
//! Entry point for the binary. Handles CLI argument parsing, logging
//! initialization, configuration loading and token output.

use anyhow::Context as _;
use markdown_highlight::editor::TextBuffer;
use markdown_highlight::error::ConfigError;
use markdown_highlight::{EngineConfig, Token, TokenizedLine, Tokenizer};
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

/// Application name for logging
const APP_NAME: &str = "markdown-highlight";

/// Options collected from the command line
#[derive(Debug, Default)]
struct Flags {
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    no_rainbow: bool,
    colors: Option<usize>,
    json: bool,
}

/// One tokenized line in JSON output
#[derive(Serialize)]
struct LineReport<'a> {
    row: usize,
    end_state: &'a str,
    tokens: &'a [Token],
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let flags = parse_args();
    let config = load_config(&flags)?;
    log::debug!("Using {:?}", config);

    let tokenizer = Tokenizer::markdown(config).context("Could not build the Markdown grammar")?;
    let buffer = TextBuffer::from_text(&read_input(&flags)?);
    let rows: Vec<String> = (0..buffer.len_lines())
        .filter_map(|row| buffer.line(row))
        .collect();
    let lines = tokenizer.scan_lines(rows.iter().map(String::as_str))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if flags.json {
        write_json(&mut out, &tokenizer, &lines)?;
    } else {
        write_plain(&mut out, &tokenizer, &lines)?;
    }
    out.flush()?;
    Ok(())
}

/// Initialize the logging system
fn init_logging() {
    // Set default log level if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();
}

/// Parse command line arguments
fn parse_args() -> Flags {
    let args: Vec<String> = std::env::args().collect();
    let mut flags = Flags::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--json" => flags.json = true,
            "--no-rainbow" => flags.no_rainbow = true,
            "--colors" => {
                match args.get(i + 1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) => flags.colors = Some(n),
                    None => {
                        eprintln!("Error: --colors requires a number");
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
            "--config" => {
                match args.get(i + 1) {
                    Some(path) => flags.config = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("Error: --config requires a path argument");
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
            "-" => flags.file = None,
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
            path => flags.file = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    flags
}

/// Persisted options with command line overrides applied
fn load_config(flags: &Flags) -> anyhow::Result<EngineConfig> {
    let mut config = match &flags.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => match EngineConfig::load() {
            Ok(config) => config,
            Err(ConfigError::DirectoryError) => {
                log::warn!("No configuration directory, using defaults");
                EngineConfig::default()
            }
            Err(err) => return Err(err.into()),
        },
    };

    if flags.no_rainbow {
        config.rainbow_enabled = false;
    }
    if let Some(colors) = flags.colors {
        config.color_count = colors;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(flags: &Flags) -> anyhow::Result<String> {
    match &flags.file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Could not read standard input")?;
            Ok(text)
        }
    }
}

fn state_name<'a>(tokenizer: &'a Tokenizer, line: &TokenizedLine) -> &'a str {
    tokenizer.grammar().state_name(line.end_state).unwrap_or("?")
}

fn write_plain(
    out: &mut impl Write,
    tokenizer: &Tokenizer,
    lines: &[TokenizedLine],
) -> io::Result<()> {
    for (row, line) in lines.iter().enumerate() {
        write!(out, "{:>4} [{}]", row + 1, state_name(tokenizer, line))?;
        for token in &line.tokens {
            write!(out, " {}={:?}", token.kind, token.text)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_json(
    out: &mut impl Write,
    tokenizer: &Tokenizer,
    lines: &[TokenizedLine],
) -> anyhow::Result<()> {
    let reports: Vec<LineReport<'_>> = lines
        .iter()
        .enumerate()
        .map(|(row, line)| LineReport {
            row: row + 1,
            end_state: state_name(tokenizer, line),
            tokens: &line.tokens,
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &reports)?;
    writeln!(out)?;
    Ok(())
}

/// Print help message
fn print_help() {
    println!(
        r#"{name} - Tokenize R Markdown for syntax highlighting

USAGE:
    {name} [OPTIONS] [FILE]

Reads FILE, or standard input when FILE is omitted or "-", and prints the
tokens of every line together with the state the line ends in.

OPTIONS:
    -h, --help          Show this help message
    -v, --version       Show version information
        --json          Print tokens as JSON
        --no-rainbow    Do not rotate colors across fenced divs
        --colors N      Number of fenced div colors (default 7)
        --config PATH   Read options from PATH instead of the user config

ENVIRONMENT:
    RUST_LOG            Log filter, e.g. RUST_LOG=markdown_highlight=trace
"#,
        name = APP_NAME
    );
}

/// Print version information
fn print_version() {
    println!("{} {}", APP_NAME, env!("CARGO_PKG_VERSION"));
}
