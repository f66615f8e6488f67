//! KVS command-line tool
//!
//! Decodes query strings into JSON and encodes JSON into query strings,
//! using a [`Schema`] file to describe the layout.
//!
//! # Commands
//!
//! - `decode --schema FILE [--config FILE] [--report] [--pretty] [QUERY]`
//! - `encode --schema FILE [--config FILE] [--report] [--lines] [FILE]`
//! - `check --schema FILE [--config FILE]`
//!
//! Input is read from stdin when QUERY/FILE is omitted.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kvs_core::{Diagnostic, KeyValueCollection, KeyValueSerializer, SerializerConfig};
use kvs_schema::Schema;
use serde_json::Value;

/// Result of a successful command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Command completed
    Success,
    /// Decode found no mapped value
    NoData,
}

impl Outcome {
    /// Process exit code
    #[inline]
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NoData => 2,
        }
    }
}

fn schema_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("schema")
                .long("schema")
                .short('s')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Schema file (.yaml, .yml or .json)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Serializer config file (.yaml, .yml or .json)"),
        )
}

/// Command-line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("kvs")
        .version(kvs_core::VERSION)
        .about("Decode and encode flat key/value data with mapping schemas")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log mapping events (debug level)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs as JSON lines"),
        )
        .subcommand(
            schema_args(Command::new("decode").about("Decode a query string into JSON"))
                .arg(
                    Arg::new("report")
                        .long("report")
                        .action(ArgAction::SetTrue)
                        .help("Print diagnostics to stderr"),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Pretty-print the JSON output"),
                )
                .arg(Arg::new("query").help("Query string (stdin when omitted)")),
        )
        .subcommand(
            schema_args(Command::new("encode").about("Encode JSON into a query string"))
                .arg(
                    Arg::new("report")
                        .long("report")
                        .action(ArgAction::SetTrue)
                        .help("Print diagnostics to stderr"),
                )
                .arg(
                    Arg::new("lines")
                        .long("lines")
                        .action(ArgAction::SetTrue)
                        .help("Print one key=value pair per line"),
                )
                .arg(
                    Arg::new("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON input file (stdin when omitted)"),
                ),
        )
        .subcommand(schema_args(
            Command::new("check").about("Validate a schema and list its keys"),
        ))
}

/// Run a parsed command line
///
/// # Errors
/// Returns error when files cannot be loaded, the schema or config is
/// invalid, or the data violates the schema.
pub fn run(
    matches: &ArgMatches,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    match matches.subcommand() {
        Some(("decode", args)) => decode(args, input, out, err),
        Some(("encode", args)) => encode(args, input, out, err),
        Some(("check", args)) => check(args, out),
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    }
}

fn load_serializer(args: &ArgMatches) -> Result<KeyValueSerializer<Value>> {
    let schema_path = args
        .get_one::<PathBuf>("schema")
        .context("--schema is required")?;
    let schema = Schema::load(schema_path)
        .with_context(|| format!("loading schema {}", schema_path.display()))?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => SerializerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SerializerConfig::default(),
    };

    schema
        .serializer(config)
        .with_context(|| format!("compiling schema {}", schema.name))
}

fn read_all(input: &mut dyn Read) -> Result<String> {
    let mut text = String::new();
    input.read_to_string(&mut text).context("reading stdin")?;
    Ok(text)
}

fn write_report(err: &mut dyn Write, diagnostics: &[Diagnostic]) -> Result<()> {
    for diagnostic in diagnostics {
        writeln!(err, "warning: {diagnostic}")?;
    }
    Ok(())
}

fn decode(
    args: &ArgMatches,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    let serializer = load_serializer(args)?;
    let query = match args.get_one::<String>("query") {
        Some(query) => query.clone(),
        None => read_all(input)?,
    };

    let collection = KeyValueCollection::from_query(query.trim());
    tracing::debug!(keys = collection.len(), "decoding");
    let report = serializer.deserialize_with_report(&collection)?;

    if args.get_flag("report") {
        write_report(err, &report.diagnostics)?;
    }

    let Some(value) = report.value else {
        return Ok(Outcome::NoData);
    };
    let json = if args.get_flag("pretty") {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    writeln!(out, "{json}")?;
    Ok(Outcome::Success)
}

fn encode(
    args: &ArgMatches,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome> {
    let serializer = load_serializer(args)?;
    let text = match args.get_one::<PathBuf>("file") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => read_all(input)?,
    };

    let value: Value = serde_json::from_str(&text).context("parsing JSON input")?;
    anyhow::ensure!(value.is_object(), "JSON input must be an object");

    let report = serializer.serialize_with_report(&value)?;
    if args.get_flag("report") {
        write_report(err, &report.diagnostics)?;
    }

    if args.get_flag("lines") {
        for (key, value) in report.value.iter() {
            writeln!(out, "{key}={value}")?;
        }
    } else {
        writeln!(out, "{}", report.value.to_query_string())?;
    }
    Ok(Outcome::Success)
}

fn check(args: &ArgMatches, out: &mut dyn Write) -> Result<Outcome> {
    let serializer = load_serializer(args)?;
    for description in serializer.describe() {
        let mut line = format!("{}\t{}", description.key, description.kind);
        if description.mandatory {
            line.push_str("\tmandatory");
        }
        if let Some(flag) = &description.flag {
            line.push_str("\tflag=");
            line.push_str(flag);
        }
        writeln!(out, "{line}")?;
    }
    Ok(Outcome::Success)
}
