use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use libconfig::{ParseOptions, Value};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "cfgget", version, about = "Read one setting from a libconfig file")]
struct Args {
    /// Config file to parse.
    file: PathBuf,

    /// Path segments: group keys, or decimal indexes for lists and arrays.
    path: Vec<String>,

    /// How to render the setting.
    #[arg(short = 't', long = "type", value_enum, default_value_t = OutputType::String)]
    output: OutputType,

    /// Only report whether the path exists; exits with 1 when it does not.
    #[arg(short, long)]
    exists: bool,

    /// Directory relative include patterns resolve against (default: the
    /// directory of FILE).
    #[arg(long, value_name = "dir")]
    include_dir: Option<PathBuf>,

    /// Require ';' terminators and single-typed scalar arrays.
    #[arg(long)]
    strict: bool,

    /// Log parse progress to stderr; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputType {
    String,
    Int,
    Float,
    Bool,
    Bigint,
    Hex,
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR  {err}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let mut options = ParseOptions::new().with_strict(args.strict);
    if let Some(dir) = &args.include_dir {
        options = options.with_include_dir(dir);
    }
    let mut parser = libconfig::Parser::with_options(options);
    let root = parser
        .parse_file(&args.file)
        .map_err(|err| describe_error(&err))?;
    let path: Vec<&str> = args.path.iter().map(String::as_str).collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.exists {
        let found = root.exists(&path);
        writeln!(out, "{found}")?;
        return Ok(if found {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }
    write_setting(&mut out, root, &path, args.output)?;
    Ok(ExitCode::SUCCESS)
}

fn write_setting(
    out: &mut dyn Write,
    root: Value<'_>,
    path: &[&str],
    output: OutputType,
) -> Result<(), Box<dyn Error>> {
    match output {
        OutputType::String => writeln!(out, "{}", root.get_string(path))?,
        OutputType::Int => writeln!(out, "{}", root.get_int(path))?,
        OutputType::Float => writeln!(out, "{}", root.get_float64(path))?,
        OutputType::Bool => writeln!(out, "{}", root.get_bool(path))?,
        OutputType::Bigint => writeln!(out, "{}", root.get_bigint(path))?,
        OutputType::Hex => writeln!(out, "{}", root.get_hex(path))?,
        OutputType::Json => {
            match root.get(path) {
                Some(value) => serde_json::to_writer_pretty(&mut *out, &value)?,
                None => out.write_all(b"null")?,
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn describe_error(err: &libconfig::Error) -> String {
    let mut prefix = String::new();
    if let Some(path) = &err.path {
        prefix.push_str(&path.display().to_string());
        prefix.push(':');
    }
    if let Some(location) = err.location {
        prefix.push_str(&format!("{}:{}:", location.line, location.column));
    }
    if prefix.is_empty() {
        err.to_string()
    } else {
        format!("{prefix} {err}")
    }
}
