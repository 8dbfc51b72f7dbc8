//! Sheetcalc - seed a sheet from the command line and print results

mod config;

use anyhow::{Context, bail};
use sheetcalc_core::{CellRef, Sheet};
use sheetcalc_engine::builtins::BUILTINS;
use sheetcalc_engine::engine::is_sentinel;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: sheetcalc [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <FILE>           Load sheet size limits from a TOML file");
    eprintln!("  -s, --set <REF=INPUT>     Enter INPUT into cell REF (can be repeated)");
    eprintln!("  -c, --command <INPUT>     Evaluate INPUT and print its value");
    eprintln!("  --at <REF>                Cell used by --command (default: bottom-right)");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Without --command the used area of the sheet is printed as tab-separated rows.");
    eprintln!();
    eprintln!("Functions:");
    for builtin in BUILTINS {
        eprintln!("  {:<26}{}", builtin.name, builtin.description);
    }
}

#[derive(Debug, Default)]
struct Options {
    config_file: Option<PathBuf>,
    assignments: Vec<(CellRef, String)>,
    command: Option<String>,
    at: Option<CellRef>,
}

fn parse_cell(text: &str) -> anyhow::Result<CellRef> {
    CellRef::from_str(text).with_context(|| format!("invalid cell reference: {}", text))
}

fn take_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

fn parse_args(args: &[String]) -> anyhow::Result<Option<Options>> {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "-h" | "--help" => return Ok(None),
            "--config" => options.config_file = Some(PathBuf::from(take_value(args, &mut i, flag)?)),
            "-s" | "--set" => {
                let assignment = take_value(args, &mut i, flag)?;
                let Some((cell, input)) = assignment.split_once('=') else {
                    bail!("--set expects REF=INPUT, got: {}", assignment);
                };
                options.assignments.push((parse_cell(cell)?, input.to_string()));
            }
            "-c" | "--command" => options.command = Some(take_value(args, &mut i, flag)?.to_string()),
            "--at" => options.at = Some(parse_cell(take_value(args, &mut i, flag)?)?),
            arg if arg.starts_with('-') => bail!("Unknown option: {}", arg),
            arg => bail!("Unexpected argument: {}", arg),
        }
        i += 1;
    }

    if options.at.is_some() && options.command.is_none() {
        bail!("--at requires --command");
    }
    Ok(Some(options))
}

/// Run the command and return the process exit code.
fn run(options: Options) -> anyhow::Result<i32> {
    let config = config::load(options.config_file.as_deref())?;
    let mut sheet = Sheet::with_config(config).context("invalid sheet configuration")?;

    for (cell, input) in &options.assignments {
        sheet
            .set_formula(*cell, input)
            .with_context(|| format!("cannot set {}", cell))?;
    }

    let Some(command) = options.command else {
        for row in sheet.to_rows() {
            println!("{}", row.join("\t"));
        }
        return Ok(0);
    };

    let (rows, cols) = sheet.dimensions();
    let at = options.at.unwrap_or(CellRef::new(rows - 1, cols - 1));
    // Command input is always a formula.
    let input = if command.starts_with('=') {
        command
    } else {
        format!("={}", command)
    };
    sheet
        .set_formula(at, &input)
        .with_context(|| format!("cannot evaluate in {}", at))?;

    let value = sheet.display(at)?;
    println!("{}", value);
    Ok(if is_sentinel(&value) { 1 } else { 0 })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    match run(options) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
