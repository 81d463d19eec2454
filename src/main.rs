use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use itertools::Itertools;
use serde::Serialize;
use xpgram::{Grammar, GrammarBuilder, Render, XpgramError, outline};

/// Inspect XPath 3.1 expressions: tokens, trees and canonical rendering.
#[derive(Parser, Debug)]
#[command(name = "xpgram", version, about)]
struct Cli {
    /// Maximum expression nesting before parsing fails
    #[arg(long, global = true, default_value_t = xpgram::xpath31::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Digits kept after the point in decimal division
    #[arg(long, global = true, default_value_t = xpgram::DEFAULT_DIVISION_PRECISION)]
    division_precision: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token stream, one token per line
    Tokenize {
        expr: String,
        /// Emit a JSON array instead
        #[arg(long)]
        json: bool,
    },
    /// Print the syntax tree as an indented outline
    Parse { expr: String },
    /// Print the canonical rendering of the expression
    Render { expr: String },
    /// Exit non-zero and print the error code if the expression is invalid
    Check {
        expr: String,
        /// Emit the result as a JSON object
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct CheckReport {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<xpgram::Diagnostic>,
}

fn main() -> ExitCode {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "xpgram=info");
        }
    }
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error[{}]: {e}", e.code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, XpgramError> {
    let grammar = GrammarBuilder::new()
        .with_max_depth(cli.max_depth)
        .with_division_precision(cli.division_precision)
        .build()?;

    match cli.command {
        Command::Tokenize { expr, json } => {
            let tokens = grammar.tokenize(&expr)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                println!("{}", tokens.iter().map(|t| format!("{:?}", t.as_str())).join("\n"));
            }
        }
        Command::Parse { expr } => {
            let tree = grammar.parse_all(&expr)?;
            print!("{}", outline(&tree));
        }
        Command::Render { expr } => {
            let tree = grammar.parse_all(&expr)?;
            println!("{}", xpgram::join(&tree.render()));
        }
        Command::Check { expr, json } => return check(&grammar, &expr, json),
    }
    Ok(ExitCode::SUCCESS)
}

fn check(grammar: &Grammar, expr: &str, json: bool) -> Result<ExitCode, XpgramError> {
    let report = match grammar.parse_all(expr) {
        Ok(_) => CheckReport { valid: true, error: None },
        Err(e) => CheckReport {
            valid: false,
            error: Some(e.diagnostic()),
        },
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(error) = &report.error {
        println!("{}: {}", error.code, error.message);
    } else {
        println!("ok");
    }
    Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
