//=============================================
// src/main.rs
//=============================================
// Author: MambaScript Contributors
// License: MIT (see LICENSE)
// Goal: MambaScript CLI entrypoint for running .mmb scripts
// Objective: Provide tokenizing/parsing diagnostics and script execution
//            with safe-mode support
//=============================================

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;

use mambascript::parser::Parser;
use mambascript::tokenizer::Tokenizer;
use mambascript::{evaluate_with_options, Options, Value};

//=============================================
//            Section 1: CLI Definition
//=============================================

#[derive(Debug, ClapParser)]
#[command(
    name = "mambascript",
    about = "Runs MambaScript files.",
    version
)]
struct Args {
    /// Path to the MambaScript file to execute.
    script: PathBuf,

    /// Block stdlib modules that touch the filesystem or the network.
    #[arg(long)]
    safe: bool,

    /// Print the token stream and exit.
    #[arg(long)]
    print_tokens: bool,

    /// Pretty-print the parsed statements and exit.
    #[arg(long)]
    print_ast: bool,

    /// Inject a variable as `name=value` (bound as a string).
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,
}

//=============================================
//            Section 2: Entry Point
//=============================================

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run_script(&args)
}

fn run_script(args: &Args) -> Result<()> {
    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;

    if args.print_tokens {
        let tokens = Tokenizer::new(&source)
            .tokenize()
            .map_err(|err| anyhow!(err.render(&source)))?;
        for token in tokens {
            println!(
                "{:4}:{:<3} {:?}",
                token.position.line, token.position.column, token.kind
            );
        }
        return Ok(());
    }

    if args.print_ast {
        let tokens = Tokenizer::new(&source)
            .tokenize()
            .map_err(|err| anyhow!(err.render(&source)))?;
        let program = Parser::new(tokens)
            .parse()
            .map_err(|err| anyhow!(err.render(&source)))?;
        println!("{:#?}", program);
        return Ok(());
    }

    let injected = parse_injected(&args.vars)?;
    let options = Options {
        safe_mode: args.safe,
        ..Options::default()
    };

    match evaluate_with_options(&source, &args.script.display().to_string(), injected, options) {
        Ok(_) => Ok(()),
        Err(err) => {
            eprintln!("{}", err.render(&source));
            process::exit(1);
        }
    }
}

//=============================================
//            Section 3: Helpers
//=============================================

fn parse_injected(vars: &[String]) -> Result<Vec<(String, Value)>> {
    let mut injected = Vec::with_capacity(vars.len());
    for entry in vars {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("--var expects NAME=VALUE, got '{}'", entry))?;
        injected.push((name.to_string(), Value::from(value)));
    }
    Ok(injected)
}
