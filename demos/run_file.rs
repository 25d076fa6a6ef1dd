//! Example: Compile a minifn source file and run its `main`
//!
//! Usage: cargo run --example run_file <file.mfn> [-O<level>] [--json] [--call <name> <args>...]

use anyhow::{bail, Context, Result};
use minifn::compiler::{module_to_json, Interpreter};
use minifn::{CompileOptions, Compiler};
use std::env;
use std::fs;

struct Args {
    path: String,
    opt_level: u8,
    json: bool,
    call: Option<(String, Vec<i64>)>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut opt_level = 1;
    let mut json = false;
    let mut call = None;

    while let Some(arg) = args.next() {
        if let Some(level) = arg.strip_prefix("-O") {
            opt_level = level
                .parse()
                .with_context(|| format!("invalid optimization level '{}'", level))?;
        } else if arg == "--json" {
            json = true;
        } else if arg == "--call" {
            let name = args.next().context("--call needs a function name")?;
            let values = args
                .by_ref()
                .map(|a| a.parse::<i64>().with_context(|| format!("invalid argument '{}'", a)))
                .collect::<Result<Vec<_>>>()?;
            call = Some((name, values));
        } else if path.is_none() {
            path = Some(arg);
        } else {
            bail!("unexpected argument '{}'", arg);
        }
    }

    let Some(path) = path else {
        bail!("Usage: cargo run --example run_file <file.mfn> [-O<level>] [--json] [--call <name> <args>...]");
    };

    Ok(Args {
        path,
        opt_level,
        json,
        call,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let code = fs::read_to_string(&args.path)
        .with_context(|| format!("Error reading file '{}'", args.path))?;

    println!("Compiling: {}", args.path);
    println!("{}", "=".repeat(60));

    let compiler = Compiler::new(CompileOptions {
        opt_level: args.opt_level,
        ..Default::default()
    });
    let result = compiler.compile(&code)?;

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    if args.json {
        println!("{}", module_to_json(&result.module)?);
    } else {
        println!("{}", result.module);
    }

    println!(
        "{} function(s), {} IR instruction(s)",
        result.function_count, result.ir_instruction_count
    );

    let interp = Interpreter::new(&result.module);
    if let Some((name, values)) = &args.call {
        println!("{}({:?}) = {}", name, values, interp.call(name, values)?);
    } else if result.module.function("main").is_some() {
        println!("main() = {}", interp.run_main()?);
    }

    Ok(())
}
