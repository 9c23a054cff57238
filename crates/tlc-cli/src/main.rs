//! tlc CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tlc")]
#[command(about = "A single-pass TinyLang to AArch64 assembly compiler", long_about = None)]
struct Cli {
    /// TinyLang source file to compile
    input: PathBuf,

    /// Where to write the generated assembly
    #[arg(default_value = "out.s")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let output = match cli.output.extension() {
        Some(ext) if ext == "s" => cli.output,
        _ => {
            println!(
                "{}  output path {:?} does not end in .s, writing to {:?} instead",
                "warning:".yellow().bold(),
                cli.output,
                "out.s"
            );
            PathBuf::from("out.s")
        }
    };

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read source file: {:?}", cli.input))?;

    println!("{}", "Compiling...".bold().cyan());

    let assembly = tlc_compiler::compile(&source)
        .with_context(|| format!("failed to compile {:?}", cli.input))?;

    fs::write(&output, assembly.as_str())
        .with_context(|| format!("failed to write output file: {:?}", output))?;

    println!(
        "{}  Compilation successful, wrote {}",
        "✓".green().bold(),
        output.display().to_string().bright_black()
    );

    Ok(())
}
