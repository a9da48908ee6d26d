//! Native Render CLI
//!
//! Usage:
//!   native-render [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Render configuration (TOML format)
//!       --text           Print the joined text without reconstruction
//!   -t, --type           Prefix the result with its kind
//!       --explain        Show why the joined text is not a literal
//!   -v, --verbose        Enable debug logging
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use native_render::{
    concat_text, parse_literal, parse_script, render_fragments, ConcatOptions, RenderConfig,
    Value,
};

#[derive(Parser)]
#[command(name = "native-render")]
#[command(about = "Reconstruct native values from rendered template fragments")]
struct Cli {
    /// Fragment script (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Render configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the joined text without reconstruction
    #[arg(long)]
    text: bool,

    /// Prefix the result with its kind
    #[arg(short = 't', long = "type")]
    show_type: bool,

    /// Show why the joined text is not a literal when reconstruction misses
    #[arg(long)]
    explain: bool,

    /// Enable debug logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let config = match &cli.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    // Read input
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let fragments = match parse_script(&source) {
        Ok(fragments) => fragments,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("loaded {} fragment(s)", fragments.len());

    if cli.text {
        match concat_text(fragments) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.explain {
        explain(&fragments, &config);
    }

    let options = ConcatOptions::new().with_limits(config.limits.clone());
    match render_fragments(fragments.into_iter().map(Ok), &options) {
        Ok(value) => print_value(&value, cli.show_type),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the reconstruction diagnostic for the joined text, if any
fn explain(fragments: &[Value], config: &RenderConfig) {
    if let [single] = fragments {
        if !single.is_string() {
            eprintln!("single {} fragment is returned unchanged", single.kind());
            return;
        }
    }
    let Ok(joined) = concat_text(fragments.iter().cloned()) else {
        return;
    };
    if let Err(e) = parse_literal(&joined, &config.limits) {
        eprint!("{}", e.format(&joined, "fragments"));
    }
}

fn print_value(value: &Value, show_type: bool) {
    if show_type {
        println!("{}: {}", value.kind(), value.repr());
    } else {
        println!("{}", value);
    }
}

fn print_intro() {
    println!(
        r#"Native Render - native values from template fragments

USAGE:
    native-render [OPTIONS] [FILE]
    echo '<script>' | native-render

OPTIONS:
    -c, --config     Render configuration (TOML file)
    --text           Print the joined text without reconstruction
    -t, --type       Prefix the result with its kind
    --explain        Show why the joined text is not a literal
    -v, --verbose    Enable debug logging (repeat for trace)
    -h, --help       Print help

FRAGMENT SCRIPT:
    fragments = ["0.000", 7, {{ bytes = "Ynl0ZXM=" }}, {{ null = true }},
                 {{ tuple = [1, 2] }}, {{ undefined = "name" }}]

QUICK START:
    echo 'fragments = ["0.000", 7]' | native-render --type

This joins the fragments to "0.0007" and prints "float: 0.0007"."#
    );
}
