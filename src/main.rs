//! edgeroute - evaluate message routing conditions from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use edgeroute::{Compiler, Message, RouterConfig};
use std::path::{Path, PathBuf};

/// edgeroute - message routing condition checker
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile conditions and report their result type or error
    Check {
        /// Condition text, one per argument
        #[arg(required = true)]
        conditions: Vec<String>,
    },

    /// Route a message through a route configuration
    Route {
        /// Route configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Message file (JSON)
        #[arg(short, long)]
        message: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Check { conditions } => check(&conditions),
        Command::Route { config, message } => route(&config, &message),
    }
}

fn check(conditions: &[String]) -> Result<()> {
    let compiler = Compiler::default();
    let mut failures = 0;

    for condition in conditions {
        match compiler.compile_condition(condition) {
            Ok(compiled) => println!("ok    {} : {}", compiled.source(), compiled.result_type()),
            Err(e) => {
                failures += 1;
                println!("error {} : {}", condition, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} conditions failed to compile", failures, conditions.len());
    }
    Ok(())
}

fn route(config: &Path, message: &Path) -> Result<()> {
    let router = RouterConfig::load(config)?
        .build_router(Compiler::default())
        .context("Failed to build router")?;

    let text = std::fs::read_to_string(message)
        .with_context(|| format!("Failed to read message {}", message.display()))?;
    let message: Message = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse message {}", message.display()))?;

    let endpoints = router.route(&message.bindings());
    if endpoints.is_empty() {
        println!("(no matching routes)");
    }
    for endpoint in endpoints {
        println!("{}", endpoint);
    }

    Ok(())
}
