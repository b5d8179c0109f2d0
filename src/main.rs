// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! cinder - compile and run program trees
//!
//! Reads a JSON program tree, compiles it into units, then runs it, prints a
//! disassembly, or dumps the artifact as JSON.

use anyhow::Context;
use clap::Parser;
use cinder_engine::async_engine::load_program;
use cinder_engine::compiler::disasm;
use cinder_engine::{AsyncEngine, CompletionKind, Compiler, Config, EmitMode, VERSION};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cinder",
    about = "Compile and run JSON program trees",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Program tree (JSON) to compile
    file: PathBuf,

    /// What to do with the compiled program: run, disasm or json
    #[arg(long)]
    emit: Option<EmitMode>,

    /// Compile as strict code regardless of directives
    #[arg(long)]
    strict: bool,

    /// Extra configuration file, applied after cinder.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cinder=debug,cinder_engine=debug")
        } else {
            EnvFilter::new("cinder=warn,cinder_engine=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(path) = &cli.config {
        config
            .merge_from_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    if cli.strict {
        config.strict = true;
    }
    if let Some(emit) = cli.emit {
        config.emit = emit;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli)?;
    debug!(emit = %config.emit, strict = config.strict, "configuration loaded");
    let program = load_program(&cli.file)
        .await
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    match config.emit {
        EmitMode::Disasm => {
            let artifact = Compiler::new().strict(config.strict).compile(&program)?;
            print!("{}", disasm::disassemble(&artifact));
            Ok(ExitCode::SUCCESS)
        }
        EmitMode::Json => {
            let artifact = Compiler::new().strict(config.strict).compile(&program)?;
            println!("{}", serde_json::to_string_pretty(&artifact)?);
            Ok(ExitCode::SUCCESS)
        }
        EmitMode::Run => {
            let engine = AsyncEngine::with_config(config);
            let completion = engine.eval(&program).await?;
            for line in engine.take_output().await {
                println!("{}", line);
            }

            let value = completion.value_or_undefined();
            let shown = engine.display(&value).await;
            if completion.kind == CompletionKind::Throw {
                eprintln!("{}: {}", "Uncaught".red().bold(), shown);
                return Ok(ExitCode::FAILURE);
            }
            if completion.value.is_some() {
                println!("{} {}", "=>".dimmed(), shown.yellow());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
