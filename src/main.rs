// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wasm_promql::bridge::{invoke_blocking, KernelInput, ModuleRegistry};
use wasm_promql::config::{load_and_validate_config, LoggingConfig};
use wasm_promql::promql::{Matrix, Vector};

/// Input file layout: exactly one of the two keys.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputFile {
    vector: Option<Vector>,
    matrix: Option<Matrix>,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new(wasm_promql::config::consts::DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<KernelInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading input file {}", path.display()))?;
    let input: InputFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing input file {}", path.display()))?;
    Ok(KernelInput::from_parts(input.vector, input.matrix)?)
}

fn parse_scalars(args: &[String]) -> anyhow::Result<Vec<f64>> {
    args.iter()
        .map(|arg| {
            arg.parse::<f64>()
                .with_context(|| format!("scalar argument '{}' is not a number", arg))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 && args.len() < 4 {
        eprintln!("Usage: {} <config.yaml> [<module> <input.json> [scalar ...]]", args[0]);
        eprintln!("Example: {} configs/kernels.yaml", args[0]);
        eprintln!("Example: {} configs/kernels.yaml exp_avg range.json 0.5", args[0]);
        std::process::exit(1);
    }

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading configuration {}", args[1]))?;
    init_logging(&config.logging);

    let registry = Arc::new(ModuleRegistry::from_config(&config)?);

    println!("Kernel catalog ({} module(s)):", registry.len());
    for descriptor in registry.descriptors() {
        println!(
            "  {:<24} {:<7} {} scalars={}",
            descriptor.name,
            descriptor.input_kind,
            descriptor.element_type.as_str(),
            descriptor.scalar_args_count
        );
    }

    if args.len() == 2 {
        return Ok(());
    }

    let module_name = args[2].clone();
    let input = read_input(Path::new(&args[3]))?;
    let scalar_args = parse_scalars(&args[4..])?;

    let output = invoke_blocking(Arc::clone(&registry), module_name.clone(), input, scalar_args)
        .await
        .with_context(|| format!("invoking module '{}'", module_name))?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
