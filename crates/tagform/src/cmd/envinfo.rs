use std::collections::BTreeMap;

use serde::Serialize;
use tagform::endian::{vectorized_path, ByteOrder};

use crate::cmd::version::active_features;
use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
    byte_order: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: &'static str,
    version: String,
    target: String,
    platform: PlatformInfo,
    vectorized_path: String,
    features: Vec<String>,
    handlers: Vec<String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut env = BTreeMap::new();
    env.insert("RUST_LOG".to_string(), std::env::var("RUST_LOG").ok());
    env.insert(
        "SOURCE_DATE_EPOCH".to_string(),
        std::env::var("SOURCE_DATE_EPOCH").ok(),
    );

    let output = EnvInfoOutput {
        schema_id: "https://schemas.tagform.dev/cli/v1/envinfo.schema.json",
        version: tagform::VERSION.to_string(),
        target: tagform::build_target().to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            byte_order: ByteOrder::native().to_string(),
        },
        vectorized_path: vectorized_path().to_string(),
        features: active_features().into_iter().map(String::from).collect(),
        handlers: tagform::handlers::builtin_magics()
            .into_iter()
            .map(String::from)
            .collect(),
        environment: env,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("tagform environment\n");
            println!("  Version:     {}", output.version);
            println!("  Target:      {}", output.target);
            println!(
                "  Platform:    {} ({})",
                output.platform.os, output.platform.arch
            );
            println!("  Byte order:  {}", output.platform.byte_order);
            println!("  Byte swap:   {}", output.vectorized_path);
            println!("  Features:    {}", output.features.join(", "));
            println!("  Handlers:    {}", output.handlers.join(", "));
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<20} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!("{}", output.platform.byte_order),
    }
}
