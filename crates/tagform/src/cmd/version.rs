use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    version_id: u64,
    buildtime: u64,
    target: &'static str,
    target_os: &'static str,
    target_arch: &'static str,
    features: Vec<&'static str>,
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("tagform {}", tagform::VERSION);
        return Ok(SUCCESS);
    }

    let out = VersionOutput {
        name: "tagform",
        version: tagform::VERSION,
        version_id: tagform::version_id(),
        buildtime: tagform::buildtime(),
        target: tagform::build_target(),
        target_os: std::env::consts::OS,
        target_arch: std::env::consts::ARCH,
        features: active_features(),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        _ => {
            println!("name: {}", out.name);
            println!("version: {}", out.version);
            println!("version_id: {}", out.version_id);
            println!("buildtime: {}", out.buildtime);
            println!("target: {}", out.target);
            println!("target_os: {}", out.target_os);
            println!("target_arch: {}", out.target_arch);
            println!("features: {}", out.features.join(", "));
        }
    }
    Ok(SUCCESS)
}

pub fn active_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if cfg!(feature = "handlers") {
        features.push("handlers");
    }
    if cfg!(feature = "simd") {
        features.push("simd");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    features
}
