use serde::Serialize;
use tagform::handlers::{self, BlobHandler};
use tagform::Magic;
use tracing::debug;

use crate::cmd::{builtin_engine, read_input, write_output, PackArgs};
use crate::exit::{engine_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, print_pretty, print_table, OutputFormat};

#[derive(Serialize)]
struct PackOutput {
    schema_id: &'static str,
    magic: String,
    raw_size: usize,
    wire_size: usize,
    tag: Option<u32>,
    output: String,
}

pub fn run(args: PackArgs, format: OutputFormat) -> CliResult<i32> {
    let magic = Magic::new(&args.magic).map_err(|err| CliError::new(USAGE, err.to_string()))?;
    if !handlers::is_builtin(magic) {
        return Err(CliError::new(
            USAGE,
            format!(
                "unsupported magic {magic}; expected one of {}",
                handlers::builtin_magics().join(", ")
            ),
        ));
    }
    if args.tag.is_some() && magic.as_str() != handlers::BLOB_MAGIC {
        return Err(CliError::new(USAGE, "--tag is only supported for blob"));
    }

    let raw = read_input(&args.input)?;
    let mut engine = builtin_engine()?;

    let mut object = engine
        .pack(magic, &raw)
        .map_err(|err| engine_error("pack failed", err))?;
    if let Some(tag) = args.tag {
        if let Err(err) = BlobHandler::set_tag(&mut object, tag) {
            engine.destroy(object);
            return Err(CliError::new(USAGE, err.to_string()));
        }
    }

    let wire = engine.serialize(&object);
    engine.destroy(object);
    let wire = wire.map_err(|err| engine_error("serialize failed", err))?;

    write_output(&args.output, &wire)?;
    debug!(%magic, raw = raw.len(), wire = wire.len(), "packed");

    let out = PackOutput {
        schema_id: "https://schemas.tagform.dev/cli/v1/pack.schema.json",
        magic: magic.to_string(),
        raw_size: raw.len(),
        wire_size: wire.len(),
        tag: args.tag,
        output: args.output.display().to_string(),
    };
    print_pack(&out, format);
    Ok(SUCCESS)
}

fn print_pack(out: &PackOutput, format: OutputFormat) {
    let tag = out.tag.map_or_else(|| "-".to_string(), |tag| tag.to_string());
    let rows = [
        ("magic", out.magic.clone()),
        ("raw_size", out.raw_size.to_string()),
        ("wire_size", out.wire_size.to_string()),
        ("tag", tag),
        ("output", out.output.clone()),
    ];
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Pretty => print_pretty(&rows),
        OutputFormat::Raw => println!("{}", out.output),
    }
}
