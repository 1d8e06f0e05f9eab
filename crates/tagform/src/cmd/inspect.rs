use serde::Serialize;
use tagform::{handlers, peek_header, Engine, HEADER_SIZE};
use tracing::warn;

use crate::cmd::{builtin_engine, read_input, InspectArgs};
use crate::exit::{engine_error, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::output::{hex, print_json, print_pretty, print_table, OutputFormat};

#[derive(Serialize)]
struct InspectOutput {
    schema_id: &'static str,
    magic: String,
    magic_valid: bool,
    builtin: bool,
    header_size: usize,
    static_fields_size: usize,
    static_fields: String,
    payload_size: usize,
    total_size: usize,
    raw_size: Option<usize>,
    round_trip: Option<bool>,
    error: Option<String>,
}

/// Result of decoding a buffer with a built-in handler.
struct Verification {
    raw_size: usize,
    identical: bool,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let view = peek_header(&wire).map_err(|err| engine_error("invalid header", err))?;

    let magic = view.magic().ok();
    let builtin = magic.is_some_and(handlers::is_builtin);

    let mut out = InspectOutput {
        schema_id: "https://schemas.tagform.dev/cli/v1/inspect.schema.json",
        magic: String::from_utf8_lossy(view.raw_magic()).into_owned(),
        magic_valid: magic.is_some(),
        builtin,
        header_size: HEADER_SIZE,
        static_fields_size: view.static_fields().len(),
        static_fields: hex(view.static_fields()),
        payload_size: view.payload().len(),
        total_size: wire.len(),
        raw_size: None,
        round_trip: None,
        error: None,
    };

    let mut code = SUCCESS;
    if builtin {
        let mut engine = builtin_engine()?;
        match verify(&mut engine, &wire) {
            Ok(check) => {
                out.raw_size = Some(check.raw_size);
                out.round_trip = Some(check.identical);
                if !check.identical {
                    warn!(magic = %out.magic, "re-serialized object differs from input");
                    code = FAILURE;
                }
            }
            Err(err) => {
                out.round_trip = Some(false);
                out.error = Some(err.to_string());
                code = DATA_INVALID;
            }
        }
    }

    print_inspect(&out, format);
    Ok(code)
}

fn verify(engine: &mut Engine, wire: &[u8]) -> tagform::Result<Verification> {
    let object = engine.unserialize(wire)?;
    let checked = engine.unpack_size(&object).and_then(|raw_size| {
        let again = engine.serialize(&object)?;
        Ok(Verification {
            raw_size,
            identical: again.as_ref() == wire,
        })
    });
    engine.destroy(object);
    checked
}

fn print_inspect(out: &InspectOutput, format: OutputFormat) {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    let round_trip = out.round_trip.map(|ok| ok.to_string());
    let rows = [
        ("magic", out.magic.clone()),
        ("magic_valid", out.magic_valid.to_string()),
        ("builtin", out.builtin.to_string()),
        ("static_fields_size", out.static_fields_size.to_string()),
        ("static_fields", out.static_fields.clone()),
        ("payload_size", out.payload_size.to_string()),
        ("total_size", out.total_size.to_string()),
        ("raw_size", optional(out.raw_size.map(|n| n.to_string()))),
        ("round_trip", optional(round_trip)),
        ("error", optional(out.error.clone())),
    ];
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Pretty => print_pretty(&rows),
        OutputFormat::Raw => println!("{}", out.magic),
    }
}
