use tracing::debug;

use crate::cmd::{builtin_engine, read_input, write_output, UnpackArgs};
use crate::exit::{engine_error, CliResult, SUCCESS};
use crate::output::print_raw;

pub fn run(args: UnpackArgs) -> CliResult<i32> {
    let wire = read_input(&args.input)?;
    let mut engine = builtin_engine()?;

    let object = engine
        .unserialize(&wire)
        .map_err(|err| engine_error("unserialize failed", err))?;
    let raw = engine.unpack_to_vec(&object);
    let magic = object.magic();
    engine.destroy(object);
    let raw = raw.map_err(|err| engine_error("unpack failed", err))?;

    debug!(%magic, raw = raw.len(), "unpacked");
    match &args.output {
        Some(path) => write_output(path, &raw)?,
        None => print_raw(&raw),
    }
    Ok(SUCCESS)
}
