use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use tagform::{handlers, Engine};

use crate::exit::{engine_error, io_error, CliResult};
use crate::output::OutputFormat;

pub mod envinfo;
pub mod inspect;
pub mod pack;
pub mod unpack;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack a raw file into a serialized object.
    Pack(PackArgs),
    /// Unpack a serialized object back to its raw bytes.
    Unpack(UnpackArgs),
    /// Describe a serialized object and verify it round-trips.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Pack(args) => pack::run(args, format),
        Command::Unpack(args) => unpack::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args, format),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Raw input file.
    pub input: PathBuf,
    /// Handler magic.
    #[arg(long, short = 'm', default_value = handlers::BLOB_MAGIC)]
    pub magic: String,
    /// Tag stored in the static fields (blob only).
    #[arg(long)]
    pub tag: Option<u32>,
    /// Output file for the serialized object.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Serialized object.
    pub input: PathBuf,
    /// Output file for the raw bytes. Default: stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Serialized object.
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

/// Initialized engine with every built-in handler registered.
pub fn builtin_engine() -> CliResult<Engine> {
    let mut engine = Engine::new();
    engine
        .init()
        .map_err(|err| engine_error("engine init failed", err))?;
    handlers::register_builtin(&mut engine)
        .map_err(|err| engine_error("handler registration failed", err))?;
    Ok(engine)
}

pub fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}

pub fn write_output(path: &Path, data: &[u8]) -> CliResult<()> {
    std::fs::write(path, data).map_err(|err| io_error(&format!("write {}", path.display()), err))
}
