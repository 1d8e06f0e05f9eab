mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tagform", version, about = "Tagged binary object CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). A non-empty RUST_LOG takes precedence.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pack_subcommand() {
        let args = ["tagform", "pack", "in", "-m", "wd32", "-o", "out"];
        let cli = Cli::try_parse_from(args).expect("pack args should parse");

        match cli.command {
            Command::Pack(args) => {
                assert_eq!(args.magic, "wd32");
                assert_eq!(args.tag, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn pack_defaults_to_blob() {
        let cli = Cli::try_parse_from(["tagform", "pack", "in", "--tag", "9", "-o", "out"])
            .expect("pack args should parse");
        assert!(matches!(
            cli.command,
            Command::Pack(ref args) if args.magic == "blob" && args.tag == Some(9)
        ));
    }

    #[test]
    fn pack_requires_output() {
        let err = Cli::try_parse_from(["tagform", "pack", "in"])
            .expect_err("missing output should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tagform", "inspect", "obj.tf", "--format", "json"])
            .expect("inspect args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Inspect(_)));
    }
}
