use std::io::stdout;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;
use witness_solver::{
    api::{solve_with_config, BytecodeFormat, SolverConfig},
    loader::{load_bytecode, load_witness, write_witness},
};

const USAGE: &str = "usage: wsolve <bytecode> <witness.json> [--raw] [--threads N]";

struct Args {
    bytecode: PathBuf,
    witness: PathBuf,
    config: SolverConfig,
}

/// Returns `None` when usage was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut paths = vec![];
    let mut config = SolverConfig::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--raw" => config = config.with_format(BytecodeFormat::Raw),
            "--threads" => {
                let n = args.next().context("--threads needs a value")?;
                config = config.with_threads(n.parse().context("invalid thread count")?);
            }
            "-h" | "--help" => return Ok(None),
            flag if flag.starts_with("--") => bail!("unknown flag `{flag}`\n{USAGE}"),
            _ => paths.push(PathBuf::from(&arg)),
        }
    }
    let [bytecode, witness]: [PathBuf; 2] = paths
        .try_into()
        .map_err(|_| anyhow::anyhow!(USAGE))?;
    Ok(Some(Args {
        bytecode,
        witness,
        config,
    }))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };
    let bytecode = load_bytecode(&args.bytecode)
        .with_context(|| format!("reading bytecode from {}", args.bytecode.display()))?;
    let witness = load_witness(&args.witness)
        .with_context(|| format!("reading witness from {}", args.witness.display()))?;

    let solved = solve_with_config(&bytecode, witness, &args.config)
        .with_context(|| format!("solving {}", args.bytecode.display()))?;
    write_witness(&solved, stdout().lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(parse(&["--help"]).unwrap().is_none());
        assert!(parse(&["circuit.gz", "-h"]).unwrap().is_none());
    }

    #[test]
    fn test_parse_paths_and_flags() {
        let args = parse(&["circuit.bin", "witness.json", "--raw", "--threads", "3"])
            .unwrap()
            .unwrap();
        assert_eq!(args.bytecode, PathBuf::from("circuit.bin"));
        assert_eq!(args.witness, PathBuf::from("witness.json"));
        assert_eq!(args.config.format, BytecodeFormat::Raw);
        assert_eq!(args.config.threads, Some(3));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["circuit.gz"]).is_err());
        assert!(parse(&["a", "b", "--verbose"]).is_err());
        assert!(parse(&["a", "b", "--threads", "many"]).is_err());
    }
}
