mod generator;
mod live_keys;
mod workload;

use crate::workload::Workload;
use crate::workload::put_delete::PutDelete;
use crate::workload::put_only::PutOnly;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{SeedableRng, random};
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Generates random key-value workload traces, one operation per line.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    workload: WorkloadType,
}

#[derive(Subcommand)]
enum WorkloadType {
    /// Emit only `key=value` puts
    PutOnly {
        /// Number of put operations
        #[arg(short = 'n', long = "num", default_value = "10000")]
        num: u64,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Emit puts mixed with `\delete key` lines for previously put keys
    PutDelete {
        /// Total number of operations (puts + deletes)
        #[arg(short = 'n', long = "num", default_value = "10000")]
        num: u64,

        /// Fraction of operations that are deletes
        #[arg(long, default_value = "0.05")]
        delete_ratio: f64,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Seed for a reproducible trace
    #[arg(long)]
    seed: Option<u64>,

    /// Write the trace to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print a run summary to stderr
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Err(e) if is_broken_pipe(&e) => {
            debug!("output closed early, stopping");
            Ok(())
        }
        r => r,
    }
}

fn run(cli: Cli) -> Result<()> {
    let (wl, common) = get_wl(cli.workload);
    let seed = common.seed.unwrap_or_else(random);
    info!("starting {} with seed {}", wl.get_name(), seed);

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut out = open_output(common.output.as_deref())?;
    let stats = wl.exec(&mut rng, &mut out)?;
    info!(
        "{} done: {} puts, {} deletes, {} live keys, {} bytes",
        wl.get_name(),
        stats.puts(),
        stats.deletes(),
        stats.live_keys(),
        stats.bytes()
    );

    if common.stats {
        eprintln!("{}", stats);
    }
    Ok(())
}

fn get_wl(wl: WorkloadType) -> (Box<dyn Workload>, CommonArgs) {
    match wl {
        WorkloadType::PutOnly { num, common } => (Box::new(PutOnly::new(num)), common),
        WorkloadType::PutDelete {
            num,
            delete_ratio,
            common,
        } => (Box::new(PutDelete::new(num, delete_ratio)), common),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            debug!("writing trace to {}", p.display());
            let f = File::create(p).with_context(|| format!("creating {}", p.display()))?;
            Ok(Box::new(BufWriter::new(f)))
        }
        None => {
            debug!("writing trace to stdout");
            Ok(Box::new(BufWriter::new(io::stdout().lock())))
        }
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("kvtrace").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        match parse(&["put-only"]).unwrap().workload {
            WorkloadType::PutOnly { num, common } => {
                assert_eq!(num, 10_000);
                assert!(common.seed.is_none() && common.output.is_none() && !common.stats);
            }
            _ => panic!("wrong subcommand"),
        }
        match parse(&["put-delete"]).unwrap().workload {
            WorkloadType::PutDelete {
                num, delete_ratio, ..
            } => {
                assert_eq!(num, 10_000);
                assert_eq!(delete_ratio, 0.05);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn flags() {
        let cli = parse(&["put-delete", "-n", "42", "--delete-ratio", "0.5", "--seed", "9"]).unwrap();
        let WorkloadType::PutDelete {
            num,
            delete_ratio,
            common,
        } = cli.workload
        else {
            panic!("wrong subcommand");
        };
        assert_eq!((num, delete_ratio, common.seed), (42, 0.5, Some(9)));

        let cli = parse(&["put-only", "--num", "7", "-o", "trace.txt", "--stats"]).unwrap();
        let WorkloadType::PutOnly { num, common } = cli.workload else {
            panic!("wrong subcommand");
        };
        assert_eq!(num, 7);
        assert_eq!(common.output.as_deref(), Some(Path::new("trace.txt")));
        assert!(common.stats);
    }

    #[test]
    fn bad_args_are_rejected() {
        assert!(parse(&["put-only", "-n", "-5"]).is_err());
        assert!(parse(&["put-only", "-n", "ten"]).is_err());
        assert!(parse(&["put-only", "--delete-ratio", "0.1"]).is_err());
        assert!(parse(&["put-delete", "--delete-ratio", "lots"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn writes_trace_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        let path_str = path.to_str().unwrap();

        run(parse(&["put-delete", "-n", "500", "--seed", "17", "-o", path_str]).unwrap()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert_eq!(first.lines().count(), 500);

        run(parse(&["put-delete", "-n", "500", "--seed", "17", "-o", path_str]).unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn zero_ops_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        run(parse(&["put-only", "-n", "0", "-o", path.to_str().unwrap()]).unwrap()).unwrap();
        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn invalid_ratio_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        let cli = parse(&["put-delete", "--delete-ratio", "2", "-o", path.to_str().unwrap()]).unwrap();
        assert!(run(cli).is_err());
    }

    #[test]
    fn missing_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("trace.txt");
        let err = open_output(Some(&path)).err().unwrap();
        assert!(err.to_string().starts_with("creating "));
        assert!(!is_broken_pipe(&err));
    }

    #[test]
    fn broken_pipe_detection() {
        let e = anyhow::Error::from(io::Error::from(ErrorKind::BrokenPipe));
        assert!(is_broken_pipe(&e));
        assert!(!is_broken_pipe(&anyhow::anyhow!("other")));
    }
}
