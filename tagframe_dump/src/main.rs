use anyhow::{anyhow, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tagframe_dump::{dump, render_tree, DumpConfig};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: tagframe_dump <path> [--tree]";

struct Args {
    path: PathBuf,
    tree: bool,
}

fn parse_args() -> Result<Args> {
    let mut path = None;
    let mut tree = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--tree" => tree = true,
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => return Err(anyhow!("unexpected argument {arg:?}\n{USAGE}")),
        }
    }
    let path = path.ok_or_else(|| anyhow!(USAGE))?;
    Ok(Args { path, tree })
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = DumpConfig::from_env()?;
    let buf = fs::read(&args.path)?;
    tracing::debug!(path = ?args.path, len = buf.len(), "loaded stream");

    let stats = dump(&buf, &config)?;
    println!("{stats}");
    if args.tree {
        println!();
        println!("{}", render_tree(&buf, &config)?);
    }
    stats.verify()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tagframe_dump: {e:#}");
            ExitCode::FAILURE
        }
    }
}
