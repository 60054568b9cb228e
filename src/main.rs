use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildarch::blueprint::Blueprint;
use buildarch::build::{build, Order};
use buildarch::csp::matcher::CspMatcher;
use buildarch::draw;
use buildarch::render;
use buildarch::rules::catalogue;

/// Generate a 2-D floorplan from declarative blueprints and print it.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Blueprint files; the first describes the floorplan, any further ones
    /// describe required features.
    #[arg(required = true)]
    blueprints: Vec<PathBuf>,

    /// Try derivations in a seeded random order instead of lexicographically.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut bps = Vec::with_capacity(args.blueprints.len());
    for path in &args.blueprints {
        let data =
            fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let bp = Blueprint::parse(&data)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        bps.push(bp);
    }

    let order = match args.seed {
        Some(seed) => Order::Shuffled(seed),
        None => Order::Lexicographic,
    };
    let graph = build(&bps, &CspMatcher::new(), &catalogue::standard(), order)?;
    let tiles = draw::rasterise(&graph)?;
    render::terminal(&mut io::stdout().lock(), &tiles)?;
    Ok(())
}
