use std::io;

use clap::Parser;
use env_logger::Env;
use pingpong::driver::{drive, BenchConfig};
use pingpong::layout::Variant;

/// Times false and true sharing of cache lines across all cores.
///
/// With no arguments, samples the four layouts with the stock settings.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Runs averaged per layout
    #[arg(long)]
    trials:     Option<u32>,

    /// Writes per worker per run
    #[arg(long)]
    iterations: Option<u32>,

    /// Worker threads [default: hardware concurrency]
    #[arg(long, value_parser = clap::value_parser!(usize))]
    threads:    Option<usize>,

    /// Backing storage per scalar array, in MiB
    #[arg(long)]
    buffer_mib: Option<usize>,

    /// Layouts to sample, in order [default: all four]
    #[arg(long, value_enum)]
    variant:    Vec<Variant>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Args::parse();

    let mut cfg = BenchConfig::default();
    if let Some(t) = cli.trials {
        cfg.trials = t;
    }
    if let Some(i) = cli.iterations {
        cfg.iterations = i;
    }
    if let Some(t) = cli.threads {
        cfg.threads = t;
    }
    if let Some(mib) = cli.buffer_mib {
        cfg.buffer_bytes = mib << 20;
    }
    let variants = if cli.variant.is_empty() {
        Variant::ALL.to_vec()
    } else {
        cli.variant
    };

    let stdout = io::stdout();
    drive(&cfg, &variants, &mut stdout.lock())?;

    Ok(())
}
