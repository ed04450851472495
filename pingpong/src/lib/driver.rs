use std::num::NonZeroUsize;

use crate::interference::{detect_line_size, InterferenceSizes};
use crate::layout::{AlignedScalar, NaiveScalar, PackedPair, SpreadPair, Variant};
use crate::trials::{run_tests, Summary, TIMING_TRIALS_TO_COMPUTE_AVERAGE};
use crate::utils::*;
use crate::worker::{ArrayWorkload, PairWorkload, INNER_LOOP_TRIALS};

/// Backing storage for each of the scalar arrays: 256 MiB.
pub const BACKING_BUFFER_BYTES: usize = 1 << 28;

/// Threads the machine can run at once. Falls back to 1 if it won't say.
pub fn hardware_concurrency() -> usize {
    match thread::available_parallelism() {
        Ok(n)  => n.get(),
        Err(e) => {
            warn!("Could not query hardware concurrency ({}); using a single worker", e);
            NonZeroUsize::MIN.get()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchConfig {
    pub trials:       u32,
    pub iterations:   u32,
    pub buffer_bytes: usize,
    pub threads:      usize,
    pub sizes:        InterferenceSizes,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials:       TIMING_TRIALS_TO_COMPUTE_AVERAGE,
            iterations:   INNER_LOOP_TRIALS,
            buffer_bytes: BACKING_BUFFER_BYTES,
            threads:      hardware_concurrency(),
            sizes:        InterferenceSizes::default(),
        }
    }
}

/// Compares the compile-time interference sizes with the machine's and
/// logs whatever does not add up.
pub fn check_host(sizes: &InterferenceSizes) {
    match detect_line_size() {
        Some(line) => {
            info!("Detected {}-byte cache lines", line);
            for m in sizes.check_against(line) {
                warn!("{}", m);
            }
        },
        None => {
            warn!(
                "Cache line size unknown; assuming {} bytes destructive, {} bytes constructive",
                sizes.destructive, sizes.constructive
            );
        }
    }
}

/// Samples one variant from scratch. Its data lives exactly as long as
/// this call.
pub fn run_variant(variant: Variant, cfg: &BenchConfig) -> Result<Summary> {
    match variant {
        Variant::Naive => {
            let mut w = ArrayWorkload::<NaiveScalar>::with_capacity_bytes(cfg.buffer_bytes, cfg.iterations)?;
            run_tests(&mut w, cfg.threads, cfg.trials)
        },
        Variant::Aligned => {
            let mut w = ArrayWorkload::<AlignedScalar>::with_capacity_bytes(cfg.buffer_bytes, cfg.iterations)?;
            run_tests(&mut w, cfg.threads, cfg.trials)
        },
        Variant::Spread => {
            let mut w = PairWorkload::<SpreadPair>::new(cfg.iterations);
            run_tests(&mut w, cfg.threads, cfg.trials)
        },
        Variant::Packed => {
            let mut w = PairWorkload::<PackedPair>::new(cfg.iterations);
            run_tests(&mut w, cfg.threads, cfg.trials)
        },
    }
}

/// The whole experiment: report the machine and every layout, then
/// sample `variants` in order, writing the report to `out`.
pub fn drive<W: Write>(
    cfg:      &BenchConfig,
    variants: &[Variant],
    out:      &mut W,
) -> Result<Vec<(Variant, Summary)>> {
    check_host(&cfg.sizes);
    writeln!(out, "Hardware concurrency: {}", cfg.threads)?;
    for v in Variant::ALL {
        let info = v.info();
        writeln!(out, "sizeof({}): {}", info.name, info.size)?;
        writeln!(out, "alignof({}): {}", info.name, info.align)?;
    }

    let mut res = Vec::with_capacity(variants.len());
    for &v in variants {
        writeln!(out, "Running {} test.", v.info().name)?;
        out.flush()?;
        let summary = run_variant(v, cfg)?;
        writeln!(
            out,
            "Average time: {} seconds, useless result: {}",
            summary.avg_secs, summary.useless
        )?;
        res.push((v, summary));
    }

    Ok(res)
}
