pub use std::{
    io::{self, Write},
    mem::{align_of, size_of},
    ptr,
    sync::{
        atomic::{AtomicI32, Ordering},
        Condvar, Mutex, PoisonError,
    },
    thread,
    time::Instant,
};
pub use log::{debug, info, warn};
pub use rand::{
    distributions::{Distribution, Uniform},
    SeedableRng,
};
pub use rand_chacha::ChaCha8Rng;
pub use thiserror::Error;

pub use crate::{
    latch::ThreadLatch,
    orchestrate::{run_threads, TrialResult},
};

/// What every worker hands back. The number itself means nothing: it
/// exists so that the compiler cannot prove the sampled writes dead.
///
/// Sums of these wrap, just like the unsigned arithmetic they stand for.
pub type UselessResult = u32;

/// Wall-clock duration of one orchestrated run.
pub type ElapsedSecs = f64;

pub type Result<T, E = BenchError> = std::result::Result<T, E>;

/// Every way a benchmark run can go wrong. None of them is recoverable:
/// the binary stops at the first one and prints no partial report.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("could not reserve {bytes} bytes of backing storage")]
    Allocation {
        bytes: usize,
    },
    #[error("failed to launch worker thread #{index}")]
    Spawn {
        index:  usize,
        #[source]
        source: io::Error,
    },
    #[error("worker thread #{index} panicked")]
    WorkerPanicked {
        index: usize,
    },
    #[error("array of {len} slots cannot host {threads} workers in its upper half")]
    NotEnoughSlots {
        len:     usize,
        threads: usize,
    },
    #[error("a run needs at least one worker thread")]
    NoThreads,
    #[error("failed to write the report")]
    Report(#[from] io::Error),
}
