use crate::utils::*;
use crate::worker::Workload;

/// How many orchestrated runs make up one average.
pub const TIMING_TRIALS_TO_COMPUTE_AVERAGE: u32 = 100;

/// Mean of a stream of samples, kept in constant space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningAverage {
    avg:     f64,
    samples: u32,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: f64) {
        let k = self.samples as f64;
        self.avg = (self.avg * k + sample) / (k + 1.0);
        self.samples += 1;
    }

    pub fn value(&self) -> f64 {
        self.avg
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }
}

/// What a full series of runs against one variant boils down to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub avg_secs: ElapsedSecs,
    /// Wrapping sum of every run's [`TrialResult::useless`].
    pub useless:  UselessResult,
    pub trials:   u32,
}

/// Runs `workload` on `threads` threads, `trials` times over, and
/// averages the elapsed times.
///
/// Nothing is printed here; per-run timings only go to the debug log.
pub fn run_tests<W: Workload>(
    workload: &mut W,
    threads:  usize,
    trials:   u32,
) -> Result<Summary> {
    let mut useless: UselessResult = 0;
    let mut avg = RunningAverage::new();
    for trial in 0..trials {
        let res = run_threads(workload.tasks(threads)?)?;
        debug!("Trial {}/{}: {:.6} s", trial + 1, trials, res.elapsed);
        useless = useless.wrapping_add(res.useless);
        avg.push(res.elapsed);
    }

    Ok(Summary {
        avg_secs: avg.value(),
        useless,
        trials:   avg.samples(),
    })
}
