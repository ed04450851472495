use crate::utils::*;
use crate::worker::Task;

/// Outcome of one orchestrated run.
#[derive(Clone, Copy, Debug)]
pub struct TrialResult {
    /// Wrapping sum of every worker's result.
    pub useless: UselessResult,
    /// From the latch opening until the last worker was joined.
    pub elapsed: ElapsedSecs,
    /// When the controller arrived at the latch. Every worker starts
    /// strictly after this.
    pub armed:   Instant,
}

/// Runs every task on its own thread, all of them released at once.
///
/// The caller acts as the extra latch participant and as the stopwatch:
/// the clock starts when the latch opens and stops after the last join.
///
/// If some thread cannot be launched, the latch is forced open so that
/// the ones already running can finish, and the run fails.
pub fn run_threads(tasks: Vec<Task<'_>>) -> Result<TrialResult> {
    let num_threads = tasks.len();
    if num_threads == 0 {
        return Err(BenchError::NoThreads);
    }
    let latch = ThreadLatch::new(num_threads + 1);

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(num_threads);
        for (index, task) in tasks.into_iter().enumerate() {
            let latch = &latch;
            let spawned = thread::Builder::new()
                .name(format!("pingpong-{}", index))
                .spawn_scoped(s, move || task(latch));
            match spawned {
                Ok(handle)  => handles.push(handle),
                Err(source) => {
                    warn!("Could not launch worker #{}: {}", index, source);
                    latch.release_all();
                    return Err(BenchError::Spawn { index, source });
                }
            }
        }

        let armed = Instant::now();
        latch.count_down_and_wait();
        let start = Instant::now();

        let joined: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join())
            .collect();
        let elapsed = start.elapsed().as_secs_f64();

        let mut useless: UselessResult = 0;
        for (index, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(res) => useless = useless.wrapping_add(res),
                Err(_)  => return Err(BenchError::WorkerPanicked { index }),
            }
        }

        Ok(TrialResult {
            useless,
            elapsed,
            armed,
        })
    })
}
