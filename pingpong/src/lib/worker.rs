use crate::layout::{ScalarSlot, SharedPair};
use crate::utils::*;

/// How many times a worker overwrites its target per run.
pub const INNER_LOOP_TRIALS: u32 = 1_000_000;

/// Upper bound (inclusive) of the values workers write.
pub const DRAW_MAX: i32 = 4096;

/// One worker's share of a run: waits on the latch it is handed, then
/// does its thing and reports a [`UselessResult`].
pub type Task<'a> = Box<dyn FnOnce(&ThreadLatch) -> UselessResult + Send + 'a>;

/// Anything that can be split into per-thread [`Task`]s, over and over.
///
/// The tasks borrow the workload, so the data outlives every run and is
/// built only once.
pub trait Workload {
    fn tasks(&mut self, threads: usize) -> Result<Vec<Task<'_>>>;
}

/// Index of the slot that worker `thread_index` hammers.
///
/// Workers take consecutive slots from the middle of the array onwards,
/// so with small slots they are bound to collide on a line.
#[inline]
pub fn target_slot(len: usize, thread_index: usize) -> usize {
    len / 2 + thread_index
}

/// Overwrites `slot` with random values, [`iterations`](INNER_LOOP_TRIALS)
/// times, as soon as the latch opens.
///
/// Returns the slot's final value.
pub fn sample_array<T: ScalarSlot>(
    latch:      &ThreadLatch,
    slot:       &mut T,
    iterations: u32,
) -> UselessResult {
    let mut rng = ChaCha8Rng::from_entropy();
    let dist = Uniform::new_inclusive(0, DRAW_MAX);

    latch.count_down_and_wait();

    for _ in 0..iterations {
        slot.store(dist.sample(&mut rng));
    }

    slot.load() as UselessResult
}

/// Overwrites both fields of the one pair every worker shares, as soon as
/// the latch opens.
///
/// Returns whatever the two fields add up to at the end, which depends on
/// who wrote last and is therefore meaningless.
pub fn sample_pair<P: SharedPair>(
    latch:      &ThreadLatch,
    pair:       &P,
    iterations: u32,
) -> UselessResult {
    let mut rng = ChaCha8Rng::from_entropy();
    let dist = Uniform::new_inclusive(0, DRAW_MAX);

    latch.count_down_and_wait();

    for _ in 0..iterations {
        let first = dist.sample(&mut rng);
        let second = dist.sample(&mut rng);
        pair.store(first, second);
    }

    pair.sum()
}

/// A large array of slots; every worker gets a slot of its own.
pub struct ArrayWorkload<T> {
    slots:      Vec<T>,
    iterations: u32,
}

impl<T: ScalarSlot> ArrayWorkload<T> {
    pub fn new(len: usize, iterations: u32) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| BenchError::Allocation {
                bytes: len.saturating_mul(size_of::<T>()),
            })?;
        slots.resize_with(len, T::default);

        Ok(Self { slots, iterations })
    }

    /// As many slots as fit in `bytes`.
    pub fn with_capacity_bytes(bytes: usize, iterations: u32) -> Result<Self> {
        Self::new(bytes / size_of::<T>(), iterations)
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }
}

impl<T: ScalarSlot> Workload for ArrayWorkload<T> {
    fn tasks(&mut self, threads: usize) -> Result<Vec<Task<'_>>> {
        if threads == 0 {
            return Err(BenchError::NoThreads);
        }
        let len = self.slots.len();
        let start = target_slot(len, 0);
        if start + threads > len {
            return Err(BenchError::NotEnoughSlots { len, threads });
        }
        let iterations = self.iterations;

        Ok(self.slots[start..start + threads]
            .iter_mut()
            .map(|slot| {
                Box::new(move |latch: &ThreadLatch| sample_array(latch, slot, iterations))
                    as Task<'_>
            })
            .collect())
    }
}

/// A single pair, shared by every worker.
pub struct PairWorkload<P> {
    pair:       P,
    iterations: u32,
}

impl<P: SharedPair> PairWorkload<P> {
    pub fn new(iterations: u32) -> Self {
        Self {
            pair: P::default(),
            iterations,
        }
    }

    pub fn pair(&self) -> &P {
        &self.pair
    }
}

impl<P: SharedPair> Workload for PairWorkload<P> {
    fn tasks(&mut self, threads: usize) -> Result<Vec<Task<'_>>> {
        if threads == 0 {
            return Err(BenchError::NoThreads);
        }
        let pair = &self.pair;
        let iterations = self.iterations;

        Ok((0..threads)
            .map(|_| {
                Box::new(move |latch: &ThreadLatch| sample_pair(latch, pair, iterations))
                    as Task<'_>
            })
            .collect())
    }
}
