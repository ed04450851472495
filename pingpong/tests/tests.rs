use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use pingpong::driver::{drive, run_variant, BenchConfig};
use pingpong::interference::{CONSTRUCTIVE_INTERFERENCE_SIZE, DESTRUCTIVE_INTERFERENCE_SIZE};
use pingpong::layout::*;
use pingpong::trials::run_tests;
use pingpong::worker::*;
use pingpong::*;

// Short enough to keep the suite quick, long enough for the
// workers to actually overlap.
const FEW_ITERATIONS: u32 = 10_000;

fn max_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn tiny_config(threads: usize) -> BenchConfig {
    BenchConfig {
        trials:       2,
        iterations:   FEW_ITERATIONS,
        buffer_bytes: 1 << 16,
        threads,
        ..BenchConfig::default()
    }
}

#[test]
fn layouts_honor_interference_sizes() {
    assert!(Variant::Naive.info().align < DESTRUCTIVE_INTERFERENCE_SIZE);
    assert_eq!(Variant::Aligned.info().align, DESTRUCTIVE_INTERFERENCE_SIZE);
    assert!(Variant::Spread.info().size > CONSTRUCTIVE_INTERFERENCE_SIZE);
    assert!(Variant::Packed.info().size <= CONSTRUCTIVE_INTERFERENCE_SIZE);
}

#[test]
fn aligned_neighbours_sit_on_different_lines() {
    let slots = [AlignedScalar::default(), AlignedScalar::default()];
    let a = &slots[0] as *const AlignedScalar as usize;
    let b = &slots[1] as *const AlignedScalar as usize;
    assert_eq!(a % DESTRUCTIVE_INTERFERENCE_SIZE, 0);
    assert!(b - a >= DESTRUCTIVE_INTERFERENCE_SIZE);
}

#[test]
fn naive_neighbours_are_packed() {
    let slots = [NaiveScalar::default(), NaiveScalar::default()];
    let a = &slots[0] as *const NaiveScalar as usize;
    let b = &slots[1] as *const NaiveScalar as usize;
    assert_eq!(b - a, std::mem::size_of::<i32>());
}

#[test]
fn variant_order_and_names() {
    let names: Vec<_> = Variant::ALL.iter().map(|v| v.info().name).collect();
    assert_eq!(names, ["NaiveScalar", "AlignedScalar", "SpreadPair", "PackedPair"]);
}

#[test]
fn latch_releases_only_when_everyone_arrived() {
    const PARTICIPANTS: usize = 8;
    let latch = ThreadLatch::new(PARTICIPANTS);
    let arrived = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..PARTICIPANTS {
            s.spawn(|| {
                arrived.fetch_add(1, Ordering::SeqCst);
                latch.count_down_and_wait();
                assert_eq!(arrived.load(Ordering::SeqCst), PARTICIPANTS);
            });
        }
    });
    assert_eq!(latch.remaining(), 0);
}

#[test]
fn single_participant_latch_does_not_block() {
    let latch = ThreadLatch::new(1);
    latch.count_down_and_wait();
    assert_eq!(latch.remaining(), 0);
}

#[test]
fn forced_release_frees_waiters() {
    let latch = ThreadLatch::new(3);
    thread::scope(|s| {
        let waiter = s.spawn(|| latch.count_down_and_wait());
        while latch.remaining() != 2 {
            thread::yield_now();
        }
        latch.release_all();
        waiter.join().unwrap();
    });
    assert_eq!(latch.remaining(), 0);
}

#[test]
fn array_worker_returns_its_slot() {
    let latch = ThreadLatch::new(1);
    let mut slot = NaiveScalar::default();
    let res = sample_array(&latch, &mut slot, FEW_ITERATIONS);
    assert_eq!(res, slot.load() as UselessResult);
    assert!((0..=DRAW_MAX).contains(&slot.load()));
}

#[test]
fn array_workers_sum_their_slots() {
    for threads in 1..=max_threads() {
        let mut w = ArrayWorkload::<NaiveScalar>::new(2 * threads, FEW_ITERATIONS).unwrap();
        let res = run_threads(w.tasks(threads).unwrap()).unwrap();

        let start = target_slot(w.slots().len(), 0);
        let expected = w.slots()[start..start + threads]
            .iter()
            .fold(0 as UselessResult, |acc, s| acc.wrapping_add(s.load() as UselessResult));
        assert_eq!(res.useless, expected, "{} threads", threads);
        assert!(res.elapsed >= 0.0);
    }
}

#[test]
fn array_workers_leave_other_slots_alone() {
    let threads = 2;
    let mut w = ArrayWorkload::<AlignedScalar>::new(16, FEW_ITERATIONS).unwrap();
    run_threads(w.tasks(threads).unwrap()).unwrap();
    for (idx, s) in w.slots().iter().enumerate() {
        if idx < target_slot(16, 0) || idx >= target_slot(16, threads) {
            assert_eq!(s.load(), 0, "slot {}", idx);
        }
    }
}

#[test]
fn short_array_is_rejected() {
    let mut w = ArrayWorkload::<AlignedScalar>::new(4, FEW_ITERATIONS).unwrap();
    match w.tasks(4) {
        Err(BenchError::NotEnoughSlots { len, threads }) => {
            assert_eq!((len, threads), (4, 4));
        },
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("4 slots cannot host 4 workers past the middle"),
    };
}

#[test]
fn zero_threads_is_rejected() {
    let mut w = PairWorkload::<PackedPair>::new(FEW_ITERATIONS);
    assert!(matches!(w.tasks(0), Err(BenchError::NoThreads)));
    assert!(matches!(run_threads(vec![]), Err(BenchError::NoThreads)));
}

#[test]
fn backing_buffer_is_sized_in_bytes() {
    let w = ArrayWorkload::<AlignedScalar>::with_capacity_bytes(1 << 16, 1).unwrap();
    assert_eq!(w.slots().len(), (1 << 16) / Variant::Aligned.info().size);
    let w = ArrayWorkload::<NaiveScalar>::with_capacity_bytes(1 << 16, 1).unwrap();
    assert_eq!(w.slots().len(), (1 << 16) / 4);
}

#[test]
fn pair_workers_always_finish() {
    for threads in 1..=4 {
        let mut spread = PairWorkload::<SpreadPair>::new(FEW_ITERATIONS);
        let res = run_threads(spread.tasks(threads).unwrap()).unwrap();
        assert!(res.useless as usize <= 2 * DRAW_MAX as usize * threads);

        let mut packed = PairWorkload::<PackedPair>::new(FEW_ITERATIONS);
        let res = run_threads(packed.tasks(threads).unwrap()).unwrap();
        assert!(res.useless as usize <= 2 * DRAW_MAX as usize * threads);
        assert!(packed.pair().sum() <= 2 * DRAW_MAX as UselessResult);
    }
}

#[test]
fn workers_start_together() {
    let mut slots = [AlignedScalar::default(); 4];
    let stamps = Mutex::new(Vec::with_capacity(slots.len()));

    let tasks: Vec<Task<'_>> = slots
        .iter_mut()
        .map(|slot| {
            let stamps = &stamps;
            Box::new(move |latch: &ThreadLatch| {
                latch.count_down_and_wait();
                stamps.lock().unwrap().push(Instant::now());
                for v in 0..FEW_ITERATIONS as i32 {
                    slot.store(v);
                }
                slot.load() as UselessResult
            }) as Task<'_>
        })
        .collect();
    let res = run_threads(tasks).unwrap();

    let stamps = stamps.into_inner().unwrap();
    assert_eq!(stamps.len(), 4);
    assert!(stamps.iter().all(|t| *t > res.armed));
    let first = stamps.iter().min().unwrap();
    let last = stamps.iter().max().unwrap();
    assert!(*last - *first < Duration::from_millis(500));
    assert_eq!(res.useless, 4 * (FEW_ITERATIONS - 1));
}

#[test]
fn panicking_worker_fails_the_run() {
    let mut tasks: Vec<Task<'_>> = Vec::new();
    tasks.push(Box::new(|latch: &ThreadLatch| -> UselessResult {
        latch.count_down_and_wait();
        1
    }));
    tasks.push(Box::new(|latch: &ThreadLatch| -> UselessResult {
        latch.count_down_and_wait();
        panic!("worker gave up");
    }));
    assert!(matches!(
        run_threads(tasks),
        Err(BenchError::WorkerPanicked { index: 1 })
    ));
}

#[test]
fn trial_runner_counts_every_run() {
    let mut w = PairWorkload::<PackedPair>::new(FEW_ITERATIONS);
    let summary = run_tests(&mut w, 2, 3).unwrap();
    assert_eq!(summary.trials, 3);
    assert!(summary.avg_secs >= 0.0);
}

#[test]
fn every_variant_runs() {
    let cfg = tiny_config(2);
    for v in Variant::ALL {
        let summary = run_variant(v, &cfg).unwrap();
        assert_eq!(summary.trials, cfg.trials, "{:?}", v);
    }
}

#[test]
fn driver_reports_everything() {
    let cfg = tiny_config(2);
    let mut out = Vec::new();
    let res = drive(&cfg, &Variant::ALL, &mut out).unwrap();
    assert_eq!(res.len(), 4);

    let report = String::from_utf8(out).unwrap();
    let lines: Vec<_> = report.lines().collect();
    assert_eq!(lines[0], "Hardware concurrency: 2");
    assert_eq!(lines.len(), 1 + 2 * 4 + 2 * 4);
    for v in Variant::ALL {
        let info = v.info();
        assert!(lines.contains(&format!("sizeof({}): {}", info.name, info.size).as_str()));
        assert!(lines.contains(&format!("alignof({}): {}", info.name, info.align).as_str()));
        assert!(lines.contains(&format!("Running {} test.", info.name).as_str()));
    }
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("Average time: ")).count(),
        4
    );
}

#[test]
fn driver_respects_variant_selection() {
    let cfg = tiny_config(1);
    let mut out = Vec::new();
    let res = drive(&cfg, &[Variant::Packed], &mut out).unwrap();
    assert_eq!(res.len(), 1);
    assert_eq!(res[0].0, Variant::Packed);

    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Running PackedPair test."));
    assert!(!report.contains("Running NaiveScalar test."));
}
