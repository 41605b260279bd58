//! Multi-threaded behavior of line records.
//!
//! These tests pair records in both orders from many threads at once; a
//! regression in the lock-pair protocol shows up as a blown time budget.

use probar_covdata::{
    CaseIndex, ConditionId, JumpRecord, LineNumber, LineRecord, PairLockConfig, SwitchId,
    SwitchRecord,
};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const LIVENESS_BUDGET: Duration = Duration::from_secs(60);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn record(line: u32) -> LineRecord {
    let record = LineRecord::new(LineNumber::new(line));
    let _ = record.register_jump(JumpRecord::new(ConditionId::new(0)));
    let _ = record.register_switch(SwitchRecord::new(SwitchId::new(0), 2));
    record
}

/// Small deterministic generator so pairings differ per thread
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// Run `work` on a helper thread and fail if it exceeds the budget
fn within_budget<F>(budget: Duration, work: F)
where
    F: FnOnce() + Send + 'static,
{
    let (done_tx, done_rx) = mpsc::channel();
    let _runner = thread::spawn(move || {
        work();
        let _ = done_tx.send(());
    });
    match done_rx.recv_timeout(budget) {
        Ok(()) => {}
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("work did not finish within {budget:?}, lock pairing deadlocked")
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => panic!("worker thread panicked"),
    }
}

/// 50 threads randomly merge and compare records from a pool of 5
#[test]
fn test_random_pairs_do_not_deadlock() {
    const THREADS: usize = 50;
    const POOL: usize = 5;
    const ROUNDS: usize = 400;

    init_tracing();

    let pool: Arc<Vec<LineRecord>> = Arc::new((0..POOL).map(|_| record(1)).collect());

    within_budget(LIVENESS_BUDGET, move || {
        let start = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let pool = Arc::clone(&pool);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    let mut rng = Lcg(t as u64 + 1);
                    start.wait();
                    for _ in 0..ROUNDS {
                        let a = rng.next(POOL);
                        let b = rng.next(POOL);
                        // Counters stay zero so repeated merges cannot overflow
                        if rng.next(2) == 0 {
                            pool[a].merge(&pool[b]);
                        } else {
                            let _ = pool[a].equals(&pool[b]);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}

/// Opposite-order pairing from many threads keeps exact totals
#[test]
fn test_concurrent_merges_keep_totals() {
    const PAIRS: usize = 4;
    const THREADS_PER_PAIR: usize = 8;
    const MERGES: u64 = 250;

    init_tracing();

    let targets: Arc<Vec<LineRecord>> = Arc::new((0..PAIRS).map(|_| record(7)).collect());
    let sources: Arc<Vec<LineRecord>> = Arc::new(
        (0..PAIRS)
            .map(|_| {
                let source = record(7);
                source.touch(1);
                source.touch_jump(ConditionId::new(0), true, 1).unwrap();
                source
                    .touch_switch(SwitchId::new(0), CaseIndex::Default, 1)
                    .unwrap();
                source
            })
            .collect(),
    );

    let check_targets = Arc::clone(&targets);
    let config = PairLockConfig::builder()
        .spin_limit(2)
        .yield_limit(8)
        .sleep(Duration::from_micros(10))
        .build();

    within_budget(LIVENESS_BUDGET, move || {
        let mut handles = Vec::new();
        for pair in 0..PAIRS {
            for worker in 0..THREADS_PER_PAIR {
                let targets = Arc::clone(&targets);
                let sources = Arc::clone(&sources);
                let config = config.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MERGES {
                        targets[pair].merge_with(&sources[pair], &config);
                        // Lock the pair the other way round as well
                        if worker % 2 == 0 {
                            let _ = sources[pair].equals_with(&targets[pair], &config);
                        }
                    }
                }));
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }
    });

    let expected = THREADS_PER_PAIR as u64 * MERGES;
    for target in check_targets.iter() {
        assert_eq!(target.hits(), expected);
        assert_eq!(
            target.jump(ConditionId::new(0)).unwrap().true_hits(),
            expected
        );
        assert_eq!(
            target.switch(SwitchId::new(0)).unwrap().default_hits(),
            expected
        );
    }
}

/// Racing registrations of one id yield a single canonical record
#[test]
fn test_concurrent_registration_is_idempotent() {
    const THREADS: usize = 32;

    init_tracing();

    let line = Arc::new(LineRecord::new(LineNumber::new(3)));
    let start = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let line = Arc::clone(&line);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let canonical = line.register_jump(JumpRecord::new(ConditionId::new(9)));
                canonical.touch(true, 1);
                canonical
            })
        })
        .collect();

    let canonicals: Vec<Arc<JumpRecord>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(line.jump_count(), 1);
    let registered = line.jump(ConditionId::new(9)).unwrap();
    assert!(canonicals.iter().all(|c| Arc::ptr_eq(c, &registered)));
    assert_eq!(registered.true_hits(), THREADS as u64);
}

/// Concurrent touches lose no updates
#[test]
fn test_concurrent_touches_sum_exactly() {
    const THREADS: u64 = 16;
    const TOUCHES: u64 = 5_000;

    init_tracing();

    let line = Arc::new(record(11));
    let start_time = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let line = Arc::clone(&line);
            thread::spawn(move || {
                for i in 0..TOUCHES {
                    line.touch(1);
                    line.touch_jump(ConditionId::new(0), (i + t) % 2 == 0, 2)
                        .unwrap();
                    line.touch_switch(SwitchId::new(0), CaseIndex::Case((i % 2) as u32), 1)
                        .unwrap();
                    if i % 500 == 0 {
                        // Queries interleave with lock-free touches
                        let _ = line.is_covered();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = THREADS * TOUCHES;
    let jump = line.jump(ConditionId::new(0)).unwrap();
    let snapshot = line.switch(SwitchId::new(0)).unwrap().snapshot();

    assert_eq!(line.hits(), total);
    assert_eq!(jump.true_hits() + jump.false_hits(), total * 2);
    assert_eq!(snapshot.case_hits.iter().sum::<u64>(), total);
    assert_eq!(line.covered_branch_count(), 4);
    assert!(start_time.elapsed() < LIVENESS_BUDGET);
}
