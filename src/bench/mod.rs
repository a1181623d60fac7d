//! # Contention bench
//!
//! `workers` threads share one counter behind the locker under test. Each of them
//! `iterations` times takes the lock, bumps the counter, optionally sleeps for `hold`
//! inside the critical section and lets go.
//!
//! Wall-clock tells how long the job took, CPU time (user + system) tells how much
//! of the machine it cost. Spinning shows up as CPU time well above the useful work,
//! sleeping in the kernel doesn't.
//!
//! A run is also a correctness check: the counter must end at `workers * iterations`
//! and no two workers may ever be inside at once.

use std::{
    error::Error,
    fmt,
    sync::atomic::{AtomicUsize, Ordering::Relaxed},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    locker::{AnyLocker, Kind, LockError, Locker, Stats},
    mutex::Mutex,
};

pub mod cpu;

pub use cpu::CpuTime;

/// one bench run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workload {
    pub kind: Kind,
    pub workers: usize,
    pub iterations: usize,
    pub hold: Duration,
    pub spin_limit: usize,
}

impl Workload {
    /// saturates instead of wrapping, nobody gets that far anyway
    pub fn expected(&self) -> u64 {
        (self.workers as u64).saturating_mul(self.iterations as u64)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Report {
    pub workload: Workload,
    pub wall: Duration,
    /// `None` where the OS won't tell
    pub cpu: Option<CpuTime>,
    pub counter: u64,
    pub stats: Stats,
}

impl Report {
    /// how many cores were busy on average
    pub fn cpu_per_wall(&self) -> Option<f64> {
        let wall = self.wall.as_secs_f64();
        self.cpu
            .filter(|_| wall > 0.0)
            .map(|cpu| cpu.total().as_secs_f64() / wall)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = &self.workload;
        write!(
            f,
            "{:<15} workers={} iterations={} hold={:?} wall={:.3?}",
            w.kind.to_string(),
            w.workers,
            w.iterations,
            w.hold,
            self.wall
        )?;
        match (self.cpu, self.cpu_per_wall()) {
            (Some(cpu), Some(ratio)) => write!(
                f,
                " user={:.3?} sys={:.3?} cpu/wall={ratio:.2}",
                cpu.user, cpu.system
            )?,
            _ => write!(f, " cpu=n/a")?,
        }
        if !w.kind.spins() {
            write!(
                f,
                " waits={} wakes={} spins={}",
                self.stats.waits, self.stats.wakes, self.stats.spins
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    Lock(LockError),
    /// the counter doesn't add up => the lock let two workers in
    LostUpdates { expected: u64, actual: u64 },
    /// times a worker found somebody else inside
    Overlap(usize),
    /// the OS refused a worker thread, the ones already started ran to the end
    Spawn(String),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Lock(e) => write!(f, "{e}"),
            BenchError::LostUpdates { expected, actual } => {
                write!(f, "lost updates: counter is {actual}, expected {expected}")
            }
            BenchError::Overlap(n) => write!(f, "{n} overlapping critical sections"),
            BenchError::Spawn(e) => write!(f, "can't start a worker: {e}"),
        }
    }
}

impl Error for BenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchError::Lock(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LockError> for BenchError {
    fn from(e: LockError) -> Self {
        BenchError::Lock(e)
    }
}

pub fn run(workload: &Workload) -> Result<Report, BenchError> {
    run_with(workload, |id| thread::Builder::new().name(format!("worker-{id}")))
}

/// `worker` makes the thread builder for the given worker id
fn run_with<F>(workload: &Workload, worker: F) -> Result<Report, BenchError>
where
    F: Fn(usize) -> thread::Builder,
{
    info!(
        "{}: {} workers x {} iterations, hold {:?}",
        workload.kind, workload.workers, workload.iterations, workload.hold
    );
    let counter = Mutex::with_locker(AnyLocker::new(workload.kind, workload.spin_limit)?, 0u64);
    let inside = AtomicUsize::new(0);
    let overlaps = AtomicUsize::new(0);

    let cpu_before = cpu::usage();
    let started = Instant::now();
    let spawned = thread::scope(|s| -> Result<(), BenchError> {
        for id in 0..workload.workers {
            let (counter, inside, overlaps) = (&counter, &inside, &overlaps);
            worker(id).spawn_scoped(s, move || {
                debug!("worker {id} started");
                for _ in 0..workload.iterations {
                    let mut guard = counter.lock();
                    if inside.fetch_add(1, Relaxed) != 0 {
                        overlaps.fetch_add(1, Relaxed);
                    }
                    *guard += 1;
                    if !workload.hold.is_zero() {
                        thread::sleep(workload.hold);
                    }
                    inside.fetch_sub(1, Relaxed);
                }
                debug!("worker {id} done");
            })
            .map_err(|e| {
                warn!("worker {id} didn't start: {e}");
                BenchError::Spawn(e.to_string())
            })?;
        }
        Ok(())
    });
    spawned?;
    let wall = started.elapsed();
    let cpu = cpu_before.zip(cpu::usage()).map(|(before, after)| after - before);

    let stats = counter.locker().stats();
    let actual = counter.into_inner();
    let overlaps = overlaps.into_inner();
    if overlaps > 0 {
        return Err(BenchError::Overlap(overlaps));
    }
    if actual != workload.expected() {
        return Err(BenchError::LostUpdates {
            expected: workload.expected(),
            actual,
        });
    }

    let report = Report {
        workload: *workload,
        wall,
        cpu,
        counter: actual,
        stats,
    };
    debug!("{}: {:?}", workload.kind, report.stats);
    Ok(report)
}
