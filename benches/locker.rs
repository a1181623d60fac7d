use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use locker::{AnyLocker, Kind, Locker};
use strum::IntoEnumIterator;

const SPIN_LIMIT: usize = 40;

fn uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock-unlock");
    for kind in Kind::iter() {
        let lock = AnyLocker::new(kind, SPIN_LIMIT).unwrap();
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| {
                lock.lock();
                assert!(lock.unlock().is_ok());
            });
        });
    }
    group.finish();
}

fn contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.sample_size(10);
    for kind in Kind::iter() {
        for threads in [2, 8, 32] {
            let id = BenchmarkId::new(kind.to_string(), threads);
            group.bench_with_input(id, &threads, |b, &threads| {
                b.iter(|| {
                    let lock = AnyLocker::new(kind, SPIN_LIMIT).unwrap();
                    thread::scope(|s| {
                        for _ in 0..threads {
                            s.spawn(|| {
                                for _ in 0..1_000 {
                                    lock.lock();
                                    assert!(lock.unlock().is_ok());
                                }
                            });
                        }
                    });
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, uncontended, contended);
criterion_main!(benches);
