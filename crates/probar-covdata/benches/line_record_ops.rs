//! Line Record Operation Benchmarks
//!
//! Benchmarks for hot-path touches and pairwise merge.
//!
//! Run with: `cargo bench --bench line_record_ops`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use probar_covdata::{
    CaseIndex, ConditionId, JumpRecord, LineNumber, LineRecord, SwitchId, SwitchRecord,
};

fn line_with_branches(jumps: u32, switches: u32) -> LineRecord {
    let line = LineRecord::new(LineNumber::new(1));
    for id in 0..jumps {
        let _ = line.register_jump(JumpRecord::new(ConditionId::new(id)));
    }
    for id in 0..switches {
        let _ = line.register_switch(SwitchRecord::new(SwitchId::new(id), 8));
    }
    line
}

fn bench_touches(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_touches");
    let line = line_with_branches(4, 2);

    group.bench_function("touch", |bench| {
        bench.iter(|| line.touch(black_box(1)));
    });

    group.bench_function("touch_jump", |bench| {
        bench.iter(|| {
            line.touch_jump(black_box(ConditionId::new(2)), black_box(true), 1)
                .unwrap();
        });
    });

    group.bench_function("touch_switch", |bench| {
        bench.iter(|| {
            line.touch_switch(black_box(SwitchId::new(1)), CaseIndex::Case(black_box(3)), 1)
                .unwrap();
        });
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_merge");

    for branches in [0u32, 4, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_branches", branches)),
            &branches,
            |bench, &n| {
                let target = line_with_branches(n, n / 4);
                let source = line_with_branches(n, n / 4);
                source.touch(1);
                bench.iter(|| target.merge(black_box(&source)));
            },
        );
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_queries");

    for branches in [4u32, 64] {
        let line = line_with_branches(branches, branches / 4);
        line.touch(1);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("is_covered_{}", branches)),
            &line,
            |bench, line| {
                bench.iter(|| black_box(line.is_covered()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_touches, bench_merge, bench_queries);
criterion_main!(benches);
