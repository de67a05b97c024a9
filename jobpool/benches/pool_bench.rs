//! Benchmarks for graph validation and pool execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jobpool::job::{JobGraph, JobHandler, JobRef, NoOpHandler};
use jobpool::pipeline::Pipeline;
use jobpool::pool::{Pool, PoolConfig};
use jobpool::testing::{chain, fan_out_fan_in};
use std::sync::Arc;

fn noop() -> Arc<dyn JobHandler> {
    Arc::new(NoOpHandler)
}

fn pipeline_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_new");
    for len in [10_usize, 100, 1000] {
        let mut graph = JobGraph::new();
        let ids = chain(&mut graph, "step", len, &noop()).unwrap();
        let graph = Arc::new(graph);
        group.bench_with_input(BenchmarkId::from_parameter(len), &ids, |b, ids| {
            b.iter(|| black_box(Pipeline::new("bench", &graph, ids).unwrap()));
        });
    }
    group.finish();
}

fn independent_jobs(c: &mut Criterion) {
    c.bench_function("pool_1000_independent_jobs", |b| {
        b.iter(|| {
            let pool = Pool::new(PoolConfig::new().with_capacity(64)).unwrap();
            for i in 0..1000 {
                pool.add_job(JobRef::standalone(format!("job{i}"), noop()))
                    .unwrap();
            }
            pool.close("bench").unwrap();
        });
    });
}

fn fan_out_pipeline(c: &mut Criterion) {
    c.bench_function("pool_fan_out_64", |b| {
        b.iter(|| {
            let mut graph = JobGraph::new();
            let (root, _, _) = fan_out_fan_in(&mut graph, 64, &noop(), noop()).unwrap();
            let graph = Arc::new(graph);
            let pipeline = Pipeline::new("fan", &graph, &[root]).unwrap();

            let pool = Pool::new(PoolConfig::new().with_capacity(16).with_max_active(8)).unwrap();
            pool.add_pipeline(&pipeline).unwrap();
            pool.close("bench").unwrap();
        });
    });
}

criterion_group!(benches, pipeline_validation, independent_jobs, fan_out_pipeline);
criterion_main!(benches);
