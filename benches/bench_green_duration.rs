use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use std::collections::HashMap;

use adaptive_signal_control::control_system::direction::Direction;
use adaptive_signal_control::control_system::signal_scheduler::{
    busiest_direction, green_duration, next_in_rotation, SchedulerConfig,
};

/// Builds a full set of per-approach counts derived from a base value.
fn generate_counts(base: u32) -> HashMap<Direction, u32> {
    let mut counts = HashMap::new();
    for (i, direction) in Direction::ROTATION.iter().enumerate() {
        counts.insert(*direction, base.wrapping_mul(i as u32 + 1) % 97);
    }
    counts
}

/// Benchmarks the per-tick scheduling decisions for different traffic levels.
fn bench_scheduling_decision(c: &mut Criterion) {
    let config = SchedulerConfig::default();
    let count_levels = [0u32, 20, 1000];

    // Create a benchmark group and configure it for a linear summary (for plots).
    let mut group = c.benchmark_group("Scheduling_Decision_Benchmarks");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &count in count_levels.iter() {
        // Benchmark green_duration.
        group.bench_with_input(
            BenchmarkId::new("green_duration", count),
            &count,
            |b, &count| {
                b.iter(|| {
                    let duration = green_duration(black_box(&config), black_box(count));
                    black_box(duration);
                });
            },
        );

        // Benchmark busiest_direction.
        let counts = generate_counts(count);
        group.bench_with_input(
            BenchmarkId::new("busiest_direction", count),
            &count,
            |b, &_count| {
                b.iter(|| {
                    let busiest =
                        busiest_direction(black_box(&counts), black_box(&config.rotation_order));
                    black_box(busiest);
                });
            },
        );
    }

    group.bench_function("next_in_rotation", |b| {
        b.iter(|| {
            let next =
                next_in_rotation(black_box(&config.rotation_order), black_box(Direction::East));
            black_box(next);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_scheduling_decision);
criterion_main!(benches);
