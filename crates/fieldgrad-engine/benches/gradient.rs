//! Benchmarks for adjoint gradient assembly.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use num_complex::Complex64;

use fieldgrad_core::{BoxBasis, E_COMPONENTS, ElementType, FieldData, Region};
use fieldgrad_engine::assemble_gradient;

fn sampled_field(samples: usize, phase: f64) -> FieldData {
    let points = (0..samples)
        .flat_map(|j| {
            (0..samples).map(move |i| {
                [
                    -0.5 + (i as f64 + 0.5) / samples as f64,
                    -0.5 + (j as f64 + 0.5) / samples as f64,
                    0.0,
                ]
            })
        })
        .collect::<Vec<_>>();
    let n = points.len();
    FieldData::from_fn(
        points,
        vec![1.0 / n as f64; n],
        E_COMPONENTS.to_vec(),
        vec![0.9, 1.0, 1.1],
        |f, _, p| Complex64::from_polar(1.0, phase * (p + f) as f64),
    )
}

fn bench_assemble_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_gradient");

    for elements in [4, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(elements),
            &elements,
            |bencher, &elements| {
                let region = Region::new([0.0; 3], [1.0, 1.0, 0.0]);
                let basis =
                    BoxBasis::new(region, ElementType::Linear, 1.0 / elements as f64).unwrap();
                // Four samples per element along each axis
                let forward = sampled_field(4 * elements, 0.01);
                let adjoint = sampled_field(4 * elements, -0.02);

                bencher.iter(|| {
                    assemble_gradient(
                        black_box(&basis),
                        black_box(&forward),
                        black_box(&adjoint),
                        1.0,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_assemble_gradient);
criterion_main!(benches);
