// Benchmarks for the two hot paths of every generation: rendering a drawing
// and comparing it with the target.
//
// Run with: cargo bench --bench fitness_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use genetic_drawing::fitness::{image_diff, image_diff_parallel};
use genetic_drawing::{Drawing, ShapeConfig};
use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Sequential vs parallel diff across image sizes
fn benchmark_fitness(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitness_calculation");

    // 100×75 (small), 400×300 (medium), 800×600 (typical input)
    for size in [100, 400, 800].iter() {
        let width = *size;
        let height = size * 3 / 4;

        let img1 = RgbaImage::from_pixel(width, height, Rgba([100, 150, 200, 255]));
        let img2 = RgbaImage::from_pixel(width, height, Rgba([110, 140, 190, 128]));

        group.bench_with_input(
            BenchmarkId::new("sequential", format!("{}x{}", width, height)),
            &size,
            |b, _| b.iter(|| image_diff(black_box(&img1), black_box(&img2))),
        );

        group.bench_with_input(
            BenchmarkId::new("parallel", format!("{}x{}", width, height)),
            &size,
            |b, _| b.iter(|| image_diff_parallel(black_box(&img1), black_box(&img2))),
        );
    }

    group.finish();
}

/// Rendering cost as the number of shapes grows
fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for shapes in [50, 150, 300].iter() {
        let drawing = Drawing::new(200, 150, ShapeConfig::default(), *shapes, &mut rng)
            .expect("benchmark drawing");

        group.bench_with_input(BenchmarkId::new("shapes", shapes), shapes, |b, _| {
            b.iter(|| black_box(&drawing).render())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_fitness, benchmark_render);
criterion_main!(benches);
