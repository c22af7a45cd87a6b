use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use twoview_image::{Image, ImageSize};
use twoview_stereo::{
    disparity::{compute_disparity, ExecutionStrategy},
    kernels::{MatchingCost, MatchingKernel},
    patch::{normalize_rgb, PatchExtractor, ZeroPaddedPatches},
};

fn random_image(size: ImageSize, seed: u64) -> Image<u8, 3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..size.width * size.height * 3)
        .map(|_| rng.random_range(0..=255u8))
        .collect();
    Image::new(size, data).unwrap()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchingKernels");

    let size = ImageSize {
        width: 1,
        height: 128,
    };
    let left = normalize_rgb(&random_image(size, 0)).unwrap();
    let right = normalize_rgb(&random_image(size, 1)).unwrap();
    let left_patches = ZeroPaddedPatches.extract(&left, 5).unwrap();
    let right_patches = ZeroPaddedPatches.extract(&right, 5).unwrap();

    for kernel in [MatchingKernel::Ssd, MatchingKernel::Sad, MatchingKernel::Zncc] {
        group.bench_with_input(
            BenchmarkId::new("column_128", kernel),
            &kernel,
            |b, kernel| {
                b.iter(|| {
                    kernel.cost_matrix(
                        black_box(left_patches.column(0)),
                        black_box(right_patches.column(0)),
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_disparity(c: &mut Criterion) {
    let mut group = c.benchmark_group("Disparity");
    group.sample_size(10);

    for (width, height) in [(64, 48), (128, 96)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let size = [*width, *height].into();
        let left = random_image(size, 2);
        let right = random_image(size, 3);

        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), &parameter_string),
                &(&left, &right),
                |b, i| {
                    b.iter(|| {
                        compute_disparity(
                            black_box(i.0),
                            black_box(i.1),
                            black_box(2.0),
                            5,
                            &MatchingKernel::Ssd,
                            &ZeroPaddedPatches,
                            strategy,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_disparity);
criterion_main!(benches);
