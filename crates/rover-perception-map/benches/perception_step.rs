use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rover_perception_core::RgbImage;
use rover_perception_map::{PerceptionParams, PerceptionPipeline, Pose};

fn synthetic_frame() -> RgbImage {
    let mut frame = RgbImage::filled(320, 160, [190, 180, 170]);
    for y in 60..100 {
        for x in 0..80 {
            frame.set_pixel(x, y, [60, 50, 40]);
        }
    }
    for y in 120..126 {
        for x in 200..206 {
            frame.set_pixel(x, y, [200, 150, 10]);
        }
    }
    frame
}

fn bench_step(c: &mut Criterion) {
    let pipeline = PerceptionPipeline::new(PerceptionParams::default()).expect("valid params");
    let frame = synthetic_frame();
    let pose = Pose::new(99.7, 85.6, 56.8);

    c.bench_function("perception_step_320x160", |b| {
        let mut map = pipeline.new_world_map();
        b.iter(|| {
            let out = pipeline
                .step(black_box(&frame.view()), black_box(&pose), &mut map)
                .expect("step");
            black_box(out.navigable.len())
        })
    });

    c.bench_function("warp_320x160", |b| {
        b.iter(|| black_box(pipeline.warp(black_box(&frame.view()))))
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
