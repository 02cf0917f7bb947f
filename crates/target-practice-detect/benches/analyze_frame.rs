use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use target_practice_detect::{FrameAnalyzer, TargetParams};

fn synthetic_frame() -> RgbImage {
    let mut frame = RgbImage::from_pixel(640, 480, Rgb([30, 30, 30]));
    for (x0, y0, side) in [(150u32, 150u32, 100u32), (400, 80, 60), (420, 300, 120)] {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                frame.put_pixel(x, y, Rgb([220, 40, 40]));
            }
        }
    }
    frame
}

fn analyze_benchmarks(c: &mut Criterion) {
    let frame = synthetic_frame();
    let analyzer = FrameAnalyzer::new(TargetParams::default()).expect("default params");

    c.bench_function("detect_640x480", |b| {
        b.iter(|| analyzer.detect(black_box(&frame)))
    });
    c.bench_function("analyze_640x480", |b| {
        b.iter(|| analyzer.analyze(black_box(&frame)))
    });
}

criterion_group!(benches, analyze_benchmarks);
criterion_main!(benches);
