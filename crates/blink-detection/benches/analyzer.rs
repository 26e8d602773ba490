use blink_detection::{BlinkConfig, FrameAnalyzer, LandmarkSet, Point2};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_face(opening: f64) -> LandmarkSet {
    let mut points: Vec<Point2> = (0..68)
        .map(|i| Point2::new(100.0 + i as f64 * 3.0, 200.0 + (i % 7) as f64))
        .collect();
    for start in [36usize, 42] {
        let x0 = start as f64 * 10.0;
        let half = opening / 2.0;
        points[start..start + 6].copy_from_slice(&[
            Point2::new(x0, 150.0),
            Point2::new(x0 + 10.0, 150.0 - half),
            Point2::new(x0 + 20.0, 150.0 - half),
            Point2::new(x0 + 30.0, 150.0),
            Point2::new(x0 + 20.0, 150.0 + half),
            Point2::new(x0 + 10.0, 150.0 + half),
        ]);
    }
    LandmarkSet::new(points)
}

fn bench_process(c: &mut Criterion) {
    let open = vec![synthetic_face(9.0)];
    let closed = vec![synthetic_face(2.0)];
    let crowd: Vec<LandmarkSet> = (0..8).map(|i| synthetic_face(2.0 + i as f64)).collect();

    c.bench_function("process_single_face", |b| {
        let mut analyzer = FrameAnalyzer::new(BlinkConfig::default()).unwrap();
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            let faces = if i % 12 == 0 { &closed } else { &open };
            black_box(analyzer.process(black_box(faces)))
        })
    });

    c.bench_function("process_eight_faces", |b| {
        let mut analyzer = FrameAnalyzer::new(BlinkConfig::default()).unwrap();
        b.iter(|| black_box(analyzer.process(black_box(&crowd))))
    });
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
