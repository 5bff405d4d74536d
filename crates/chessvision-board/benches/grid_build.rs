use chessvision_board::{
    Board, BoardSource, GrayImage, Homography, PointCorrespondenceSet, SquareFeatureParams,
    SquareGrid,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Matrix3, Point2};

fn transform() -> Homography {
    Homography::new(Matrix3::new(
        90.0, 4.0, 120.0, //
        -3.0, 85.0, 100.0, //
        0.0002, 0.0001, 1.0,
    ))
}

fn frame(width: usize, height: usize) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| ((x / 90 + y / 85) % 2 * 200 + 30) as u8)
}

fn bench_grid(c: &mut Criterion) {
    let img = frame(1280, 1024);
    let h = transform();
    let params = SquareFeatureParams::default();

    c.bench_function("square_grid_1280x1024_16px", |b| {
        b.iter(|| SquareGrid::build(black_box(&img), black_box(&h), &params))
    });

    let coarse = SquareFeatureParams {
        patch_px: 32,
        histogram_bins: 16,
    };
    c.bench_function("square_grid_1280x1024_32px", |b| {
        b.iter(|| SquareGrid::build(black_box(&img), black_box(&h), &coarse))
    });
}

fn bench_board_from_points(c: &mut Criterion) {
    let img = frame(1280, 1024);
    let h = transform();
    let board: Vec<Point2<f32>> = (0..=8)
        .flat_map(|y| (0..=8).map(move |x| Point2::new(x as f32, y as f32)))
        .collect();
    let image: Vec<Point2<f32>> = board.iter().map(|&p| h.apply(p)).collect();

    c.bench_function("board_from_81_points", |b| {
        b.iter(|| {
            let correspondences =
                PointCorrespondenceSet::without_descriptors(board.clone(), image.clone())
                    .expect("set");
            Board::new(BoardSource::FromPoints {
                name: Some("bench".into()),
                image: img.clone(),
                correspondences,
            })
            .expect("board")
        })
    });
}

criterion_group!(benches, bench_grid, bench_board_from_points);
criterion_main!(benches);
