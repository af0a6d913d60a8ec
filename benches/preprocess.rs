use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use restyle::asset::normalize;

fn benchmark_normalize(c: &mut Criterion) {
	for img_size in [128, 256, 512, 1024] {
		let img: DynamicImage = DynamicImage::ImageRgb8(RgbImage::from_fn(img_size, img_size, |x, y| {
			Rgb([x as u8, y as u8, 128])
		}));

		c.bench_function(&format!("normalize {}x{}", img_size, img_size), |bench| {
			bench.iter(|| {
				normalize(black_box(&img));
			});
		});
	}
}

fn benchmark_resize_then_normalize(c: &mut Criterion) {
	let img: DynamicImage = DynamicImage::ImageRgb8(RgbImage::from_fn(1024, 1024, |x, y| {
		Rgb([x as u8, y as u8, 128])
	}));

	c.bench_function("resize 1024 to 256 + normalize", |bench| {
		bench.iter(|| {
			normalize(&img.resize_exact(256, 256, FilterType::Triangle));
		});
	});
}

criterion_group!(benches, benchmark_normalize, benchmark_resize_then_normalize);
criterion_main!(benches);
