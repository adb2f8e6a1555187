use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use img_squeeze_web::processing::{decode_image, EncodeSpec, ImageEncoder, RasterEncoder};
use img_squeeze_web::TargetFormat;

fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, 95);
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .unwrap();
    buffer
}

fn bench_decode(c: &mut Criterion) {
    let bytes = create_test_jpeg(1920, 1080);

    c.bench_function("decode_image", |b| {
        b.iter(|| decode_image(black_box(&bytes)))
    });
}

fn bench_encode_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.sample_size(10);

    for size in [Small, Medium].iter() {
        let (width, height) = match size {
            Small => (320, 240),
            Medium => (1280, 720),
        };
        let bytes = create_test_jpeg(width, height);

        for format in TargetFormat::all_formats() {
            let spec = EncodeSpec::for_format(format);
            group.bench_with_input(
                BenchmarkId::new(format.form_value(), format!("{}x{}", width, height)),
                &bytes,
                |b, bytes| b.iter(|| RasterEncoder.encode(black_box(bytes), black_box(&spec))),
            );
        }
    }

    group.finish();
}

enum ImageSize {
    Small,
    Medium,
}

use ImageSize::*;

criterion_group!(benches, bench_decode, bench_encode_formats);
criterion_main!(benches);
