use collage_maker::{
    resize_to_width, rotate_expanded, BackgroundRemover, CollageConfig, CollageImporter,
    CollageItem, CollageSession, ColorKeyRemover, Compositor, ItemKind, LayoutMode, Sticker,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgba, RgbaImage};

/// Gradient photo on a plain backdrop, roughly what a phone upload looks like after decode
fn photo(width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([245, 245, 245, 255]));
    for y in height / 5..height * 4 / 5 {
        for x in width / 5..width * 4 / 5 {
            image.put_pixel(x, y, Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]));
        }
    }
    image
}

fn session_with_layers(count: usize) -> CollageSession {
    let mut session = CollageSession::new("bench").unwrap();
    for i in 0..count {
        if i % 3 == 2 {
            CollageImporter::add_sticker(&mut session, Sticker::ALL[i % Sticker::ALL.len()], 256);
        } else {
            session.add(CollageItem::new(format!("photo{i}"), ItemKind::Photo, photo(800, 600)));
        }
    }
    session
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    for layers in [1usize, 5, 10] {
        let session = session_with_layers(layers);

        let config = CollageConfig::builder().seed(7).build().unwrap();
        let compositor = Compositor::from_config(&config);
        group.bench_with_input(BenchmarkId::new("random", layers), &session, |b, session| {
            b.iter(|| black_box(compositor.render(session).unwrap()));
        });

        let rotated = CollageConfig::builder()
            .seed(7)
            .layout(LayoutMode::Random {
                min_width: 350,
                max_width: 550,
                max_rotation: 25.0,
            })
            .build()
            .unwrap();
        let compositor = Compositor::from_config(&rotated);
        group.bench_with_input(BenchmarkId::new("random_rotated", layers), &session, |b, session| {
            b.iter(|| black_box(compositor.render(session).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_layer_transforms(c: &mut Criterion) {
    let source = photo(1600, 1200);
    let mut group = c.benchmark_group("layer_transforms");

    for width in [350u32, 550] {
        group.bench_with_input(BenchmarkId::new("resize_to_width", width), &width, |b, &width| {
            b.iter(|| black_box(resize_to_width(&source, width)));
        });
    }

    let layer = resize_to_width(&source, 450);
    for degrees in [15.0f32, 45.0, 90.0] {
        group.bench_with_input(
            BenchmarkId::new("rotate_expanded", degrees as u32),
            &degrees,
            |b, &degrees| {
                b.iter(|| black_box(rotate_expanded(&layer, degrees)));
            },
        );
    }

    group.finish();
}

fn benchmark_stickers_and_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("items");

    for sticker in Sticker::ALL {
        group.bench_function(BenchmarkId::new("sticker_render", sticker.name()), |b| {
            b.iter(|| black_box(sticker.render(256)));
        });
    }

    let upload = DynamicImage::ImageRgba8(photo(1024, 768));
    let mut remover = ColorKeyRemover::new(48.0);
    group.bench_function("color_key_1024x768", |b| {
        b.iter(|| black_box(remover.remove(&upload).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_render,
    benchmark_layer_transforms,
    benchmark_stickers_and_removal
);
criterion_main!(benches);
