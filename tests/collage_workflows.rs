//! Integration tests for complete collage workflows
//!
//! These tests build sessions, composite and export without any network
//! access or segmentation model, using the colour-key remover and in-memory
//! images.

use collage_maker::{
    build_with_importer, encode_png, save_png, BackgroundRemover, CanvasConfig, CollageConfig,
    CollageError, CollageImporter, CollageItem, CollageManifest, CollageSession, ColorKeyRemover,
    Compositor, HttpImageFetcher, ImageSearchProvider, ItemKind, LayoutMode, Placement, Result,
    SearchHit, Sticker,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::sync::Arc;
use tempfile::TempDir;

/// Offline search provider that never finds anything
struct EmptySearch;

#[async_trait]
impl ImageSearchProvider for EmptySearch {
    async fn search_images(&self, _keyword: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "empty"
    }
}

/// White photo with a red square in the middle
fn product_shot(size: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
    for y in size / 4..size * 3 / 4 {
        for x in size / 4..size * 3 / 4 {
            image.put_pixel(x, y, Rgba([220, 20, 20, 255]));
        }
    }
    image
}

fn write_photo(dir: &TempDir, name: &str, format: ImageFormat) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let image = DynamicImage::ImageRgba8(product_shot(64));
    match format {
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(&path, format)
        },
        _ => image.save_with_format(&path, format),
    }
    .unwrap();
    path
}

fn offline_importer() -> CollageImporter {
    CollageImporter::new(
        Box::new(ColorKeyRemover::new(48.0)),
        Arc::new(EmptySearch),
        Arc::new(HttpImageFetcher::with_default_timeout().unwrap()),
    )
}

fn small_config() -> CollageConfig {
    CollageConfig::builder()
        .canvas_size(300, 200)
        .layout(LayoutMode::Fixed { default_width: 100 })
        .sticker_size(32)
        .build()
        .unwrap()
}

#[test]
fn test_photo_to_png_workflow() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let photo = write_photo(&dir, "product.png", ImageFormat::Png);
    let jpeg = write_photo(&dir, "product.jpg", ImageFormat::Jpeg);

    let config = small_config();
    let mut session = CollageSession::new("  minji  ")?;
    let report = offline_importer().import_files(&mut session, &[photo, jpeg]);
    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(session.len(), 2);

    // Background removed, subject kept
    let cutout = &session.get(0)?.image;
    assert_eq!(cutout.get_pixel(0, 0)[3], 0);
    assert_eq!(cutout.get_pixel(32, 32), &Rgba([220, 20, 20, 255]));

    session.set_placement(0, Some(Placement::new(0, 0, 100)))?;
    let canvas = Compositor::from_config(&config).render(&session)?;
    assert_eq!(canvas.dimensions(), (300, 200));
    // Transparent cut-out corner leaves the white canvas visible
    assert_eq!(canvas.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));

    let path = save_png(&canvas, dir.path().join("out"), session.user_name())?;
    assert_eq!(path.file_name().unwrap(), "minji_favorite.png");
    let reloaded = image::open(&path)?;
    assert_eq!(reloaded.to_rgba8(), canvas);
    Ok(())
}

#[test]
fn test_layer_order_controls_painting() -> anyhow::Result<()> {
    let config = small_config();
    let mut session = CollageSession::new("layers")?;
    let spot = Placement::new(50, 50, 40);
    let square = |name: &str, color: [u8; 4]| {
        CollageItem::new(name, ItemKind::Photo, RgbaImage::from_pixel(40, 40, Rgba(color)))
            .with_placement(spot)
    };
    session.add(square("green", [0, 200, 0, 255]));
    session.add(square("blue", [0, 0, 200, 255]));

    let compositor = Compositor::from_config(&config);
    assert_eq!(compositor.render(&session)?.get_pixel(70, 70), &Rgba([0, 0, 200, 255]));

    // Moving the top layer down puts green on top
    assert!(session.move_up(1)?);
    assert_eq!(compositor.render(&session)?.get_pixel(70, 70), &Rgba([0, 200, 0, 255]));

    // Double move restores the original order
    assert!(session.move_down(0)?);
    assert_eq!(compositor.render(&session)?.get_pixel(70, 70), &Rgba([0, 0, 200, 255]));

    session.remove(1)?;
    assert_eq!(session.len(), 1);
    assert_eq!(compositor.render(&session)?.get_pixel(70, 70), &Rgba([0, 200, 0, 255]));
    Ok(())
}

#[test]
fn test_stickers_render_on_canvas() -> anyhow::Result<()> {
    let config = small_config();
    let mut session = CollageSession::new("stickers")?;
    for sticker in Sticker::ALL {
        CollageImporter::add_sticker(&mut session, sticker, config.sticker_size);
    }
    assert_eq!(session.len(), 5);
    assert!(session.items().iter().all(|i| i.kind == ItemKind::Sticker));
    assert_eq!(
        session.layer_labels()[0],
        format!("[layer 1] {} (sticker)", Sticker::Heart.emoji())
    );

    let canvas = Compositor::from_config(&config).render(&session)?;
    assert_eq!(canvas.dimensions(), (300, 200));
    assert!(canvas.pixels().any(|p| p.0 != [255, 255, 255, 255]));
    Ok(())
}

#[test]
fn test_seeded_random_layout_is_reproducible() -> anyhow::Result<()> {
    let config = CollageConfig::builder()
        .canvas_size(400, 300)
        .layout(LayoutMode::Random {
            min_width: 50,
            max_width: 120,
            max_rotation: 30.0,
        })
        .seed(99)
        .build()?;
    let mut session = CollageSession::new("random")?;
    for sticker in Sticker::ALL {
        CollageImporter::add_sticker(&mut session, sticker, 64);
    }

    let first = encode_png(&Compositor::from_config(&config).render(&session)?)?;
    let second = encode_png(&Compositor::from_config(&config).render(&session)?)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_empty_session_cannot_render() {
    let session = CollageSession::new("nobody").unwrap();
    let compositor = Compositor::new(CanvasConfig::default(), LayoutMode::default());
    assert!(matches!(compositor.render(&session), Err(CollageError::EmptyCollage)));
}

#[tokio::test]
async fn test_manifest_build_collects_failures() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_photo(&dir, "cat.png", ImageFormat::Png);
    let manifest_path = dir.path().join("collage.json");
    std::fs::write(
        &manifest_path,
        r#"{
            "user_name": "haerin",
            "photos": ["cat.png", "missing.png"],
            "keywords": "IU",
            "stickers": ["star", "🎀"],
            "placements": [{"layer": 1, "x": 10, "y": 10, "width": 80}]
        }"#,
    )?;

    let manifest = CollageManifest::from_json_file(&manifest_path)?;
    let config = small_config();
    let (session, canvas, report) =
        build_with_importer(&manifest, &config, offline_importer()).await?;

    // cat.png plus two stickers; missing.png and the keyword fail
    assert_eq!(session.len(), 3);
    assert_eq!(report.added.len(), 3);
    let sources: Vec<&str> = report.failures.iter().map(|f| f.source.as_str()).collect();
    assert_eq!(sources, ["missing.png", "IU"]);
    assert_eq!(session.get(0)?.placement, Some(Placement::new(10, 10, 80)));
    assert_eq!(canvas.dimensions(), (300, 200));
    Ok(())
}

#[tokio::test]
async fn test_manifest_placements_survive_failed_imports() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_photo(&dir, "b.png", ImageFormat::Png);
    let manifest_path = dir.path().join("collage.json");
    std::fs::write(
        &manifest_path,
        r#"{
            "user_name": "danielle",
            "photos": ["a.png", "b.png"],
            "stickers": ["star"],
            "placements": [
                {"layer": 2, "x": 20, "y": 30, "width": 60},
                {"layer": 3, "x": 150, "y": 40, "width": 50}
            ]
        }"#,
    )?;

    let manifest = CollageManifest::from_json_file(&manifest_path)?;
    let (session, canvas, report) =
        build_with_importer(&manifest, &small_config(), offline_importer()).await?;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "a.png");
    assert_eq!(report.layers, vec![None, Some(0), Some(1)]);
    assert_eq!(session.len(), 2);
    assert_eq!(session.get(0)?.name, "b.png");
    assert_eq!(session.get(0)?.placement, Some(Placement::new(20, 30, 60)));
    assert_eq!(session.get(1)?.kind, ItemKind::Sticker);
    assert_eq!(session.get(1)?.placement, Some(Placement::new(150, 40, 50)));
    assert_eq!(canvas.dimensions(), (300, 200));
    Ok(())
}

#[test]
fn test_remover_output_matches_input_size() {
    let mut remover = ColorKeyRemover::new(30.0);
    let image = DynamicImage::ImageRgba8(product_shot(33));
    let result = remover.remove(&image).unwrap();
    assert_eq!(result.dimensions(), (33, 33));
}
