//! PNG export of the finished collage

use crate::error::{CollageError, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

/// Download filename for a user's collage: `{name}_favorite.png`
///
/// Path separators, control characters and characters rejected by common
/// filesystems are replaced with `_` so the name can never escape the output
/// directory.
#[must_use]
pub fn export_filename(user_name: &str) -> String {
    let sanitized: String = user_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = match sanitized.trim_matches('.') {
        "" => "collage",
        s => s,
    };
    format!("{}_favorite.png", stem)
}

/// Encode the canvas as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Write the canvas to `{dir}/{name}_favorite.png` and return the path
pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, dir: P, user_name: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .map_err(|e| CollageError::file_io_error("create output directory", dir, &e))?;

    let path = dir.join(export_filename(user_name));
    let bytes = encode_png(image)?;
    std::fs::write(&path, &bytes)
        .map_err(|e| CollageError::file_io_error("write collage", &path, &e))?;

    info!("💾 Saved collage to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Mina"), "Mina_favorite.png");
        assert_eq!(export_filename(" 제미니 "), "제미니_favorite.png");
        assert_eq!(export_filename("../etc/passwd"), "_etc_passwd_favorite.png");
        assert_eq!(export_filename("a\\b"), "a_b_favorite.png");
        assert_eq!(export_filename(".."), "collage_favorite.png");
        assert_eq!(export_filename(""), "collage_favorite.png");
    }

    #[test]
    fn test_encode_png_signature() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_save_png_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));

        let path = save_png(&image, &out, "Mina").unwrap();
        assert_eq!(path, out.join("Mina_favorite.png"));
        assert!(path.exists());
    }
}
