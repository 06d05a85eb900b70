use webp::Encoder;

use crate::error::{AppError, Result};

const WEBP_QUALITY: f32 = 80.0;

const SUPPORTED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff"];

pub fn is_supported_image(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    if let Some(content_type) = content_type {
        if SUPPORTED_CONTENT_TYPES.contains(&content_type.to_ascii_lowercase().as_str()) {
            return true;
        }
    }

    if let Some((_, extension)) = file_name.and_then(|name| name.rsplit_once('.')) {
        return SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str());
    }

    false
}

/// Decodes any supported image format and re-encodes it as lossy webp.
pub fn convert_to_webp(data: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)
        .map_err(|_| AppError::BadRequest("Unable to decode image".to_string()))?;

    let rgba = decoded.to_rgba8();
    let encoder = Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());

    Ok(encoder.encode(WEBP_QUALITY).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let buffer = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn converts_png_to_webp() {
        let webp = convert_to_webp(&png_bytes()).unwrap();

        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(convert_to_webp(b"definitely not an image").is_err());
    }

    #[test]
    fn supported_by_content_type() {
        assert!(is_supported_image(Some("image/png"), None));
        assert!(is_supported_image(Some("IMAGE/JPEG"), None));
        assert!(!is_supported_image(Some("image/svg+xml"), None));
        assert!(!is_supported_image(Some("application/pdf"), None));
    }

    #[test]
    fn supported_by_file_extension() {
        assert!(is_supported_image(None, Some("photo.JPG")));
        assert!(is_supported_image(Some("application/octet-stream"), Some("photo.png")));
        assert!(!is_supported_image(None, Some("photo.svg")));
        assert!(!is_supported_image(None, Some("photo")));
    }
}
