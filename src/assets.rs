//! Resources compiled into the binary.

use include_dir::{include_dir, Dir};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

pub const LOGO_FILE: &str = "steel_wheel_logo.png";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not bundled: {0}")]
    Missing(&'static str),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded raster, flattened to 8-bit RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl LogoImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
        })
    }
}

/// The company logo, decoded on first successful use and shared afterwards.
pub fn bundled_logo() -> Result<Arc<LogoImage>, AssetError> {
    static CACHE: OnceLock<Arc<LogoImage>> = OnceLock::new();
    if let Some(logo) = CACHE.get() {
        return Ok(Arc::clone(logo));
    }
    let file = ASSETS.get_file(LOGO_FILE).ok_or(AssetError::Missing(LOGO_FILE))?;
    let logo = Arc::new(LogoImage::decode(file.contents())?);
    Ok(Arc::clone(CACHE.get_or_init(|| logo)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_logo_decodes_and_is_cached() {
        let first = bundled_logo().unwrap();
        assert_eq!((first.width, first.height), (400, 400));
        assert_eq!(first.rgb.len(), 400 * 400 * 3);
        let second = bundled_logo().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        assert!(matches!(LogoImage::decode(b"\x89PNG\r\n\x1a\nnot really"), Err(AssetError::Decode(_))));
    }
}
