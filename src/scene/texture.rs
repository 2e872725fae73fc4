use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::geometry::FloatType;
use crate::util::Rgb;

/// Opaque sampling capability used for spatially varying wall albedo.
/// Coordinates are addressed with wrap-around, so any (u, v) is valid.
pub trait Texture {
    fn sample(&self, u: FloatType, v: FloatType) -> Rgb;
}

pub type TextureRef = Arc<dyn Texture + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to load texture from {path}")]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Texture backed by an 8-bit image file.
#[derive(Debug)]
pub struct ImageTexture {
    pixels: image::RgbImage,
}

impl ImageTexture {
    pub fn open(path: &Path) -> Result<ImageTexture, TextureError> {
        let pixels = image::open(path)
            .map_err(|source| TextureError::Load {
                path: path.to_owned(),
                source,
            })?
            .to_rgb8();
        Ok(ImageTexture { pixels })
    }

    pub fn from_image(pixels: image::RgbImage) -> ImageTexture {
        ImageTexture { pixels }
    }
}

impl Texture for ImageTexture {
    fn sample(&self, u: FloatType, v: FloatType) -> Rgb {
        let x = (u * self.pixels.width() as FloatType) as i64;
        let y = (v * self.pixels.height() as FloatType) as i64;
        let x = x.rem_euclid(self.pixels.width() as i64) as u32;
        let y = y.rem_euclid(self.pixels.height() as i64) as u32;

        let p = self.pixels.get_pixel(x, y);
        Rgb::new(
            p[0] as FloatType / 255.0,
            p[1] as FloatType / 255.0,
            p[2] as FloatType / 255.0,
        )
    }
}

/// Optional textures for the three decorated walls of the standard room.
/// Walls without a texture fall back to their uniform albedo.
#[derive(Default)]
pub struct WallTextures {
    pub back: Option<TextureRef>,
    pub left: Option<TextureRef>,
    pub right: Option<TextureRef>,
}

impl WallTextures {
    /// Loads the wall textures from an asset directory, skipping any file
    /// that is missing or unreadable.
    pub fn load(asset_dir: &Path) -> WallTextures {
        let load_one = |file: &str| -> Option<TextureRef> {
            let path = asset_dir.join(file);
            match ImageTexture::open(&path) {
                Ok(texture) => Some(Arc::new(texture)),
                Err(err) => {
                    log::warn!("{err}; wall stays untextured");
                    None
                }
            }
        };

        WallTextures {
            back: load_one("logo.png"),
            left: load_one("red.png"),
            right: load_one("blue.png"),
        }
    }
}
