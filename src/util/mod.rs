mod stats;

pub use stats::FrameStats;

use crate::geometry::FloatType;

pub type Rgb = rgb::RGB<FloatType>;

pub const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

pub fn gray(value: FloatType) -> Rgb {
    Rgb::new(value, value, value)
}

/// Componentwise product of two colors (albedo modulation).
pub fn modulate(a: Rgb, b: Rgb) -> Rgb {
    Rgb::new(a.r * b.r, a.g * b.g, a.b * b.b)
}

/// Maps a 0-1 f32 rgb radiance value to a pixel type compatible with module image.
pub fn color_to_image(color: Rgb) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        255,
    ])
}
