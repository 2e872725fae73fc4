use assert2::assert;
use bon::bon;
use nalgebra::Unit;

use crate::geometry::{EPSILON, FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

/// Pinhole camera. Primary rays go through pixel centers, so the image is
/// deterministic for a given scene pose.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    center: WorldPoint,

    resolution: ScreenSize,

    up: Unit<WorldVector>,
    right: Unit<WorldVector>,
    film_origin_offset: WorldVector,

    /// Distance between pixels in world units
    pixel_pitch: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        center: WorldPoint,
        forward: WorldVector,
        up: WorldVector,
        resolution: ScreenSize,
        film_width: FloatType,
        focal_length: FloatType,
    ) -> Self {
        let forward = Unit::try_new(forward, EPSILON).expect("Forward vector must be non-zero");
        let up = Unit::try_new(up, EPSILON).expect("Up vector must be non-zero");
        let right = Unit::try_new(forward.cross(&up), EPSILON)
            .expect("`up` and `forward` must be linearly independent");
        let up = Unit::new_normalize(right.cross(&forward));

        assert!(resolution.x > 0);
        assert!(resolution.y > 0);
        assert!(film_width > 0.0);
        assert!(focal_length > 0.0);

        let pixel_scale = film_width / (resolution.x as f32);
        let resolution_minus_one = ScreenSize::new(resolution.x - 1, resolution.y - 1);
        let film_origin_uv = resolution_minus_one.cast::<FloatType>() * pixel_scale / 2.0;
        let film_origin_offset = -forward.as_ref() * focal_length
            + right.as_ref() * film_origin_uv.x
            - up.as_ref() * film_origin_uv.y;

        Camera {
            center,

            resolution,

            up,
            right,
            film_origin_offset,
            pixel_pitch: pixel_scale,
        }
    }
}

impl Camera {
    /// The conventional view into the standard room: two units in front of
    /// the film plane, looking down the z axis. The film is two world units
    /// tall regardless of resolution.
    pub fn room_view(resolution: ScreenSize) -> Camera {
        let aspect = resolution.x as FloatType / resolution.y as FloatType;
        Camera::builder()
            .center(WorldPoint::new(0.0, 0.0, -2.0))
            .forward(WorldVector::new(0.0, 0.0, 1.0))
            .up(WorldVector::new(0.0, 1.0, 0.0))
            .resolution(resolution)
            .film_width(2.0 * aspect)
            .focal_length(2.0)
            .build()
    }

    pub fn get_resolution(&self) -> ScreenSize {
        self.resolution
    }

    /// Constructs the primary ray for the given image pixel.
    pub fn primary_ray(&self, point: &ScreenPoint) -> Ray {
        let film_u = point.x as f32;
        let film_v = point.y as f32;
        let film_point_offset = self.film_origin_offset
            + self.up.as_ref() * (film_v * self.pixel_pitch)
            - self.right.as_ref() * (film_u * self.pixel_pitch);

        Ray::new(self.center, -film_point_offset)
    }
}
