use image::RgbaImage;

use crate::{
    camera::Camera,
    geometry::ScreenPoint,
    scene::Scene,
    screen_block::ScreenBlock,
    tracer,
    util::{self, Rgb},
};

pub struct Worker {
    #[allow(dead_code)]
    worker_id: usize,
}

impl Worker {
    pub fn new(worker_id: usize) -> Self {
        Self { worker_id }
    }

    /// Renders one tile into the top-left corner of `buffer`.
    pub fn render_tile(
        &self,
        scene: &Scene,
        camera: &Camera,
        tile: &ScreenBlock,
        buffer: &mut RgbaImage,
    ) {
        for point in tile.internal_points() {
            let pixel = self.render_pixel(scene, camera, &point);

            let buffer_position = point - tile.min;
            buffer.put_pixel(
                buffer_position.x,
                buffer_position.y,
                util::color_to_image(pixel),
            );
        }
    }

    fn render_pixel(&self, scene: &Scene, camera: &Camera, point: &ScreenPoint) -> Rgb {
        let mut ray = camera.primary_ray(point);
        tracer::trace(scene, &mut ray, 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    use crate::geometry::{ScreenSize, ScreenPoint};
    use crate::scene::WallTextures;

    #[test]
    fn tile_matches_per_pixel_tracing() {
        let scene = Scene::standard_room(&WallTextures::default());
        let camera = Camera::room_view(ScreenSize::new(64, 40));

        let tile = ScreenBlock::new(ScreenPoint::new(24, 16), ScreenPoint::new(32, 24));
        let mut buffer = RgbaImage::new(8, 8);
        let worker = Worker::new(0);
        worker.render_tile(&scene, &camera, &tile, &mut buffer);

        for point in tile.internal_points() {
            let mut ray = camera.primary_ray(&point);
            let expected = util::color_to_image(tracer::trace(&scene, &mut ray, 0));
            let offset = point - tile.min;
            assert!(*buffer.get_pixel(offset.x, offset.y) == expected);
        }
    }
}
