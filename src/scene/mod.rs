//! The scene aggregate and its primitive shapes.
//!
//! A [`Scene`] owns one arena per primitive kind and forwards intersection
//! queries to them, so the nearest hit can be identified by a
//! [`PrimitiveId`]. For that hit the normal, albedo and surface material
//! can then be queried without recomputing the intersection.

use std::f32::consts::PI;

use nalgebra::{Isometry3, Vector3, point, vector};
use rand::Rng;

use crate::geometry::{
    FloatType, Placement, PrimitiveId, PrimitiveKind, Ray, WorldPoint, WorldVector,
};
use crate::util::{BLACK, Rgb, gray};

pub mod primitives;
pub mod texture;
mod torus;

pub use primitives::{Cuboid, PlanarProjection, Plane, PlaneFinish, Quad, Sphere};
pub use texture::WallTextures;
pub use torus::Torus;

use primitives::DEFAULT_ALBEDO;

/// Whitted material parameters of one primitive. The diffuse remainder
/// `1 - reflectivity - refractivity` is implied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMaterial {
    pub reflectivity: FloatType,
    pub refractivity: FloatType,
    /// Beer-Lambert absorption coefficient of the interior.
    pub absorption: Rgb,
}

impl SurfaceMaterial {
    pub const MATTE: SurfaceMaterial = SurfaceMaterial {
        reflectivity: 0.0,
        refractivity: 0.0,
        absorption: BLACK,
    };

    pub fn mirror() -> SurfaceMaterial {
        SurfaceMaterial {
            reflectivity: 1.0,
            ..SurfaceMaterial::MATTE
        }
    }

    pub fn glass(absorption: Rgb) -> SurfaceMaterial {
        SurfaceMaterial {
            refractivity: 1.0,
            absorption,
            ..SurfaceMaterial::MATTE
        }
    }
}

struct Entry<T> {
    shape: T,
    material: SurfaceMaterial,
    casts_shadow: bool,
}

impl<T> Entry<T> {
    fn new(shape: T, material: SurfaceMaterial) -> Entry<T> {
        Entry {
            shape,
            material,
            casts_shadow: true,
        }
    }
}

/// Ids of the animated primitives of the standard room.
struct Rig {
    swinging_light: PrimitiveId,
    bouncing_ball: PrimitiveId,
    spinning_cuboid: PrimitiveId,
}

pub struct Scene {
    quads: Vec<Entry<Quad>>,
    spheres: Vec<Entry<Sphere>>,
    planes: Vec<Entry<Plane>>,
    cuboids: Vec<Entry<Cuboid>>,
    tori: Vec<Entry<Torus>>,
    light: Option<PrimitiveId>,
    light_color: Rgb,
    rig: Option<Rig>,
    time: FloatType,
}

impl Scene {
    pub fn empty() -> Scene {
        Scene {
            quads: Vec::new(),
            spheres: Vec::new(),
            planes: Vec::new(),
            cuboids: Vec::new(),
            tori: Vec::new(),
            light: None,
            light_color: BLACK,
            rig: None,
            time: 0.0,
        }
    }

    /// The animated demo scene: a closed room with a swinging light quad,
    /// a bouncing mirror ball, a spinning glass cuboid, a glass torus and
    /// an oversized sphere rounding off the back corners.
    pub fn standard_room(textures: &WallTextures) -> Scene {
        let mut scene = Scene::empty();

        let light = scene.add_quad(Quad::new(1.0, Placement::identity()), SurfaceMaterial::MATTE);
        scene.mark_light(light, Rgb::new(24.0, 24.0, 22.0));

        let ball = scene.add_sphere(
            Sphere::new(WorldPoint::origin(), 0.6),
            SurfaceMaterial::mirror(),
        );

        let corners = scene.add_sphere(
            Sphere::new(point![0.0, 2.5, -3.07], 8.0),
            SurfaceMaterial::MATTE,
        );
        scene.exclude_from_shadows(corners);

        let cuboid = scene.add_cuboid(
            Cuboid::new(
                WorldPoint::origin(),
                vector![1.15, 1.15, 1.15],
                Placement::identity(),
            ),
            SurfaceMaterial::glass(Rgb::new(0.5, 0.0, 0.5)),
        );

        let side_u = || PlanarProjection {
            axis: vector![0.0, 0.0, 1.0],
            offset: -4.0,
            scale: 7.0,
        };
        let finish = |texture: &Option<texture::TextureRef>, u: PlanarProjection| match texture {
            Some(texture) => PlaneFinish::Textured {
                texture: texture.clone(),
                u,
                v: PlanarProjection {
                    axis: vector![0.0, -1.0, 0.0],
                    offset: 2.0,
                    scale: 3.0,
                },
            },
            None => PlaneFinish::Uniform(gray(DEFAULT_ALBEDO)),
        };

        let walls = [
            (
                Plane::new(
                    vector![1.0, 0.0, 0.0],
                    3.0,
                    finish(&textures.left, side_u()),
                ),
                SurfaceMaterial::MATTE,
            ),
            (
                Plane::new(
                    vector![-1.0, 0.0, 0.0],
                    2.99,
                    finish(&textures.right, side_u()),
                ),
                SurfaceMaterial::MATTE,
            ),
            (
                Plane::new(vector![0.0, 1.0, 0.0], 1.0, PlaneFinish::Checkerboard),
                SurfaceMaterial {
                    reflectivity: 0.3,
                    ..SurfaceMaterial::MATTE
                },
            ),
            (
                Plane::new(
                    vector![0.0, -1.0, 0.0],
                    2.0,
                    PlaneFinish::Uniform(gray(DEFAULT_ALBEDO)),
                ),
                SurfaceMaterial::MATTE,
            ),
            (
                Plane::new(
                    vector![0.0, 0.0, 1.0],
                    3.0,
                    PlaneFinish::Uniform(gray(DEFAULT_ALBEDO)),
                ),
                SurfaceMaterial::MATTE,
            ),
            (
                Plane::new(
                    vector![0.0, 0.0, -1.0],
                    3.99,
                    finish(
                        &textures.back,
                        PlanarProjection {
                            axis: vector![1.0, 0.0, 0.0],
                            offset: 4.0,
                            scale: 8.0,
                        },
                    ),
                ),
                SurfaceMaterial::MATTE,
            ),
        ];
        for (plane, material) in walls {
            let id = scene.add_plane(plane, material);
            scene.exclude_from_shadows(id);
        }

        scene.add_torus(
            Torus::new(
                0.8,
                0.25,
                Placement::new(
                    Isometry3::translation(-0.25, 0.0, 2.0)
                        * Isometry3::rotation(Vector3::x() * (PI / 4.0)),
                ),
            ),
            SurfaceMaterial::glass(BLACK),
        );

        scene.rig = Some(Rig {
            swinging_light: light,
            bouncing_ball: ball,
            spinning_cuboid: cuboid,
        });
        scene.set_time(0.0);
        scene
    }

    pub fn add_quad(&mut self, quad: Quad, material: SurfaceMaterial) -> PrimitiveId {
        self.quads.push(Entry::new(quad, material));
        PrimitiveId::new(PrimitiveKind::Quad, self.quads.len() - 1)
    }

    pub fn add_sphere(&mut self, sphere: Sphere, material: SurfaceMaterial) -> PrimitiveId {
        self.spheres.push(Entry::new(sphere, material));
        PrimitiveId::new(PrimitiveKind::Sphere, self.spheres.len() - 1)
    }

    pub fn add_plane(&mut self, plane: Plane, material: SurfaceMaterial) -> PrimitiveId {
        self.planes.push(Entry::new(plane, material));
        PrimitiveId::new(PrimitiveKind::Plane, self.planes.len() - 1)
    }

    pub fn add_cuboid(&mut self, cuboid: Cuboid, material: SurfaceMaterial) -> PrimitiveId {
        self.cuboids.push(Entry::new(cuboid, material));
        PrimitiveId::new(PrimitiveKind::Cuboid, self.cuboids.len() - 1)
    }

    pub fn add_torus(&mut self, torus: Torus, material: SurfaceMaterial) -> PrimitiveId {
        self.tori.push(Entry::new(torus, material));
        PrimitiveId::new(PrimitiveKind::Torus, self.tori.len() - 1)
    }

    /// Declares a quad to be the area light of the scene.
    pub fn mark_light(&mut self, id: PrimitiveId, color: Rgb) {
        assert2::assert!(id.kind == PrimitiveKind::Quad);
        self.light = Some(id);
        self.light_color = color;
    }

    /// Removes a primitive from shadow-ray queries. Used for room walls
    /// (nothing outside the room to shadow) and decorative geometry.
    pub fn exclude_from_shadows(&mut self, id: PrimitiveId) {
        let index = id.index as usize;
        match id.kind {
            PrimitiveKind::Quad => self.quads[index].casts_shadow = false,
            PrimitiveKind::Sphere => self.spheres[index].casts_shadow = false,
            PrimitiveKind::Plane => self.planes[index].casts_shadow = false,
            PrimitiveKind::Cuboid => self.cuboids[index].casts_shadow = false,
            PrimitiveKind::Torus => self.tori[index].casts_shadow = false,
        }
    }

    pub fn time(&self) -> FloatType {
        self.time
    }

    /// Poses the animated primitives for the given time. Idempotent, and
    /// the default pose is time zero. Per-frame updates give animation;
    /// per-ray updates would give motion blur.
    pub fn set_time(&mut self, time: FloatType) {
        self.time = time;
        let Some(rig) = &self.rig else {
            return;
        };

        let swing = Isometry3::translation(0.0, 2.6, 2.0)
            * Isometry3::rotation(Vector3::z() * ((time * 0.6).sin() * 0.1))
            * Isometry3::translation(0.0, -0.9, 0.0);
        self.quads[rig.swinging_light.index as usize]
            .shape
            .set_placement(Placement::new(swing));

        let spin = Isometry3::translation(1.8, 0.0, 2.5)
            * Isometry3::rotation(Vector3::y() * (time * 0.5))
            * Isometry3::rotation(Vector3::x() * (PI / 4.0))
            * Isometry3::rotation(Vector3::z() * (PI / 4.0));
        self.cuboids[rig.spinning_cuboid.index as usize]
            .shape
            .set_placement(Placement::new(spin));

        let bounce = 1.0 - (time % 2.0 - 1.0) * (time % 2.0 - 1.0);
        self.spheres[rig.bouncing_ball.index as usize]
            .shape
            .set_center(point![-1.8, -0.4 + bounce, 1.0]);
    }

    /// Min-reduces the ray against every primitive in the scene.
    pub fn find_nearest(&self, ray: &mut Ray) {
        for (i, entry) in self.planes.iter().enumerate() {
            entry
                .shape
                .intersect(ray, PrimitiveId::new(PrimitiveKind::Plane, i));
        }
        for (i, entry) in self.quads.iter().enumerate() {
            entry
                .shape
                .intersect(ray, PrimitiveId::new(PrimitiveKind::Quad, i));
        }
        for (i, entry) in self.spheres.iter().enumerate() {
            entry
                .shape
                .intersect(ray, PrimitiveId::new(PrimitiveKind::Sphere, i));
        }
        for (i, entry) in self.cuboids.iter().enumerate() {
            entry
                .shape
                .intersect(ray, PrimitiveId::new(PrimitiveKind::Cuboid, i));
        }
        for (i, entry) in self.tori.iter().enumerate() {
            entry
                .shape
                .intersect(ray, PrimitiveId::new(PrimitiveKind::Torus, i));
        }
    }

    /// Any-hit query for shadow rays; primitives excluded from shadows are
    /// skipped. Cheaper shapes are tried first.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        if self
            .cuboids
            .iter()
            .any(|e| e.casts_shadow && e.shape.is_occluded(ray))
        {
            return true;
        }
        if self
            .spheres
            .iter()
            .any(|e| e.casts_shadow && e.shape.is_occluded(ray))
        {
            return true;
        }
        if self
            .quads
            .iter()
            .any(|e| e.casts_shadow && e.shape.is_occluded(ray))
        {
            return true;
        }
        if self
            .tori
            .iter()
            .any(|e| e.casts_shadow && e.shape.is_occluded(ray))
        {
            return true;
        }
        self.planes
            .iter()
            .any(|e| e.casts_shadow && e.shape.is_occluded(ray))
    }

    /// Surface normal at `point`, flipped towards the incoming ray so that
    /// backside and inside hits get a usable shading frame.
    pub fn normal(
        &self,
        id: PrimitiveId,
        point: &WorldPoint,
        incoming: &WorldVector,
    ) -> WorldVector {
        let index = id.index as usize;
        let normal = match id.kind {
            PrimitiveKind::Quad => self.quads[index].shape.normal(point),
            PrimitiveKind::Sphere => self.spheres[index].shape.normal(point),
            PrimitiveKind::Plane => self.planes[index].shape.normal(point),
            PrimitiveKind::Cuboid => self.cuboids[index].shape.normal(point),
            PrimitiveKind::Torus => self.tori[index].shape.normal(point),
        };
        if normal.dot(incoming) > 0.0 {
            -normal
        } else {
            normal
        }
    }

    pub fn albedo(&self, id: PrimitiveId, point: &WorldPoint) -> Rgb {
        let index = id.index as usize;
        match id.kind {
            PrimitiveKind::Quad => self.quads[index].shape.albedo(point),
            PrimitiveKind::Sphere => self.spheres[index].shape.albedo(point),
            PrimitiveKind::Plane => self.planes[index].shape.albedo(point),
            PrimitiveKind::Cuboid => self.cuboids[index].shape.albedo(point),
            PrimitiveKind::Torus => self.tori[index].shape.albedo(point),
        }
    }

    fn material(&self, id: PrimitiveId) -> &SurfaceMaterial {
        let index = id.index as usize;
        match id.kind {
            PrimitiveKind::Quad => &self.quads[index].material,
            PrimitiveKind::Sphere => &self.spheres[index].material,
            PrimitiveKind::Plane => &self.planes[index].material,
            PrimitiveKind::Cuboid => &self.cuboids[index].material,
            PrimitiveKind::Torus => &self.tori[index].material,
        }
    }

    pub fn reflectivity(&self, id: PrimitiveId) -> FloatType {
        self.material(id).reflectivity
    }

    pub fn refractivity(&self, id: PrimitiveId) -> FloatType {
        self.material(id).refractivity
    }

    pub fn absorption(&self, id: PrimitiveId) -> Rgb {
        self.material(id).absorption
    }

    fn light_quad(&self) -> Option<&Quad> {
        self.light.map(|id| &self.quads[id.index as usize].shape)
    }

    /// Point light approximation: the middle of the light quad, nudged
    /// towards its emitting side.
    pub fn light_position(&self) -> WorldPoint {
        match self.light_quad() {
            Some(quad) => {
                quad.placement().to_world_point(&WorldPoint::origin()) - vector![0.0, 0.01, 0.0]
            }
            None => WorldPoint::origin(),
        }
    }

    pub fn light_color(&self) -> Rgb {
        self.light_color
    }

    /// Uniform point on the light quad; `r0` and `r1` are unit interval
    /// random numbers.
    pub fn random_point_on_light(&self, r0: FloatType, r1: FloatType) -> WorldPoint {
        let Some(quad) = self.light_quad() else {
            return WorldPoint::origin();
        };
        let corner1 = quad.corner(-1.0, -1.0);
        let corner2 = quad.corner(1.0, -1.0);
        let corner3 = quad.corner(-1.0, 1.0);
        corner1 + r0 * (corner2 - corner1) + r1 * (corner3 - corner1)
    }

    pub fn sample_point_on_light(&self, rng: &mut impl Rng) -> WorldPoint {
        self.random_point_on_light(rng.random(), rng.random())
    }

    /// The light quad's corners, clockwise, for solid angle sampling.
    pub fn light_quad_corners(&self) -> Option<[WorldPoint; 4]> {
        self.light_quad().map(|quad| {
            [
                quad.corner(-1.0, 1.0),
                quad.corner(1.0, 1.0),
                quad.corner(1.0, -1.0),
                quad.corner(-1.0, -1.0),
            ]
        })
    }

    pub fn light_area(&self) -> FloatType {
        match self.light_quad() {
            Some(quad) => {
                let side = quad.half_size() * 2.0;
                side * side
            }
            None => 0.0,
        }
    }

    pub fn light_count(&self) -> usize {
        self.light.iter().count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use assert2::assert;
    use itertools::Itertools;

    use crate::geometry::NO_HIT_T;

    #[test]
    fn escaping_ray_keeps_the_sentinel_distance() {
        let scene = Scene::empty();
        let mut ray = Ray::new(WorldPoint::origin(), vector![0.0, 1.0, 0.0]);
        scene.find_nearest(&mut ray);
        assert!(ray.hit == None);
        assert!(ray.t == NO_HIT_T);
    }

    #[test]
    fn nearest_hit_does_not_depend_on_insertion_order() {
        let distances = [4.0f32, 1.5, 3.0];

        for permutation in distances.iter().permutations(distances.len()) {
            let mut scene = Scene::empty();
            for &&distance in &permutation {
                scene.add_sphere(
                    Sphere::new(point![0.0, 0.0, distance], 0.5),
                    SurfaceMaterial::MATTE,
                );
            }

            let mut ray = Ray::new(WorldPoint::origin(), vector![0.0, 0.0, 1.0]);
            scene.find_nearest(&mut ray);
            assert!(ray.hit.is_some());
            assert_relative_eq!(ray.t, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn room_light_pose_at_time_zero() {
        let scene = Scene::standard_room(&WallTextures::default());

        // no swing deflection at t = 0, so the quad hangs straight down
        // from its pivot
        assert_relative_eq!(
            scene.light_position(),
            point![0.0, 1.69, 2.0],
            epsilon = 1e-5
        );
        assert_relative_eq!(scene.light_area(), 1.0);
        assert!(scene.light_count() == 1);

        let corners = scene.light_quad_corners().unwrap();
        assert_relative_eq!(corners[0], point![-0.5, 1.7, 2.5], epsilon = 1e-5);
        assert_relative_eq!(corners[2], point![0.5, 1.7, 1.5], epsilon = 1e-5);
    }

    #[test]
    fn set_time_is_idempotent() {
        let mut scene = Scene::standard_room(&WallTextures::default());
        scene.set_time(0.7);
        let first = scene.light_position();

        scene.set_time(1.3);
        scene.set_time(0.7);
        assert!(scene.time() == 0.7);
        assert_relative_eq!(scene.light_position(), first);
    }

    #[test]
    fn animated_placements_keep_a_consistent_inverse() {
        let mut scene = Scene::standard_room(&WallTextures::default());
        let probe = point![0.3, -0.7, 1.1];

        for step in 0..20 {
            scene.set_time(step as f32 * 0.35);
            for entry in scene.quads.iter().map(|e| e.shape.placement()).chain(
                scene.cuboids.iter().map(|e| e.shape.placement()),
            ) {
                let round_trip = entry.to_local_point(&entry.to_world_point(&probe));
                assert_relative_eq!(round_trip, probe, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn ball_bounces_with_period_two() {
        let mut scene = Scene::standard_room(&WallTextures::default());

        // at integer times the ball rests at the bottom of its arc
        for time in [0.0, 2.0, 4.0] {
            scene.set_time(time);
            let mut ray = Ray::new(point![-1.8, -0.4, -2.5], vector![0.0, 0.0, 1.0]);
            scene.find_nearest(&mut ray);
            let hit = ray.hit.unwrap();
            assert!(hit.kind == PrimitiveKind::Sphere);
            assert_relative_eq!(ray.t, 3.5 - 0.6, epsilon = 1e-3);
        }

        // at odd times it is at the top
        scene.set_time(1.0);
        let mut ray = Ray::new(point![-1.8, 0.6, -2.5], vector![0.0, 0.0, 1.0]);
        scene.find_nearest(&mut ray);
        assert!(ray.hit.unwrap().kind == PrimitiveKind::Sphere);
    }

    #[test]
    fn walls_do_not_occlude() {
        let scene = Scene::standard_room(&WallTextures::default());

        // shadow ray from the room center towards the floor
        let ray = Ray::with_max_distance(point![0.8, 0.0, -1.0], vector![0.0, -1.0, 0.0], 10.0);
        assert!(!scene.is_occluded(&ray));
    }

    #[test]
    fn glass_cuboid_occludes() {
        let scene = Scene::standard_room(&WallTextures::default());

        // the cuboid spins around (1.8, 0, 2.5); aim straight at it
        let ray = Ray::with_max_distance(point![1.8, 0.0, 0.0], vector![0.0, 0.0, 1.0], 10.0);
        assert!(scene.is_occluded(&ray));
    }

    #[test]
    fn normals_face_the_incoming_ray() {
        let scene = Scene::standard_room(&WallTextures::default());

        let mut ray = Ray::new(point![0.0, 0.0, -1.0], vector![0.0, -1.0, 0.0]);
        scene.find_nearest(&mut ray);
        let floor = ray.hit.unwrap();
        assert!(floor.kind == PrimitiveKind::Plane);

        let point = ray.hit_point();
        let from_above = scene.normal(floor, &point, &vector![0.0, -1.0, 0.0]);
        let from_below = scene.normal(floor, &point, &vector![0.0, 1.0, 0.0]);
        assert_relative_eq!(from_above, vector![0.0, 1.0, 0.0]);
        assert_relative_eq!(from_below, vector![0.0, -1.0, 0.0]);
    }

    #[test]
    fn light_sampling_covers_the_quad() {
        let scene = Scene::standard_room(&WallTextures::default());

        let center = scene.random_point_on_light(0.5, 0.5);
        assert_relative_eq!(center, point![0.0, 1.7, 2.0], epsilon = 1e-5);

        let corners = scene.light_quad_corners().unwrap();
        assert_relative_eq!(scene.random_point_on_light(0.0, 0.0), corners[3], epsilon = 1e-5);
    }

    #[test]
    fn sampled_light_points_stay_on_the_quad() {
        use rand::SeedableRng;

        let scene = Scene::standard_room(&WallTextures::default());
        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let point = scene.sample_point_on_light(&mut rng);
            assert_relative_eq!(point.y, 1.7, epsilon = 1e-5);
            assert!(point.x >= -0.5 && point.x <= 0.5);
            assert!(point.z >= 1.5 && point.z <= 2.5);
        }
    }

    #[test]
    fn floor_is_the_only_reflective_wall() {
        let scene = Scene::standard_room(&WallTextures::default());

        let mut reflective = 0;
        for i in 0..scene.planes.len() {
            let id = PrimitiveId::new(PrimitiveKind::Plane, i);
            if scene.reflectivity(id) > 0.0 {
                reflective += 1;
                assert!(scene.reflectivity(id) == 0.3);
            }
        }
        assert!(reflective == 1);
    }
}
