mod placement;

pub use placement::Placement;

pub type FloatType = f32;

/// Geometric offset used to avoid self intersections of spawned rays.
pub const EPSILON: FloatType = 1e-4;

/// Sentinel distance meaning "no intersection found yet".
pub const NO_HIT_T: FloatType = 1e30;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type ScreenPoint = nalgebra::Point2<u32>;
pub type ScreenSize = nalgebra::Vector2<u32>;

/// The five analytic shapes a ray can hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Quad,
    Sphere,
    Plane,
    Cuboid,
    Torus,
}

/// Identifies one primitive instance as a (kind, per-kind arena index) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveId {
    pub kind: PrimitiveKind,
    pub index: u32,
}

impl PrimitiveId {
    pub fn new(kind: PrimitiveKind, index: usize) -> PrimitiveId {
        PrimitiveId {
            kind,
            index: index as u32,
        }
    }
}

/// Scene intersection query. The origin/direction pair is fixed at
/// construction; `t` and `hit` accumulate the nearest hit found so far and
/// only ever move closer. Intersection tests against a set of primitives can
/// therefore run in any order and still produce the same result.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,
    /// Distance to the nearest hit found so far, `NO_HIT_T` before one exists
    pub t: FloatType,
    pub hit: Option<PrimitiveId>,
    /// True while the ray travels inside a dielectric medium
    pub inside: bool,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray::with_max_distance(origin, direction, NO_HIT_T)
    }

    /// A ray that only accepts hits closer than `max_distance`.
    /// Shadow rays use this to stop short of the light itself.
    pub fn with_max_distance(
        origin: WorldPoint,
        direction: WorldVector,
        max_distance: FloatType,
    ) -> Ray {
        let direction = direction.normalize();

        Ray {
            origin,
            direction,
            t: max_distance,
            hit: None,
            inside: false,
        }
    }

    pub fn hit_point(&self) -> WorldPoint {
        self.origin + self.direction * self.t
    }

    /// Registers a hit candidate; keeps only strictly positive distances
    /// strictly closer than the current nearest.
    pub fn register_hit(&mut self, t: FloatType, id: PrimitiveId) {
        if t > 0.0 && t < self.t {
            self.t = t;
            self.hit = Some(id);
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;

    pub fn simple_float() -> BoxedStrategy<f32> {
        any::<i32>().prop_map(|n| n as f32 * 1e-6).boxed()
    }

    pub fn nonzero_world_vector() -> BoxedStrategy<WorldVector> {
        (simple_float(), simple_float(), simple_float())
            .prop_filter_map("vector is zero", |coords| {
                let vector = WorldVector::new(coords.0, coords.1, coords.2);
                if vector.norm() < 1e-6 { None } else { Some(vector) }
            })
            .boxed()
    }

    pub fn world_point() -> BoxedStrategy<WorldPoint> {
        (simple_float(), simple_float(), simple_float())
            .prop_map(|coords| WorldPoint::new(coords.0, coords.1, coords.2))
            .boxed()
    }

    #[test]
    fn new_ray_is_a_miss() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(1.0, 0.0, 0.0));
        assert!(ray.t == NO_HIT_T);
        assert!(ray.hit == None);
        assert!(!ray.inside);
    }

    #[test]
    fn register_hit_is_a_min_reduction() {
        let a = PrimitiveId::new(PrimitiveKind::Sphere, 0);
        let b = PrimitiveId::new(PrimitiveKind::Torus, 1);

        let mut ray = Ray::new(WorldPoint::origin(), WorldVector::new(1.0, 0.0, 0.0));
        ray.register_hit(5.0, a);
        ray.register_hit(3.0, b);
        ray.register_hit(4.0, a);
        assert!(ray.t == 3.0);
        assert!(ray.hit == Some(b));

        // negative and zero candidates never count
        ray.register_hit(-1.0, a);
        ray.register_hit(0.0, a);
        assert!(ray.t == 3.0);
        assert!(ray.hit == Some(b));
    }

    #[test]
    fn register_hit_respects_max_distance() {
        let id = PrimitiveId::new(PrimitiveKind::Quad, 0);
        let mut ray = Ray::with_max_distance(
            WorldPoint::origin(),
            WorldVector::new(0.0, 1.0, 0.0),
            2.0,
        );
        ray.register_hit(2.5, id);
        assert!(ray.hit == None);
        ray.register_hit(1.5, id);
        assert!(ray.hit == Some(id));
    }

    #[test_strategy::proptest]
    fn direction_is_normalized(
        #[strategy(world_point())] origin: WorldPoint,
        #[strategy(nonzero_world_vector())] direction: WorldVector,
    ) {
        let ray = Ray::new(origin, direction);
        prop_assert!((ray.direction.norm() - 1.0).abs() < 1e-4);
    }

    #[test_strategy::proptest]
    fn hit_point_lies_on_the_ray(
        #[strategy(world_point())] origin: WorldPoint,
        #[strategy(nonzero_world_vector())] direction: WorldVector,
        #[strategy(0.0f32..100.0)] t: f32,
    ) {
        let mut ray = Ray::new(origin, direction);
        ray.register_hit(t, PrimitiveId::new(PrimitiveKind::Sphere, 0));
        if ray.hit.is_some() {
            let expected = origin + ray.direction * t;
            prop_assert!((ray.hit_point() - expected).norm() < 1e-3);
        }
    }
}
