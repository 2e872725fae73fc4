use nalgebra::Unit;

use crate::geometry::{FloatType, Placement, PrimitiveId, Ray, WorldPoint, WorldVector};
use crate::scene::texture::TextureRef;
use crate::util::{Rgb, gray};

pub const DEFAULT_ALBEDO: FloatType = 0.93;

// -----------------------------------------------------------
// Sphere
// Basic sphere with explicit support for rays that start inside
// it, so it can carry a dielectric material.
// -----------------------------------------------------------
pub struct Sphere {
    center: WorldPoint,
    radius2: FloatType,
    inv_radius: FloatType,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType) -> Sphere {
        assert2::assert!(radius > 0.0);
        Sphere {
            center,
            radius2: radius * radius,
            inv_radius: 1.0 / radius,
        }
    }

    /// Moves the sphere; used by the bounce animation.
    pub fn set_center(&mut self, center: WorldPoint) {
        self.center = center;
    }

    pub fn center(&self) -> WorldPoint {
        self.center
    }

    pub fn intersect(&self, ray: &mut Ray, id: PrimitiveId) {
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius2;
        let d = b * b - c;
        if d <= 0.0 {
            return;
        }

        let d = d.sqrt();
        let t = -b - d;
        if t > 0.0 {
            // a positive near root means the origin is outside, so the far
            // root can never be closer
            ray.register_hit(t, id);
            return;
        }

        if c > 0.0 {
            return;
        }

        ray.register_hit(d - b, id);
    }

    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius2;
        let d = b * b - c;
        if d <= 0.0 {
            return false;
        }

        let t = -b - d.sqrt();
        t < ray.t && t > 0.0
    }

    pub fn normal(&self, point: &WorldPoint) -> WorldVector {
        (point - self.center) * self.inv_radius
    }

    pub fn albedo(&self, _point: &WorldPoint) -> Rgb {
        gray(DEFAULT_ALBEDO)
    }
}

// -----------------------------------------------------------
// Plane
// Infinite plane defined by a unit normal and a distance from
// the origin (in the direction of the normal).
// -----------------------------------------------------------
pub struct Plane {
    normal: Unit<WorldVector>,
    distance: FloatType,
    finish: PlaneFinish,
}

/// How a plane's albedo varies over its surface.
pub enum PlaneFinish {
    Uniform(Rgb),
    /// Floor checkerboard with two deliberately aliasing tiles
    /// (high-frequency detail for filtering experiments).
    Checkerboard,
    Textured {
        texture: TextureRef,
        u: PlanarProjection,
        v: PlanarProjection,
    },
}

/// One texture axis of a planar projection: `(p . axis + offset) / scale`.
pub struct PlanarProjection {
    pub axis: WorldVector,
    pub offset: FloatType,
    pub scale: FloatType,
}

impl PlanarProjection {
    fn project(&self, point: &WorldPoint) -> FloatType {
        (point.coords.dot(&self.axis) + self.offset) / self.scale
    }
}

impl Plane {
    pub fn new(normal: WorldVector, distance: FloatType, finish: PlaneFinish) -> Plane {
        Plane {
            normal: Unit::new_normalize(normal),
            distance,
            finish,
        }
    }

    pub fn intersect(&self, ray: &mut Ray, id: PrimitiveId) {
        // a near-parallel ray yields +-infinity here, rejected by the guards
        let t = -(ray.origin.coords.dot(&self.normal) + self.distance)
            / ray.direction.dot(&self.normal);
        ray.register_hit(t, id);
    }

    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let t = -(ray.origin.coords.dot(&self.normal) + self.distance)
            / ray.direction.dot(&self.normal);
        t < ray.t && t > 0.0
    }

    pub fn normal(&self, _point: &WorldPoint) -> WorldVector {
        self.normal.into_inner()
    }

    pub fn albedo(&self, point: &WorldPoint) -> Rgb {
        match &self.finish {
            PlaneFinish::Uniform(color) => *color,
            PlaneFinish::Checkerboard => {
                let mut ix = (point.x * 2.0 + 96.01) as i32;
                let mut iz = (point.z * 2.0 + 96.01) as i32;
                // two tiles alias on purpose
                if ix == 98 && iz == 98 {
                    ix = (point.x * 32.01) as i32;
                    iz = (point.z * 32.01) as i32;
                }
                if ix == 94 && iz == 98 {
                    ix = (point.x * 64.01) as i32;
                    iz = (point.z * 64.01) as i32;
                }
                if (ix + iz) & 1 != 0 { gray(1.0) } else { gray(0.3) }
            }
            PlaneFinish::Textured { texture, u, v } => {
                texture.sample(u.project(point), v.project(point))
            }
        }
    }
}

// -----------------------------------------------------------
// Cuboid
// Oriented box: an axis-aligned box in object space plus a
// rigid placement. Rays are transformed into object space for
// the slab test.
// -----------------------------------------------------------
pub struct Cuboid {
    bounds: [WorldPoint; 2],
    placement: Placement,
}

impl Cuboid {
    pub fn new(center: WorldPoint, size: WorldVector, placement: Placement) -> Cuboid {
        Cuboid {
            bounds: [center - size * 0.5, center + size * 0.5],
            placement,
        }
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn intersect(&self, ray: &mut Ray, id: PrimitiveId) {
        let o = self.placement.to_local_point(&ray.origin);
        let d = self.placement.to_local_vector(&ray.direction);
        let b = &self.bounds;

        let rdx = 1.0 / d.x;
        let rdy = 1.0 / d.y;
        let rdz = 1.0 / d.z;
        let sign_x = (d.x < 0.0) as usize;
        let sign_y = (d.y < 0.0) as usize;
        let sign_z = (d.z < 0.0) as usize;

        let mut tmin = (b[sign_x].x - o.x) * rdx;
        let mut tmax = (b[1 - sign_x].x - o.x) * rdx;
        let tymin = (b[sign_y].y - o.y) * rdy;
        let tymax = (b[1 - sign_y].y - o.y) * rdy;
        if tmin > tymax || tymin > tmax {
            return;
        }
        tmin = tmin.max(tymin);
        tmax = tmax.min(tymax);
        let tzmin = (b[sign_z].z - o.z) * rdz;
        let tzmax = (b[1 - sign_z].z - o.z) * rdz;
        if tmin > tzmax || tzmin > tmax {
            return;
        }
        tmin = tmin.max(tzmin);
        tmax = tmax.min(tzmax);

        if tmin > 0.0 {
            ray.register_hit(tmin, id);
        } else {
            ray.register_hit(tmax, id);
        }
    }

    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let o = self.placement.to_local_point(&ray.origin);
        let d = self.placement.to_local_vector(&ray.direction);
        let b = &self.bounds;

        let rdx = 1.0 / d.x;
        let rdy = 1.0 / d.y;
        let rdz = 1.0 / d.z;
        let t1 = (b[0].x - o.x) * rdx;
        let t2 = (b[1].x - o.x) * rdx;
        let t3 = (b[0].y - o.y) * rdy;
        let t4 = (b[1].y - o.y) * rdy;
        let t5 = (b[0].z - o.z) * rdz;
        let t6 = (b[1].z - o.z) * rdz;
        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));
        tmax > 0.0 && tmin < tmax && tmin < ray.t
    }

    pub fn normal(&self, point: &WorldPoint) -> WorldVector {
        let p = self.placement.to_local_point(point);
        let b = &self.bounds;

        // pick the face the point is closest to
        let mut normal = WorldVector::new(-1.0, 0.0, 0.0);
        let mut min_dist = (p.x - b[0].x).abs();
        let candidates = [
            ((p.x - b[1].x).abs(), WorldVector::new(1.0, 0.0, 0.0)),
            ((p.y - b[0].y).abs(), WorldVector::new(0.0, -1.0, 0.0)),
            ((p.y - b[1].y).abs(), WorldVector::new(0.0, 1.0, 0.0)),
            ((p.z - b[0].z).abs(), WorldVector::new(0.0, 0.0, -1.0)),
            ((p.z - b[1].z).abs(), WorldVector::new(0.0, 0.0, 1.0)),
        ];
        for (dist, n) in candidates {
            if dist < min_dist {
                min_dist = dist;
                normal = n;
            }
        }

        self.placement.to_world_vector(&normal)
    }

    pub fn albedo(&self, _point: &WorldPoint) -> Rgb {
        gray(1.0)
    }
}

// -----------------------------------------------------------
// Quad
// Oriented finite square in the object-space horizontal plane,
// intended to be used as a light source.
// -----------------------------------------------------------
pub struct Quad {
    half_size: FloatType,
    placement: Placement,
}

impl Quad {
    pub fn new(size: FloatType, placement: Placement) -> Quad {
        assert2::assert!(size > 0.0);
        Quad {
            half_size: size * 0.5,
            placement,
        }
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn half_size(&self) -> FloatType {
        self.half_size
    }

    /// A corner of the quad in world space; `sx` and `sz` are +-1.
    pub fn corner(&self, sx: FloatType, sz: FloatType) -> WorldPoint {
        self.placement
            .to_world_point(&WorldPoint::new(sx * self.half_size, 0.0, sz * self.half_size))
    }

    pub fn intersect(&self, ray: &mut Ray, id: PrimitiveId) {
        let o = self.placement.to_local_point(&ray.origin);
        let d = self.placement.to_local_vector(&ray.direction);

        let t = o.y / -d.y;
        if t <= 0.0 || t >= ray.t {
            return;
        }

        let ix = o.x + t * d.x;
        let iz = o.z + t * d.z;
        if ix > -self.half_size
            && ix < self.half_size
            && iz > -self.half_size
            && iz < self.half_size
        {
            ray.t = t;
            ray.hit = Some(id);
        }
    }

    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let o = self.placement.to_local_point(&ray.origin);
        let d = self.placement.to_local_vector(&ray.direction);

        let t = o.y / -d.y;
        if t < ray.t && t > 0.0 {
            let ix = o.x + t * d.x;
            let iz = o.z + t * d.z;
            return ix > -self.half_size
                && ix < self.half_size
                && iz > -self.half_size
                && iz < self.half_size;
        }
        false
    }

    pub fn normal(&self, _point: &WorldPoint) -> WorldVector {
        self.placement
            .to_world_vector(&WorldVector::new(0.0, -1.0, 0.0))
    }

    pub fn albedo(&self, _point: &WorldPoint) -> Rgb {
        // the quad is a light; its "albedo" is the emitted radiance
        gray(10.0)
    }
}
