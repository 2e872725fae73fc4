use crate::geometry::{FloatType, Placement, PrimitiveId, Ray, WorldPoint, WorldVector};
use crate::util::{Rgb, gray};

// -----------------------------------------------------------
// Torus
// Implicit degree-4 surface around the object-space z axis,
// defined by the ring radius and the tube radius. The ray/torus
// quartic is reduced to a depressed cubic through the standard
// resolvent substitution; quartic roots are then recovered from
// the cubic root. Solver layout follows Inigo Quilez's
// ShaderToy 4sBGDy formulation.
// -----------------------------------------------------------
pub struct Torus {
    ring2: FloatType,
    tube2: FloatType,
    /// Squared radius of the bounding sphere, (ring + tube)^2
    bound2: FloatType,
    placement: Placement,
}

impl Torus {
    pub fn new(ring_radius: FloatType, tube_radius: FloatType, placement: Placement) -> Torus {
        assert2::assert!(ring_radius > tube_radius && tube_radius > 0.0);
        Torus {
            ring2: ring_radius * ring_radius,
            tube2: tube_radius * tube_radius,
            bound2: (ring_radius + tube_radius) * (ring_radius + tube_radius),
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

        // grazing extension rays need f64 through the whole solve
        let rc2 = self.ring2 as f64;
        let rt2 = self.tube2 as f64;
        let o = o.cast::<f64>();
        let d = d.cast::<f64>();

        let mut po = 1.0f64;
        let m = o.coords.dot(&o.coords);
        let mut k3 = o.coords.dot(&d);
        let mut k32 = k3 * k3;

        // bounding sphere test
        if k32 < m - self.bound2 as f64 {
            return;
        }

        // coefficients of the quartic in ray parameter t
        let k = (m - rt2 - rc2) * 0.5;
        let mut k2 = k32 + rc2 * d.z * d.z + k;
        let mut k1 = k * k3 + rc2 * o.z * d.z;
        let mut k0 = k * k + rc2 * o.z * o.z - rc2 * rt2;

        // the resolvent is unstable when the cubic term nearly vanishes;
        // solve for the reciprocal roots instead
        if (k3 * (k32 - k2) + k1).abs() < 1e-4 {
            std::mem::swap(&mut k1, &mut k3);
            po = -1.0;
            k0 = 1.0 / k0;
            k1 *= k0;
            k2 *= k0;
            k3 *= k0;
            k32 = k3 * k3;
        }

        let mut c2 = 2.0 * k2 - 3.0 * k32;
        let c1 = k3 * (k32 - k2) + k1;
        let mut c0 = k3 * (k3 * (-3.0 * k32 + 4.0 * k2) - 8.0 * k1) + 4.0 * k0;
        c2 /= 3.0;
        let c1 = c1 * 2.0;
        c0 /= 3.0;

        let q = c2 * c2 + c0;
        let r = 3.0 * c0 * c2 - c2 * c2 * c2 - c1 * c1;
        let h = r * r - q * q * q;
        let z = if h < 0.0 {
            // three real cubic roots: trigonometric solution
            let sq = q.sqrt();
            2.0 * sq * ((r / (sq * q)).acos() / 3.0).cos()
        } else {
            // one real cubic root: Cardano
            let sq = (h.sqrt() + r.abs()).cbrt();
            (sq + q / sq).abs().copysign(r)
        };
        let z = c2 - z;

        let mut d1 = z - 3.0 * c2;
        let mut d2 = z * z - 3.0 * c0;
        if d1.abs() < 1e-8 {
            if d2 < 0.0 {
                return;
            }
            d2 = d2.sqrt();
        } else {
            if d1 < 0.0 {
                return;
            }
            d1 = (d1 * 0.5).sqrt();
            d2 = c1 / d1;
        }

        // up to four quartic roots, keep the smallest positive one
        let mut t = 1e20f64;
        let h = d1 * d1 - z + d2;
        if h > 0.0 {
            let h = h.sqrt();
            let t1 = -d1 - h - k3;
            let t2 = -d1 + h - k3;
            let t1 = if po < 0.0 { 2.0 / t1 } else { t1 };
            let t2 = if po < 0.0 { 2.0 / t2 } else { t2 };
            if t1 > 0.0 {
                t = t1;
            }
            if t2 > 0.0 {
                t = t.min(t2);
            }
        }
        let h = d1 * d1 - z - d2;
        if h > 0.0 {
            let h = h.sqrt();
            let t1 = d1 - h - k3;
            let t2 = d1 + h - k3;
            let t1 = if po < 0.0 { 2.0 / t1 } else { t1 };
            let t2 = if po < 0.0 { 2.0 / t2 } else { t2 };
            if t1 > 0.0 {
                t = t.min(t1);
            }
            if t2 > 0.0 {
                t = t.min(t2);
            }
        }

        if t < 1e19 {
            ray.register_hit(t as FloatType, id);
        }
    }

    /// Shadow-ray fast path: single precision with looser degeneracy
    /// thresholds, since only a boolean is needed.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let o = self.placement.to_local_point(&ray.origin);
        let d = self.placement.to_local_vector(&ray.direction);

        let rc2 = self.ring2;
        let rt2 = self.tube2;

        let mut po = 1.0f32;
        let m = o.coords.dot(&o.coords);
        let mut k3 = o.coords.dot(&d);
        let mut k32 = k3 * k3;

        if k32 < m - self.bound2 {
            return false;
        }

        let k = (m - rt2 - rc2) * 0.5;
        let mut k2 = k32 + rc2 * d.z * d.z + k;
        let mut k1 = k * k3 + rc2 * o.z * d.z;
        let mut k0 = k * k + rc2 * o.z * o.z - rc2 * rt2;

        if (k3 * (k32 - k2) + k1).abs() < 0.01 {
            std::mem::swap(&mut k1, &mut k3);
            po = -1.0;
            k0 = 1.0 / k0;
            k1 *= k0;
            k2 *= k0;
            k3 *= k0;
            k32 = k3 * k3;
        }

        let mut c2 = 2.0 * k2 - 3.0 * k32;
        let c1 = k3 * (k32 - k2) + k1;
        let mut c0 = k3 * (k3 * (-3.0 * k32 + 4.0 * k2) - 8.0 * k1) + 4.0 * k0;
        c2 /= 3.0;
        let c1 = c1 * 2.0;
        c0 /= 3.0;

        let q = c2 * c2 + c0;
        let r = 3.0 * c0 * c2 - c2 * c2 * c2 - c1 * c1;
        let h = r * r - q * q * q;
        let z = if h < 0.0 {
            let sq = q.sqrt();
            2.0 * sq * ((r / (sq * q)).acos() / 3.0).cos()
        } else {
            let sq = (h.sqrt() + r.abs()).cbrt();
            (sq + q / sq).abs().copysign(r)
        };
        let z = c2 - z;

        let mut d1 = z - 3.0 * c2;
        let mut d2 = z * z - 3.0 * c0;
        if d1.abs() < 1e-4 {
            if d2 < 0.0 {
                return false;
            }
            d2 = d2.sqrt();
        } else {
            if d1 < 0.0 {
                return false;
            }
            d1 = (d1 * 0.5).sqrt();
            d2 = c1 / d1;
        }

        let h = d1 * d1 - z + d2;
        if h > 0.0 {
            let t1 = -d1 - h.sqrt() - k3;
            let t1 = if po < 0.0 { 2.0 / t1 } else { t1 };
            if t1 > 0.0 && t1 < ray.t {
                return true;
            }
        }
        let h = d1 * d1 - z - d2;
        if h > 0.0 {
            let t1 = d1 - h.sqrt() - k3;
            let t1 = if po < 0.0 { 2.0 / t1 } else { t1 };
            if t1 > 0.0 && t1 < ray.t {
                return true;
            }
        }

        false
    }

    pub fn normal(&self, point: &WorldPoint) -> WorldVector {
        let l = self.placement.to_local_point(point);
        let ll = l.coords.dot(&l.coords);
        // gradient of the implicit torus function, up to a constant factor
        let n = WorldVector::new(
            l.x * (ll - self.tube2 - self.ring2),
            l.y * (ll - self.tube2 - self.ring2),
            l.z * (ll - self.tube2 + self.ring2),
        )
        .normalize();
        self.placement.to_world_vector(&n)
    }

    pub fn albedo(&self, _point: &WorldPoint) -> Rgb {
        gray(1.0)
    }
}
