//! Recursive Whitted-style light transport.

use std::f32::consts::FRAC_1_PI;

use crate::geometry::{EPSILON, FloatType, Ray, WorldPoint, WorldVector};
use crate::scene::Scene;
use crate::util::{BLACK, Rgb, gray, modulate};

/// Specular bounce limit; rays that survive this many bounces go black.
pub const MAX_DEPTH: u32 = 5;

/// Index of refraction of all dielectrics in the scene.
const IOR_GLASS: FloatType = 1.2;

fn reflect(direction: &WorldVector, normal: &WorldVector) -> WorldVector {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Schlick's approximation of the Fresnel reflectance.
fn schlick(n1: FloatType, n2: FloatType, cos_i: FloatType) -> FloatType {
    let a = n1 - n2;
    let b = n1 + n2;
    let r0 = (a * a) / (b * b);
    let c = 1.0 - cos_i;
    r0 + (1.0 - r0) * c.powi(5)
}

/// Irradiance arriving at `point` from the scene light, treated as a
/// point light at the middle of the light quad.
pub fn direct_illumination(scene: &Scene, point: &WorldPoint, normal: &WorldVector) -> Rgb {
    let light = scene.light_position();
    let mut to_light = light - point;
    let distance = to_light.norm();
    to_light /= distance;

    let n_dot_l = normal.dot(&to_light);
    if n_dot_l < EPSILON {
        // facing away from the light
        return BLACK;
    }

    // stop the shadow ray just short of the light itself
    let shadow = Ray::with_max_distance(
        point + to_light * EPSILON,
        to_light,
        distance - 2.0 * EPSILON,
    );
    if scene.is_occluded(&shadow) {
        return BLACK;
    }

    let attenuation = 1.0 / (distance * distance);
    scene.light_color() * (attenuation * n_dot_l)
}

/// Evaluates the radiance travelling back along `ray`.
///
/// The ray is advanced to its nearest hit as a side effect, so the caller
/// can inspect `ray.t` and `ray.hit` afterwards.
pub fn trace(scene: &Scene, ray: &mut Ray, depth: u32) -> Rgb {
    scene.find_nearest(ray);
    let Some(hit) = ray.hit else {
        // ray left the scene
        return BLACK;
    };
    if depth > MAX_DEPTH {
        return BLACK;
    }

    let point = ray.hit_point();
    let normal = scene.normal(hit, &point, &ray.direction);
    let albedo = scene.albedo(hit, &point);

    let reflectivity = scene.reflectivity(hit);
    let refractivity = scene.refractivity(hit);
    let diffuseness = 1.0 - (reflectivity + refractivity);

    let mut out_radiance = BLACK;

    // pure speculars such as mirrors
    if reflectivity > 0.0 {
        let r = reflect(&ray.direction, &normal);
        let mut reflected = Ray::new(point + r * EPSILON, r);
        out_radiance += modulate(albedo, trace(scene, &mut reflected, depth + 1)) * reflectivity;
    }

    // dielectrics such as glass
    if refractivity > 0.0 {
        let r = reflect(&ray.direction, &normal);
        let mut reflected = Ray::new(point + r * EPSILON, r);

        let (n1, n2) = if ray.inside {
            (IOR_GLASS, 1.0)
        } else {
            (1.0, IOR_GLASS)
        };
        let eta = n1 / n2;
        let cos_i = -ray.direction.dot(&normal);
        let cos_t2 = 1.0 - eta * eta * (1.0 - cos_i * cos_i);

        // total internal reflection leaves everything to the mirror ray
        let mut fresnel = 1.0;
        if cos_t2 > 0.0 {
            fresnel = schlick(n1, n2, cos_i);
            let t = ray.direction * eta + normal * (eta * cos_i - cos_t2.abs().sqrt());
            let mut transmitted = Ray::new(point + t * EPSILON, t);
            transmitted.inside = !ray.inside;
            out_radiance +=
                modulate(albedo, trace(scene, &mut transmitted, depth + 1)) * (1.0 - fresnel);
        }
        out_radiance += modulate(albedo, trace(scene, &mut reflected, depth + 1)) * fresnel;
    }

    // diffuse remainder, lit directly plus a constant ambient term in
    // place of diffuse interreflection
    if diffuseness > 0.0 {
        let irradiance = direct_illumination(scene, &point, &normal);
        let brdf = albedo * FRAC_1_PI;
        out_radiance += modulate(brdf, irradiance + gray(0.2)) * diffuseness;
    }

    // Beer-Lambert absorption over the distance travelled inside a medium
    if ray.inside {
        let absorption = scene.absorption(hit);
        let distance = ray.t;
        out_radiance = Rgb::new(
            out_radiance.r * (-absorption.r * distance).exp(),
            out_radiance.g * (-absorption.g * distance).exp(),
            out_radiance.b * (-absorption.b * distance).exp(),
        );
    }

    out_radiance
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use assert2::assert;
    use nalgebra::{Isometry3, point, vector};

    use crate::geometry::Placement;
    use crate::scene::{PlaneFinish, Plane, Quad, SurfaceMaterial};

    /// A light quad hanging at y = 2 over a white floor at y = 0.
    fn lit_floor() -> Scene {
        let mut scene = Scene::empty();
        let light = scene.add_quad(
            Quad::new(1.0, Placement::new(Isometry3::translation(0.0, 2.0, 0.0))),
            SurfaceMaterial::MATTE,
        );
        scene.mark_light(light, Rgb::new(24.0, 24.0, 22.0));
        scene.add_plane(
            Plane::new(
                vector![0.0, 1.0, 0.0],
                0.0,
                PlaneFinish::Uniform(gray(1.0)),
            ),
            SurfaceMaterial::MATTE,
        );
        scene
    }

    #[test]
    fn escaping_ray_is_black() {
        let scene = Scene::empty();
        let mut ray = Ray::new(WorldPoint::origin(), vector![0.0, 1.0, 0.0]);
        assert!(trace(&scene, &mut ray, 0) == BLACK);
    }

    #[test]
    fn diffuse_floor_under_a_point_light() {
        let scene = lit_floor();

        let mut ray = Ray::new(point![0.0, 1.0, 0.0], vector![0.0, -1.0, 0.0]);
        let radiance = trace(&scene, &mut ray, 0);

        // the light point sits 0.01 below the quad center
        let distance = 1.99f32;
        let expected = |channel: f32| (channel / (distance * distance) + 0.2) * FRAC_1_PI;
        assert_relative_eq!(radiance.r, expected(24.0), epsilon = 1e-4);
        assert_relative_eq!(radiance.g, expected(24.0), epsilon = 1e-4);
        assert_relative_eq!(radiance.b, expected(22.0), epsilon = 1e-4);
    }

    #[test]
    fn shadowed_point_gets_ambient_only() {
        let mut scene = lit_floor();
        scene.add_sphere(
            crate::scene::Sphere::new(point![0.0, 1.0, 0.0], 0.3),
            SurfaceMaterial::MATTE,
        );

        // the sphere blocks the straight-up shadow ray
        let mut ray = Ray::new(point![0.2, 0.5, 0.0], vector![-1.0, -2.5, 0.0]);
        let radiance = trace(&scene, &mut ray, 0);
        assert_relative_eq!(radiance.r, 0.2 * FRAC_1_PI, epsilon = 1e-4);
    }

    #[test]
    fn mirror_corridor_terminates() {
        // two facing mirrors and no light: the recursion must bottom out
        let mut scene = Scene::empty();
        for (normal, distance) in [(vector![0.0, 0.0, 1.0], 0.0), (vector![0.0, 0.0, -1.0], 1.0)] {
            scene.add_plane(
                Plane::new(normal, distance, PlaneFinish::Uniform(gray(1.0))),
                SurfaceMaterial::mirror(),
            );
        }

        let mut ray = Ray::new(point![0.0, 0.0, 0.5], vector![0.0, 0.0, 1.0]);
        assert!(trace(&scene, &mut ray, 0) == BLACK);
    }

    #[test]
    fn interior_segment_is_attenuated() {
        let mut scene = lit_floor();
        let clear = trace(
            &scene,
            &mut Ray::new(point![0.0, 1.0, 0.0], vector![0.0, -1.0, 0.0]),
            0,
        );

        // same floor, but reached through an absorbing medium
        scene = Scene::empty();
        let light = scene.add_quad(
            Quad::new(1.0, Placement::new(Isometry3::translation(0.0, 2.0, 0.0))),
            SurfaceMaterial::MATTE,
        );
        scene.mark_light(light, Rgb::new(24.0, 24.0, 22.0));
        scene.add_plane(
            Plane::new(
                vector![0.0, 1.0, 0.0],
                0.0,
                PlaneFinish::Uniform(gray(1.0)),
            ),
            SurfaceMaterial {
                absorption: Rgb::new(0.5, 0.0, 0.5),
                ..SurfaceMaterial::MATTE
            },
        );

        let mut inside = Ray::new(point![0.0, 1.0, 0.0], vector![0.0, -1.0, 0.0]);
        inside.inside = true;
        let attenuated = trace(&scene, &mut inside, 0);

        // travelled one unit through the medium
        assert_relative_eq!(attenuated.r, clear.r * (-0.5f32).exp(), epsilon = 1e-5);
        assert_relative_eq!(attenuated.g, clear.g, epsilon = 1e-5);
        assert_relative_eq!(attenuated.b, clear.b * (-0.5f32).exp(), epsilon = 1e-5);
    }

    #[test]
    fn center_pixel_of_a_single_lit_sphere() {
        use crate::camera::Camera;
        use crate::geometry::{ScreenPoint, ScreenSize};
        use crate::scene::Sphere;

        // camera two units in front of a single matte sphere, point light
        // behind the camera
        let mut scene = Scene::empty();
        let light = scene.add_quad(
            Quad::new(1.0, Placement::new(Isometry3::translation(0.0, 0.0, -4.0))),
            SurfaceMaterial::MATTE,
        );
        scene.mark_light(light, Rgb::new(24.0, 24.0, 22.0));
        scene.add_sphere(Sphere::new(WorldPoint::origin(), 0.6), SurfaceMaterial::MATTE);

        let camera = Camera::room_view(ScreenSize::new(3, 3));
        let mut ray = camera.primary_ray(&ScreenPoint::new(1, 1));
        let radiance = trace(&scene, &mut ray, 0);

        // odd resolution: the center pixel looks exactly down the z axis
        // and hits the sphere at (0, 0, -0.6)
        assert_relative_eq!(ray.t, 1.4, epsilon = 1e-5);

        let to_light = WorldPoint::new(0.0, -0.01, -4.0) - WorldPoint::new(0.0, 0.0, -0.6);
        let distance = to_light.norm();
        let n_dot_l = vector![0.0, 0.0, -1.0].dot(&(to_light / distance));
        let albedo = 0.93f32;
        let expected =
            |channel: f32| (channel / (distance * distance) * n_dot_l + 0.2) * albedo * FRAC_1_PI;
        assert_relative_eq!(radiance.r, expected(24.0), epsilon = 1e-4);
        assert_relative_eq!(radiance.g, expected(24.0), epsilon = 1e-4);
        assert_relative_eq!(radiance.b, expected(22.0), epsilon = 1e-4);
    }

    #[test]
    fn reflect_mirrors_across_the_normal() {
        let incoming = vector![1.0, -1.0, 0.0].normalize();
        let reflected = reflect(&incoming, &vector![0.0, 1.0, 0.0]);
        assert_relative_eq!(
            reflected,
            vector![1.0, 1.0, 0.0].normalize(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn schlick_at_normal_incidence_is_r0() {
        let r0 = (0.2f32 / 2.2).powi(2);
        assert_relative_eq!(schlick(1.0, 1.2, 1.0), r0, epsilon = 1e-6);
    }

    #[test]
    fn schlick_grows_towards_grazing() {
        assert!(schlick(1.0, 1.2, 0.1) > schlick(1.0, 1.2, 0.9));
        assert_relative_eq!(schlick(1.0, 1.2, 0.0), 1.0, epsilon = 1e-6);
    }
}
