use crate::feq;
use crate::consts::{ MAX_CALC_COLOR_LEVEL, MIN_CALC_COLOR_K, DELTA };
use crate::color::Color;
use crate::tuple::{ Point3D, Vector3D };
use crate::ray::Ray;
use crate::light::{ Light, Material };
use crate::scene::Scene;
use crate::intersect::{ self, Intersection };

/// Tunables for the recursive shading engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceConfig {
    /// Maximum recursion depth for global effects.
    pub max_level: usize,

    /// Contributions attenuated below this factor are dropped.
    pub min_k: f64,

    /// Offset for shadow and secondary ray origins, in scene units.
    pub delta: f64,
}

impl Default for TraceConfig {
    fn default() -> TraceConfig {
        TraceConfig {
            max_level: MAX_CALC_COLOR_LEVEL,
            min_k: MIN_CALC_COLOR_K,
            delta: DELTA,
        }
    }
}

/// Everything one shading step needs to know about a hit.
///
/// Built fresh for every shaded intersection (primary or secondary)
/// and never mutated, so recursive and concurrent shading share
/// nothing. The normal is already oriented toward the viewer and `vn`
/// is its cached dot product with the view direction (negative by
/// construction).
#[derive(Copy, Clone, Debug)]
struct ShadingContext {
    point: Point3D,
    view: Vector3D,
    normal: Vector3D,
    vn: f64,
    material: Material,
    emission: Color,
}

/// The recursive shading engine.
///
/// Borrows a scene and resolves a color per ray: local illumination
/// (emission, ambient, diffuse, specular, with transparency-aware
/// shadowing) plus global illumination (reflection and straight-through
/// attenuated refraction), recursing until the level budget runs out or
/// the accumulated attenuation `k` becomes negligible.
pub struct Tracer<'a> {
    scene: &'a Scene,
    config: TraceConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene) -> Tracer<'a> {
        Tracer { scene, config: Default::default() }
    }

    pub fn with_config(scene: &'a Scene, config: TraceConfig) -> Tracer<'a> {
        Tracer { scene, config }
    }

    /// Resolves the color seen along a ray.
    pub fn trace_ray(&self, ray: &Ray) -> Color {
        let hit = match self.closest_intersection(ray) {
            Some(hit) => hit,
            None => return self.scene.background,
        };

        match Self::preprocess(&hit, ray.direction) {
            Some(ctx) => self.calc_color(
                &ctx, self.config.max_level, Color::uniform(1.0)),
            None => Color::black(),
        }
    }

    fn closest_intersection(&self, ray: &Ray) -> Option<Intersection<'a>> {
        self.scene.geometries.calculate_intersections(ray)
            .and_then(intersect::closest)
    }

    /// Builds the shading context for a hit.
    ///
    /// Orients the surface normal toward the viewer, negating it (and
    /// its cached dot product) when it faces away. A view direction
    /// exactly orthogonal to the normal grazes the surface edge-on and
    /// produces no context: the caller shades it black.
    fn preprocess(hit: &Intersection, view: Vector3D)
        -> Option<ShadingContext> {
        let mut normal = hit.shape.normal_at(hit.point);
        let mut vn = view.dot(&normal);

        if vn > 0.0 {
            normal = -normal;
            vn = -vn;
        }
        if feq(vn, 0.0) {
            return None;
        }

        Some(ShadingContext {
            point: hit.point,
            view,
            normal,
            vn,
            material: hit.material,
            emission: hit.shape.emission,
        })
    }

    fn calc_color(&self, ctx: &ShadingContext, level: usize, k: Color)
        -> Color {
        let local = self.local_effects(ctx);
        if level <= 1 {
            local
        } else {
            local + self.global_effects(ctx, level, k)
        }
    }

    /// Local illumination at a hit.
    ///
    /// Starts from the surface emission plus the scene's ambient light
    /// through the material's ambient coefficient, then adds diffuse
    /// and specular terms per light, each gated by the shadow factor.
    fn local_effects(&self, ctx: &ShadingContext) -> Color {
        let mut color
            = ctx.emission + self.scene.ambient.intensity * ctx.material.ka;

        for light in self.scene.lights.iter() {
            let l = match light.direction_at(ctx.point) {
                Ok(l) => l,
                // The shaded point sits exactly on the light; no
                // meaningful direction, no contribution.
                Err(_) => continue,
            };

            // Light and viewer must be on the same side of the surface.
            let ln = l.dot(&ctx.normal);
            if feq(ln, 0.0) || ln * ctx.vn <= 0.0 {
                continue;
            }

            let ktr = self.transparency(ctx, light, l);
            if ktr.lower_than(self.config.min_k) {
                continue;
            }

            let diffuse = ctx.material.kd.scale(ln.abs());
            let specular = self.specular(ctx, l);
            let intensity = light.intensity_at(ctx.point) * ktr;

            color = color + intensity * (diffuse + specular);
        }

        color
    }

    /// Specular term: `ks * max(0, r . -v)^shininess`, where `r` is the
    /// light direction reflected across the oriented normal.
    fn specular(&self, ctx: &ShadingContext, l: Vector3D) -> Color {
        let r = l.reflect(&ctx.normal);
        let factor = r.dot(&(-ctx.view));

        if factor <= 0.0 {
            Color::black()
        } else {
            ctx.material.ks.scale(factor.powi(ctx.material.shininess))
        }
    }

    /// The shadow/transparency factor between a point and a light.
    ///
    /// Casts a ray from the point toward the light, its origin offset
    /// off the surface, and multiplies together the transparency
    /// coefficients of every blocker strictly nearer than the light.
    /// Falls to zero (fully shadowed) as soon as the running product
    /// drops below the minimal-contribution threshold.
    fn transparency(&self, ctx: &ShadingContext, light: &Light, l: Vector3D)
        -> Color {
        let shadow_ray = match Ray::offset(
            ctx.point, -l, ctx.normal, self.config.delta) {
            Ok(ray) => ray,
            Err(_) => return Color::uniform(1.0),
        };

        let blockers =
            match self.scene.geometries.calculate_intersections(&shadow_ray) {
                Some(blockers) => blockers,
                None => return Color::uniform(1.0),
            };

        let light_distance = light.distance(ctx.point);
        let mut ktr = Color::uniform(1.0);

        for blocker in blockers {
            if blocker.point.distance(&ctx.point) < light_distance {
                ktr = ktr * blocker.material.kt;
                if ktr.lower_than(self.config.min_k) {
                    return Color::black();
                }
            }
        }

        ktr
    }

    /// Global illumination: reflection plus straight-through refraction.
    ///
    /// Each effect traces one secondary ray and contributes the
    /// recursive color scaled by its own coefficient; the recursion
    /// carries `k * coefficient` so deep, heavily attenuated chains
    /// cut off early.
    fn global_effects(&self, ctx: &ShadingContext, level: usize, k: Color)
        -> Color {
        if k.lower_than(self.config.min_k) {
            return Color::black();
        }

        let mut color = Color::black();

        let kr = ctx.material.kr;
        if !kr.is_zero() {
            // Mirror direction: v - 2(n.v)n.
            let reflected = ctx.view - ctx.normal * (2.0 * ctx.vn);
            if let Ok(ray) = Ray::offset(
                ctx.point, reflected, ctx.normal, self.config.delta) {
                color = color + self.global_effect(&ray, level, k, kr);
            }
        }

        let kt = ctx.material.kt;
        if !kt.is_zero() {
            // Refraction is modeled as an attenuated straight
            // pass-through: the ray continues in the view direction.
            if let Ok(ray) = Ray::offset(
                ctx.point, ctx.view, ctx.normal, self.config.delta) {
                color = color + self.global_effect(&ray, level, k, kt);
            }
        }

        color
    }

    fn global_effect(&self, ray: &Ray, level: usize, k: Color,
        k_effect: Color) -> Color {
        let hit = match self.closest_intersection(ray) {
            Some(hit) => hit,
            None => return Color::black(),
        };

        match Self::preprocess(&hit, ray.direction) {
            Some(ctx) => {
                self.calc_color(&ctx, level - 1, k * k_effect) * k_effect
            },
            None => Color::black(),
        }
    }
}

/* Tests */

#[cfg(test)]
mod test_scenes {
    use super::*;
    use crate::shape::Shape;
    use crate::light::AmbientLight;

    /// A diffuse sphere in front of the camera, lit from behind it.
    pub fn lit_sphere() -> Scene {
        let mut scene = Scene::new()
            .with_background(Color::rgb(0.0, 0.0, 0.25));

        scene.geometries.add(
            Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0).unwrap()
                .with_material(Material {
                    kd: Color::uniform(0.8),
                    ks: Color::uniform(0.2),
                    shininess: 10,
                    ..Default::default()
                })
        );
        scene.lights.push(
            Light::point(Color::white(), Point3D::new(0.0, 5.0, 0.0)));

        scene
    }

    pub fn emissive_sphere(ambient: AmbientLight) -> Scene {
        let mut scene = Scene::new().with_ambient(ambient);
        scene.geometries.add(
            Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0).unwrap()
                .with_emission(Color::rgb(0.3, 0.4, 0.5))
                .with_material(Material {
                    ka: Color::uniform(1.0),
                    ..Default::default()
                })
        );

        scene
    }

    pub fn forward_ray() -> Ray {
        Ray::new(Point3D::origin(), Vector3D::new(0.0, 0.0, 1.0)).unwrap()
    }
}

#[test]
fn miss_returns_background() {
    let scene = test_scenes::lit_sphere();
    let tracer = Tracer::new(&scene);

    let r = Ray::new(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap();

    assert_eq!(tracer.trace_ray(&r), Color::rgb(0.0, 0.0, 0.25));
}

#[test]
fn emission_and_ambient_without_lights() {
    use crate::light::AmbientLight;

    let scene
        = test_scenes::emissive_sphere(AmbientLight::new(Color::uniform(0.1)));
    let tracer = Tracer::new(&scene);

    let color = tracer.trace_ray(&test_scenes::forward_ray());
    assert_eq!(color, Color::rgb(0.4, 0.5, 0.6));
}

#[test]
fn lit_sphere_is_brighter_than_ambient_alone() {
    let scene = test_scenes::lit_sphere();
    let tracer = Tracer::new(&scene);

    let color = tracer.trace_ray(&test_scenes::forward_ray());

    // Diffuse light from above must contribute something.
    assert!(color.r > 0.0 && color.g > 0.0 && color.b > 0.0);
}

#[test]
fn opaque_blocker_shadows_the_point() {
    use crate::shape::Shape;

    let mut scene = test_scenes::lit_sphere();

    // Drop an opaque plane between the light and the sphere.
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, 3.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap());

    let tracer = Tracer::new(&scene);
    let color = tracer.trace_ray(&test_scenes::forward_ray());

    // No emission, no ambient light, fully shadowed: black.
    assert_eq!(color, Color::black());
}

#[test]
fn transparent_blocker_attenuates_instead_of_shadowing() {
    use crate::shape::Shape;

    let mut shadowed = test_scenes::lit_sphere();
    shadowed.geometries.add(Shape::plane(
        Point3D::new(0.0, 3.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap().with_material(Material {
        kt: Color::uniform(0.5),
        ..Default::default()
    }));

    let lit = test_scenes::lit_sphere();

    let half = Tracer::new(&shadowed).trace_ray(&test_scenes::forward_ray());
    let full = Tracer::new(&lit).trace_ray(&test_scenes::forward_ray());

    // Half the light gets through, so the diffuse term halves.
    assert_eq!(half, full.scale(0.5));
}

#[test]
fn recursion_terminates_between_facing_mirrors() {
    use crate::shape::Shape;

    // Two fully reflective planes facing each other; without the level
    // budget this would recurse forever.
    let mut scene = Scene::new();
    let mirror = Material { kr: Color::uniform(1.0), ..Default::default() };

    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, 0.0, 10.0),
        Vector3D::new(0.0, 0.0, -1.0),
    ).unwrap().with_material(mirror));
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, 0.0, -10.0),
        Vector3D::new(0.0, 0.0, 1.0),
    ).unwrap().with_material(mirror));

    let tracer = Tracer::new(&scene);
    let r = Ray::new(
        Point3D::origin(),
        Vector3D::new(0.1, 0.0, 1.0),
    ).unwrap();

    let color = tracer.trace_ray(&r);
    assert!(color.r.is_finite() && color.g.is_finite() && color.b.is_finite());
}

#[test]
fn attenuation_below_threshold_cuts_global_effects() {
    use crate::shape::Shape;

    // A barely reflective floor under an emissive sphere: after one
    // bounce k = 1e-6 < MIN_CALC_COLOR_K, so the second-level global
    // pass contributes nothing and the result is local + one bounce.
    let mut scene = Scene::new();
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, -1.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap().with_material(Material {
        kr: Color::uniform(0.000001),
        ..Default::default()
    }));
    scene.geometries.add(
        Shape::sphere(Point3D::new(0.0, 3.0, 5.0), 1.0).unwrap()
            .with_emission(Color::white())
    );

    let low_budget = Tracer::with_config(&scene, TraceConfig {
        max_level: 2,
        ..Default::default()
    });
    let high_budget = Tracer::with_config(&scene, TraceConfig {
        max_level: 10,
        ..Default::default()
    });

    let r = Ray::new(
        Point3D::new(0.0, 1.0, 0.0),
        Vector3D::new(0.0, -1.0, 1.0),
    ).unwrap();

    // Deeper budgets change nothing once k is below the threshold.
    assert_eq!(low_budget.trace_ray(&r), high_budget.trace_ray(&r));
}

#[test]
fn reflective_floor_mirrors_emissive_sphere() {
    use crate::shape::Shape;

    let mut scene = Scene::new();
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, -1.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap().with_material(Material {
        kr: Color::uniform(0.5),
        ..Default::default()
    }));
    scene.geometries.add(
        Shape::sphere(Point3D::new(0.0, 3.0, 5.0), 1.0).unwrap()
            .with_emission(Color::white())
    );

    // Aim at the floor so the mirror direction runs up toward the
    // sphere's center at (0, 3, 5).
    let tracer = Tracer::new(&scene);
    let r = Ray::new(
        Point3D::new(0.0, 1.0, 2.25),
        Vector3D::new(0.0, -2.0, 0.75),
    ).unwrap();

    let color = tracer.trace_ray(&r);

    // The floor itself emits nothing; everything here is the sphere
    // seen through the 0.5 reflection coefficient.
    assert_eq!(color, Color::uniform(0.5));
}

#[test]
fn transparent_surface_passes_straight_through() {
    use crate::shape::Shape;

    // A half-transparent wall in front of an emissive back wall.
    let mut scene = Scene::new();
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, 0.0, 5.0),
        Vector3D::new(0.0, 0.0, -1.0),
    ).unwrap().with_material(Material {
        kt: Color::uniform(0.5),
        ..Default::default()
    }));
    scene.geometries.add(Shape::plane(
        Point3D::new(0.0, 0.0, 10.0),
        Vector3D::new(0.0, 0.0, -1.0),
    ).unwrap().with_emission(Color::white()));

    let tracer = Tracer::new(&scene);
    let color = tracer.trace_ray(&test_scenes::forward_ray());

    // Straight pass-through: the back wall attenuated by kt.
    assert_eq!(color, Color::uniform(0.5));
}
