use crate::tuple::{ Point3D, Vector3D };
use crate::color::Color;
use crate::ray::Ray;
use crate::feq;
use crate::error::BuildError;
use crate::scene::Scene;
use crate::canvas::Canvas;
use crate::tracer::{ Tracer, TraceConfig };
use crate::sampling::{ Sampling, Footprint };
use crate::parallel::{ self, Parallelism };

/// A camera for rendering a scene onto a canvas.
///
/// Holds the position, an orthonormal (to, up, right) basis, the view
/// plane, the target resolution and the sampling/scheduling
/// configuration. Cameras are produced only through `CameraBuilder`
/// and never change afterwards; a render borrows the camera and the
/// scene read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    position: Point3D,

    vto: Vector3D,
    vup: Vector3D,
    vright: Vector3D,

    width: f64,
    height: f64,
    distance: f64,

    nx: usize,
    ny: usize,

    sampling: Sampling,
    parallelism: Parallelism,
    trace: TraceConfig,
}

impl Camera {
    pub fn builder() -> CameraBuilder {
        Default::default()
    }

    /// Horizontal resolution, in pixels.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Vertical resolution, in pixels.
    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// The pixel footprint of pixel (column `j`, row `i`).
    ///
    /// The row offset is negated: image rows grow downward while the
    /// up axis grows upward.
    pub fn pixel_footprint(&self, j: usize, i: usize) -> Footprint {
        let vp_center = self.position + self.vto * self.distance;
        let pixel_width = self.width / self.nx as f64;
        let pixel_height = self.height / self.ny as f64;

        let xj = (j as f64 - (self.nx as f64 - 1.0) / 2.0) * pixel_width;
        let yi = -(i as f64 - (self.ny as f64 - 1.0) / 2.0) * pixel_height;

        Footprint {
            center: vp_center + self.vright * xj + self.vup * yi,
            right: self.vright,
            up: self.vup,
            width: pixel_width,
            height: pixel_height,
        }
    }

    /// Constructs the primary ray through the center of pixel (j, i).
    pub fn construct_ray(&self, j: usize, i: usize) -> Ray {
        let center = self.pixel_footprint(j, i).center;
        Ray::new(self.position, center - self.position)
            .expect("view plane points cannot coincide with the camera")
    }

    /// Renders a scene, dispatching on the configured scheduling mode.
    ///
    /// All modes compute each pixel independently from the same
    /// read-only state, so they produce identical images.
    pub fn render(&self, scene: &Scene) -> Canvas {
        log::info!("rendering {}x{} pixels ({:?})",
            self.nx, self.ny, self.parallelism);

        match self.parallelism {
            Parallelism::Sequential => self.render_sequential(scene),
            Parallelism::Workers(_) | Parallelism::Auto
                => parallel::render_workers(self, scene),
            Parallelism::ParallelIter
                => parallel::render_parallel_iter(self, scene),
        }
    }

    fn render_sequential(&self, scene: &Scene) -> Canvas {
        let tracer = Tracer::with_config(scene, self.trace);
        let mut canvas = Canvas::new(self.nx, self.ny);

        for i in 0..self.ny {
            for j in 0..self.nx {
                let color = self.render_pixel(&tracer, j, i);
                canvas.write_pixel(j, i, &color);
            }
        }

        canvas
    }

    /// Resolves one pixel through the configured sampling strategy.
    pub(crate) fn render_pixel(&self, tracer: &Tracer, j: usize, i: usize)
        -> Color {
        self.sampling.sample_pixel(
            &self.pixel_footprint(j, i), self.position, tracer)
    }

    pub(crate) fn trace_config(&self) -> TraceConfig {
        self.trace
    }
}

/// Fluent builder for `Camera`.
///
/// Setters accumulate configuration; `build` validates everything
/// eagerly and either returns a frozen camera or fails with the first
/// problem it finds. Building never consumes the builder, so one
/// builder can produce any number of independent cameras.
#[derive(Clone, Debug, Default)]
pub struct CameraBuilder {
    position: Option<Point3D>,
    direction: Option<(Vector3D, Vector3D)>,
    look_at: Option<(Point3D, Vector3D)>,

    view_plane: Option<(f64, f64)>,
    distance: Option<f64>,
    resolution: Option<(usize, usize)>,

    sampling: Sampling,
    parallelism: Parallelism,
    trace: TraceConfig,
}

impl CameraBuilder {
    pub fn position(mut self, position: Point3D) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the forward and up directions explicitly.
    ///
    /// The two vectors must be orthogonal; the right axis is derived
    /// from their cross product at build time.
    pub fn direction(mut self, vto: Vector3D, vup: Vector3D) -> Self {
        self.direction = Some((vto, vup));
        self.look_at = None;
        self
    }

    /// Aims the camera at a target point with the default Y-up axis.
    pub fn look_at(self, target: Point3D) -> Self {
        self.look_at_with_up(target, Vector3D::new(0.0, 1.0, 0.0))
    }

    /// Aims the camera at a target point with an approximate up axis.
    ///
    /// The exact up axis is re-derived at build time so the basis
    /// comes out orthonormal.
    pub fn look_at_with_up(mut self, target: Point3D, up: Vector3D) -> Self {
        self.look_at = Some((target, up));
        self.direction = None;
        self
    }

    /// Sets the view plane width and height.
    pub fn view_plane(mut self, width: f64, height: f64) -> Self {
        self.view_plane = Some((width, height));
        self
    }

    /// Sets the distance from the camera to the view plane.
    pub fn vp_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Sets the image resolution in pixels.
    pub fn resolution(mut self, nx: usize, ny: usize) -> Self {
        self.resolution = Some((nx, ny));
        self
    }

    pub fn sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn trace_config(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Validates the configuration and freezes a camera.
    ///
    /// Missing required fields fail with `MissingConfiguration`,
    /// invalid values with `Construction`. Nothing is defaulted
    /// silently and a failed build yields no camera at all.
    pub fn build(&self) -> Result<Camera, BuildError> {
        let position = self.position.ok_or(
            BuildError::MissingConfiguration { field: "position" })?;

        let (vto, vup, vright) = self.basis(position)?;

        let (width, height) = self.view_plane.ok_or(
            BuildError::MissingConfiguration { field: "view plane size" })?;
        if width <= 0.0 || height <= 0.0 {
            return Err(BuildError::construction(
                "view plane size must be positive"));
        }

        let distance = self.distance.ok_or(
            BuildError::MissingConfiguration { field: "view plane distance" })?;
        if distance <= 0.0 {
            return Err(BuildError::construction(
                "view plane distance must be positive"));
        }

        let (nx, ny) = self.resolution.ok_or(
            BuildError::MissingConfiguration { field: "resolution" })?;
        if nx == 0 || ny == 0 {
            return Err(BuildError::construction(
                "resolution must be positive"));
        }

        self.check_sampling()?;
        if let Parallelism::Workers(0) = self.parallelism {
            return Err(BuildError::construction(
                "worker count must be positive"));
        }

        Ok(Camera {
            position,
            vto,
            vup,
            vright,
            width,
            height,
            distance,
            nx,
            ny,
            sampling: self.sampling,
            parallelism: self.parallelism,
            trace: self.trace,
        })
    }

    /// Resolves the orthonormal basis from whichever direction form
    /// was supplied.
    fn basis(&self, position: Point3D)
        -> Result<(Vector3D, Vector3D, Vector3D), BuildError> {
        if let Some((vto, vup)) = self.direction {
            let vto = vto.normalize().map_err(|_|
                BuildError::construction("forward direction must be non-zero"))?;
            let vup = vup.normalize().map_err(|_|
                BuildError::construction("up direction must be non-zero"))?;

            if !feq(vto.dot(&vup), 0.0) {
                return Err(BuildError::construction(
                    "forward and up directions must be orthogonal"));
            }

            return Ok((vto, vup, vto.cross(&vup)));
        }

        if let Some((target, up)) = self.look_at {
            let vto = (target - position).normalize().map_err(|_|
                BuildError::construction(
                    "look-at target must differ from the camera position"))?;
            let vright = vto.cross(&up).normalize().map_err(|_|
                BuildError::construction(
                    "up axis must not be parallel to the view direction"))?;
            let vup = vright.cross(&vto);

            return Ok((vto, vup, vright));
        }

        Err(BuildError::MissingConfiguration { field: "direction" })
    }

    fn check_sampling(&self) -> Result<(), BuildError> {
        match self.sampling {
            Sampling::Grid { samples_per_dim: 0, .. } => Err(
                BuildError::construction(
                    "anti-aliasing needs at least one sample per dimension")),
            Sampling::Adaptive { threshold, .. } if threshold < 0.0 => Err(
                BuildError::construction(
                    "adaptive threshold must be non-negative")),
            _ => Ok(()),
        }
    }
}

/* Tests */

#[cfg(test)]
fn test_builder() -> CameraBuilder {
    Camera::builder()
        .position(Point3D::origin())
        .direction(Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(0.0, 1.0, 0.0))
        .view_plane(2.0, 2.0)
        .vp_distance(1.0)
        .resolution(3, 3)
}

#[test]
fn ray_through_center_pixel() {
    let camera = test_builder().build().unwrap();
    let r = camera.construct_ray(1, 1);

    assert_eq!(r.origin, Point3D::origin());
    assert_eq!(r.direction, Vector3D::new(0.0, 0.0, 1.0));
}

#[test]
fn ray_through_corner_pixel() {
    let camera = test_builder().build().unwrap();

    // Top-left pixel: left of center, above center (rows grow down,
    // up grows up).
    let r = camera.construct_ray(0, 0);
    let expected = Vector3D::new(-2.0 / 3.0, 2.0 / 3.0, 1.0)
        .normalize().unwrap();

    assert_eq!(r.direction, expected);
}

#[test]
fn row_offset_is_negated() {
    let camera = test_builder().build().unwrap();

    // Bottom row points below the view axis.
    let r = camera.construct_ray(1, 2);
    assert!(r.direction.y < 0.0);
}

#[test]
fn look_at_derives_an_orthonormal_basis() {
    let camera = Camera::builder()
        .position(Point3D::origin())
        .look_at(Point3D::new(0.0, 0.0, 10.0))
        .view_plane(2.0, 2.0)
        .vp_distance(1.0)
        .resolution(3, 3)
        .build().unwrap();

    let r = camera.construct_ray(1, 1);
    assert_eq!(r.direction, Vector3D::new(0.0, 0.0, 1.0));
}

#[test]
fn builder_reports_each_missing_field() {
    let missing = |b: &CameraBuilder| match b.build() {
        Err(BuildError::MissingConfiguration { field }) => field,
        other => panic!("expected missing configuration, got {:?}", other),
    };

    let b = CameraBuilder::default();
    assert_eq!(missing(&b), "position");

    let b = b.position(Point3D::origin());
    assert_eq!(missing(&b), "direction");

    let b = b.direction(
        Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(0.0, 1.0, 0.0));
    assert_eq!(missing(&b), "view plane size");

    let b = b.view_plane(2.0, 2.0);
    assert_eq!(missing(&b), "view plane distance");

    let b = b.vp_distance(1.0);
    assert_eq!(missing(&b), "resolution");

    assert!(b.resolution(3, 3).build().is_ok());
}

#[test]
fn builder_rejects_invalid_configuration() {
    let orthogonal_err = test_builder()
        .direction(Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(0.0, 1.0, 1.0))
        .build();
    assert!(matches!(orthogonal_err, Err(BuildError::Construction { .. })));

    let size_err = test_builder().view_plane(0.0, 2.0).build();
    assert!(matches!(size_err, Err(BuildError::Construction { .. })));

    let distance_err = test_builder().vp_distance(-1.0).build();
    assert!(matches!(distance_err, Err(BuildError::Construction { .. })));

    let resolution_err = test_builder().resolution(0, 3).build();
    assert!(matches!(resolution_err, Err(BuildError::Construction { .. })));

    let workers_err = test_builder()
        .parallelism(Parallelism::Workers(0))
        .build();
    assert!(matches!(workers_err, Err(BuildError::Construction { .. })));

    let target_err = test_builder().look_at(Point3D::origin()).build();
    assert!(matches!(target_err, Err(BuildError::Construction { .. })));
}

#[test]
fn one_builder_yields_many_cameras() {
    let builder = test_builder();

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();

    assert_eq!(first, second);

    // The builder can still diverge afterwards.
    let third = builder.resolution(5, 5).build().unwrap();
    assert_eq!(third.nx(), 5);
}

#[cfg(test)]
fn test_scene() -> Scene {
    use crate::shape::Shape;
    use crate::light::{ Light, Material };

    let mut scene = Scene::new().with_background(Color::rgb(0.1, 0.1, 0.2));
    scene.geometries.add(
        Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.5).unwrap()
            .with_material(Material {
                kd: Color::uniform(0.7),
                ks: Color::uniform(0.3),
                shininess: 20,
                ..Default::default()
            })
    );
    scene.lights.push(
        Light::point(Color::white(), Point3D::new(-5.0, 5.0, 0.0)));

    scene
}

#[test]
fn single_sample_strategies_agree_exactly() {
    let scene = test_scene();

    let plain = test_builder()
        .resolution(7, 7)
        .build().unwrap()
        .render(&scene);

    let one_sample_grid = test_builder()
        .resolution(7, 7)
        .sampling(Sampling::Grid {
            samples_per_dim: 1,
            shape: crate::sampling::GridShape::Rectangle,
        })
        .build().unwrap()
        .render(&scene);

    let depth_zero_adaptive = test_builder()
        .resolution(7, 7)
        .sampling(Sampling::Adaptive { max_depth: 0, threshold: 0.0 })
        .build().unwrap()
        .render(&scene);

    assert_eq!(plain, one_sample_grid);
    assert_eq!(plain, depth_zero_adaptive);
}
