use crate::consts::{ AA_SAMPLES_PER_DIM, ADAPTIVE_MAX_DEPTH,
    ADAPTIVE_THRESHOLD };
use crate::color::Color;
use crate::tuple::{ Point3D, Vector3D };
use crate::ray::Ray;
use crate::tracer::Tracer;

/// Shape of the fixed-grid sampling area.
///
/// `Circle` discards grid samples outside the ellipse inscribed in the
/// pixel footprint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GridShape {
    Rectangle,
    Circle,
}

/// How rays are distributed over one pixel footprint.
///
/// Fixed-grid and adaptive sampling share one shape: trace some number
/// of rays over the footprint, reduce them to one color. `Single` is
/// the degenerate case both of the others collapse to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sampling {
    /// One ray through the pixel center.
    Single,

    /// Fixed n-by-n grid anti-aliasing.
    Grid { samples_per_dim: usize, shape: GridShape },

    /// Recursive quad-subdivision driven by color variance.
    Adaptive { max_depth: usize, threshold: f64 },
}

impl Default for Sampling {
    fn default() -> Sampling {
        Sampling::Single
    }
}

impl Sampling {
    /// Grid sampling with the default sample count and shape.
    pub fn grid() -> Sampling {
        Sampling::Grid {
            samples_per_dim: AA_SAMPLES_PER_DIM,
            shape: GridShape::Rectangle,
        }
    }

    /// Adaptive sampling with the default depth and threshold.
    pub fn adaptive() -> Sampling {
        Sampling::Adaptive {
            max_depth: ADAPTIVE_MAX_DEPTH,
            threshold: ADAPTIVE_THRESHOLD,
        }
    }
}

/// The pixel-sized area in space that one pixel's rays sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Footprint {
    pub center: Point3D,

    /// Unit axes of the view plane.
    pub right: Vector3D,
    pub up: Vector3D,

    pub width: f64,
    pub height: f64,
}

impl Footprint {
    /// Sub-cell center points of an n-by-n grid over the footprint.
    ///
    /// In `Circle` mode, points outside the inscribed ellipse are
    /// discarded using the normalized-offset test.
    pub fn grid_points(&self, samples_per_dim: usize, shape: GridShape)
        -> Vec<Point3D> {
        let cell_width = self.width / samples_per_dim as f64;
        let cell_height = self.height / samples_per_dim as f64;
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;

        let mut points = Vec::new();
        for i in 0..samples_per_dim {
            for j in 0..samples_per_dim {
                let u = (i as f64 + 0.5) * cell_width - half_width;
                let v = (j as f64 + 0.5) * cell_height - half_height;

                if shape == GridShape::Circle {
                    let nu = (u * u) / (half_width * half_width);
                    let nv = (v * v) / (half_height * half_height);
                    if nu + nv > 1.0 {
                        continue;
                    }
                }

                points.push(self.center + self.right * u + self.up * v);
            }
        }

        points
    }

    fn corners(&self) -> [Point3D; 4] {
        let half_right = self.right * (self.width / 2.0);
        let half_up = self.up * (self.height / 2.0);

        [
            self.center - half_right + half_up,
            self.center + half_right + half_up,
            self.center + half_right - half_up,
            self.center - half_right - half_up,
        ]
    }

    fn quadrant(&self, corner: Point3D) -> Footprint {
        Footprint {
            // Halfway between the corner and the old center.
            center: corner + (self.center - corner) * 0.5,
            width: self.width / 2.0,
            height: self.height / 2.0,
            ..*self
        }
    }
}

impl Sampling {
    /// Reduces one pixel footprint to a single color.
    ///
    /// All rays originate at `origin` (the camera position) and pass
    /// through points of the footprint.
    pub fn sample_pixel(&self, footprint: &Footprint, origin: Point3D,
        tracer: &Tracer) -> Color {
        match *self {
            Sampling::Single => trace_through(footprint.center, origin, tracer),

            Sampling::Grid { samples_per_dim, shape } => {
                let points = footprint.grid_points(samples_per_dim, shape);

                let mut color = Color::black();
                for point in points.iter() {
                    color = color + trace_through(*point, origin, tracer);
                }

                color.reduce(points.len())
            },

            Sampling::Adaptive { max_depth, threshold } => {
                adaptive_sample(footprint, origin, tracer, max_depth, threshold)
            },
        }
    }
}

/// Recursive adaptive supersampling over a (sub-)footprint.
///
/// Traces the four corners and the center; if all five colors sit
/// within `threshold` of their mean, the mean is the answer. Otherwise
/// the four half-size quadrants are sampled at `depth - 1` and
/// averaged. Depth 0 always resolves to a single center ray.
fn adaptive_sample(footprint: &Footprint, origin: Point3D, tracer: &Tracer,
    depth: usize, threshold: f64) -> Color {
    if depth == 0 {
        return trace_through(footprint.center, origin, tracer);
    }

    let corners = footprint.corners();
    let samples = [
        trace_through(corners[0], origin, tracer),
        trace_through(corners[1], origin, tracer),
        trace_through(corners[2], origin, tracer),
        trace_through(corners[3], origin, tracer),
        trace_through(footprint.center, origin, tracer),
    ];

    let mean = samples.iter().fold(Color::black(), |acc, c| acc + *c)
        .reduce(samples.len());

    if is_below_threshold(&samples, mean, threshold) {
        return mean;
    }

    let mut color = Color::black();
    for corner in corners.iter() {
        color = color + adaptive_sample(
            &footprint.quadrant(*corner), origin, tracer,
            depth - 1, threshold,
        );
    }

    color.reduce(corners.len())
}

/// True if every sample lies within `threshold` of the mean color.
fn is_below_threshold(samples: &[Color], mean: Color, threshold: f64) -> bool {
    samples.iter().all(|c| (*c - mean).length() <= threshold)
}

fn trace_through(point: Point3D, origin: Point3D, tracer: &Tracer) -> Color {
    match Ray::new(origin, point - origin) {
        Ok(ray) => tracer.trace_ray(&ray),
        // A sample point coincident with the camera has no direction;
        // it contributes nothing.
        Err(_) => Color::black(),
    }
}

/* Tests */

#[cfg(test)]
fn test_footprint() -> Footprint {
    Footprint {
        center: Point3D::new(0.0, 0.0, 1.0),
        right: Vector3D::new(1.0, 0.0, 0.0),
        up: Vector3D::new(0.0, 1.0, 0.0),
        width: 1.0,
        height: 1.0,
    }
}

#[test]
fn one_sample_grid_is_the_pixel_center() {
    let points = test_footprint().grid_points(1, GridShape::Rectangle);

    assert_eq!(points, vec![Point3D::new(0.0, 0.0, 1.0)]);
}

#[test]
fn two_by_two_grid_hits_cell_centers() {
    let points = test_footprint().grid_points(2, GridShape::Rectangle);

    assert_eq!(points.len(), 4);
    assert_eq!(points[0], Point3D::new(-0.25, -0.25, 1.0));
    assert_eq!(points[3], Point3D::new(0.25, 0.25, 1.0));
}

#[test]
fn circular_grid_drops_corner_samples() {
    // On a 4x4 grid the four corner cells fall outside the inscribed
    // ellipse; everything else stays.
    let rect = test_footprint().grid_points(4, GridShape::Rectangle);
    let circle = test_footprint().grid_points(4, GridShape::Circle);

    assert_eq!(rect.len(), 16);
    assert_eq!(circle.len(), 12);
}

#[test]
fn variance_check_accepts_uniform_samples() {
    let uniform = [Color::uniform(0.5); 5];
    assert!(is_below_threshold(&uniform, Color::uniform(0.5), 0.1));

    let mut divergent = uniform;
    divergent[2] = Color::white();
    let mean = divergent.iter().fold(Color::black(), |acc, c| acc + *c)
        .reduce(5);
    assert!(!is_below_threshold(&divergent, mean, 0.1));
}

#[test]
fn all_strategies_agree_on_a_uniform_background() {
    use crate::scene::Scene;

    // Every ray misses, so every strategy must settle on the
    // background color exactly.
    let scene = Scene::new().with_background(Color::rgb(0.25, 0.5, 0.75));
    let tracer = Tracer::new(&scene);

    let footprint = test_footprint();
    let origin = Point3D::origin();
    let expected = Color::rgb(0.25, 0.5, 0.75);

    assert_eq!(Sampling::Single
        .sample_pixel(&footprint, origin, &tracer), expected);
    assert_eq!(Sampling::grid()
        .sample_pixel(&footprint, origin, &tracer), expected);
    assert_eq!(Sampling::adaptive()
        .sample_pixel(&footprint, origin, &tracer), expected);
}

#[test]
fn adaptive_depth_zero_is_a_single_center_ray() {
    use crate::scene::Scene;

    let scene = Scene::new().with_background(Color::rgb(0.1, 0.2, 0.3));
    let tracer = Tracer::new(&scene);
    let footprint = test_footprint();
    let origin = Point3D::origin();

    let adaptive = Sampling::Adaptive { max_depth: 0, threshold: 0.0 };
    assert_eq!(
        adaptive.sample_pixel(&footprint, origin, &tracer),
        Sampling::Single.sample_pixel(&footprint, origin, &tracer),
    );
}
