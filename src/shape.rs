use crate::consts::FEQ_EPSILON;
use crate::tuple::{ Point3D, Vector3D };
use crate::color::Color;
use crate::ray::Ray;
use crate::light::Material;
use crate::error::BuildError;
use crate::intersect::Intersection;

/// The supporting plane of a flat shape.
///
/// Kept as its own record so that triangles and polygons can delegate
/// their planar pre-test to it instead of re-deriving the math.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneInfo {
    /// A reference point on the plane.
    pub q: Point3D,

    /// The plane's unit normal.
    pub normal: Vector3D,
}

impl PlaneInfo {
    fn new(q: Point3D, normal: Vector3D) -> Result<PlaneInfo, BuildError> {
        let normal = normal.normalize().map_err(|_|
            BuildError::construction("plane normal must be non-zero"))?;

        Ok(PlaneInfo { q, normal })
    }

    fn from_points(a: Point3D, b: Point3D, c: Point3D)
        -> Result<PlaneInfo, BuildError> {
        let normal = (a - b).cross(&(a - c));
        let normal = normal.normalize().map_err(|_| BuildError::construction(
            "plane points must be distinct and non-collinear"))?;

        Ok(PlaneInfo { q: a, normal })
    }

    /// Offset along `ray` at which it crosses the plane, if it does.
    ///
    /// A ray parallel to the plane, or one whose origin coincides with
    /// the plane's reference point, produces no crossing.
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let denominator = self.normal.dot(&ray.direction);
        if denominator.abs() < FEQ_EPSILON {
            return None;
        }

        // q - origin degenerates to the zero vector when the ray starts
        // at the reference point itself.
        let to_plane = self.q - ray.origin;
        if to_plane.is_zero() {
            return None;
        }

        let t = self.normal.dot(&to_plane) / denominator;
        if t > FEQ_EPSILON { Some(t) } else { None }
    }
}

/// Vertex list of a flat convex shape, with its supporting plane.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonInfo {
    pub vertices: Vec<Point3D>,
    pub plane: PlaneInfo,
}

impl PolygonInfo {
    fn new(vertices: Vec<Point3D>) -> Result<PolygonInfo, BuildError> {
        if vertices.len() < 3 {
            return Err(BuildError::construction(
                "a polygon needs at least three vertices"));
        }

        let plane
            = PlaneInfo::from_points(vertices[0], vertices[1], vertices[2])?;

        // Every remaining vertex has to sit on the supporting plane.
        for v in vertices.iter().skip(3) {
            if align_zero(plane.normal.dot(&(*v - plane.q))) != 0.0 {
                return Err(BuildError::construction(
                    "polygon vertices must be coplanar"));
            }
        }

        // Convexity: consecutive edge cross products must all point to
        // the same side of the supporting plane.
        let n = vertices.len();
        let mut sign = 0.0;
        for i in 0..n {
            let e1 = vertices[(i + 1) % n] - vertices[i];
            let e2 = vertices[(i + 2) % n] - vertices[(i + 1) % n];
            let turn = align_zero(e1.cross(&e2).dot(&plane.normal));

            if turn == 0.0 {
                return Err(BuildError::construction(
                    "consecutive polygon vertices must not be collinear"));
            }
            if sign == 0.0 {
                sign = turn;
            } else if sign * turn < 0.0 {
                return Err(BuildError::construction(
                    "polygon must be convex"));
            }
        }

        Ok(PolygonInfo { vertices, plane })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeType {
    /// An infinite plane through a reference point.
    Plane(PlaneInfo),

    /// A sphere with a center point and radius.
    Sphere { center: Point3D, radius: f64 },

    /// A triangle. Stored as a three-vertex polygon.
    Triangle(PolygonInfo),

    /// A flat convex polygon with three or more vertices.
    Polygon(PolygonInfo),

    /// An infinite open cylinder around an axis ray.
    Tube { axis: Ray, radius: f64 },

    /// A capped cylinder spanning [0, height] along its axis.
    Cylinder { axis: Ray, radius: f64, height: f64 },
}

/// A renderable surface.
///
/// Owns its shape parameters, an emission color and a material. All
/// shapes live directly in world space; intersections and normals are
/// computed from the stored parameters with no transform pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    pub emission: Color,
    pub material: Material,
}

impl Shape {
    fn wrap(ty: ShapeType) -> Shape {
        Shape {
            ty,
            emission: Color::black(),
            material: Default::default(),
        }
    }

    /// Creates a plane from a reference point and a normal.
    pub fn plane(q: Point3D, normal: Vector3D) -> Result<Shape, BuildError> {
        Ok(Shape::wrap(ShapeType::Plane(PlaneInfo::new(q, normal)?)))
    }

    /// Creates a plane through three distinct, non-collinear points.
    pub fn plane_from_points(a: Point3D, b: Point3D, c: Point3D)
        -> Result<Shape, BuildError> {
        Ok(Shape::wrap(ShapeType::Plane(PlaneInfo::from_points(a, b, c)?)))
    }

    /// Creates a sphere with a positive radius.
    pub fn sphere(center: Point3D, radius: f64) -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::construction(
                "sphere radius must be positive"));
        }

        Ok(Shape::wrap(ShapeType::Sphere { center, radius }))
    }

    /// Creates a triangle from three non-collinear vertices.
    pub fn triangle(p1: Point3D, p2: Point3D, p3: Point3D)
        -> Result<Shape, BuildError> {
        Ok(Shape::wrap(ShapeType::Triangle(
            PolygonInfo::new(vec![p1, p2, p3])?
        )))
    }

    /// Creates a flat convex polygon from an ordered vertex sequence.
    pub fn polygon(vertices: Vec<Point3D>) -> Result<Shape, BuildError> {
        Ok(Shape::wrap(ShapeType::Polygon(PolygonInfo::new(vertices)?)))
    }

    /// Creates an infinite open cylinder around an axis.
    pub fn tube(axis_origin: Point3D, axis_direction: Vector3D, radius: f64)
        -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::construction(
                "tube radius must be positive"));
        }
        let axis = Ray::new(axis_origin, axis_direction).map_err(|_|
            BuildError::construction("tube axis must be non-zero"))?;

        Ok(Shape::wrap(ShapeType::Tube { axis, radius }))
    }

    /// Creates a capped cylinder spanning [0, height] along its axis.
    pub fn cylinder(axis_origin: Point3D, axis_direction: Vector3D,
        radius: f64, height: f64) -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::construction(
                "cylinder radius must be positive"));
        }
        if height <= 0.0 {
            return Err(BuildError::construction(
                "cylinder height must be positive"));
        }
        let axis = Ray::new(axis_origin, axis_direction).map_err(|_|
            BuildError::construction("cylinder axis must be non-zero"))?;

        Ok(Shape::wrap(ShapeType::Cylinder { axis, radius, height }))
    }

    /// Sets the emission color, consuming and returning the shape.
    pub fn with_emission(mut self, emission: Color) -> Shape {
        self.emission = emission;
        self
    }

    /// Sets the material, consuming and returning the shape.
    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    /// Intersects a ray with this shape.
    ///
    /// Returns every crossing of the surface, not just the nearest one.
    /// The absence of any hit is `None`; shapes never return an empty
    /// list. Degenerate configurations (parallel rays, rays starting on
    /// a defining reference point, zero-length vector constructions)
    /// all resolve to `None` rather than an error.
    pub fn intersect<'a>(&'a self, ray: &Ray)
        -> Option<Vec<Intersection<'a>>> {
        let hits = match self.ty {
            ShapeType::Plane(_) => self.intersect_plane(ray),
            ShapeType::Sphere { .. } => self.intersect_sphere(ray),
            ShapeType::Triangle(_) | ShapeType::Polygon(_)
                => self.intersect_polygon(ray),
            ShapeType::Tube { .. } => self.intersect_tube(ray),
            ShapeType::Cylinder { .. } => self.intersect_cylinder(ray),
        };

        if hits.is_empty() { None } else { Some(hits) }
    }

    /// Obtains the unit surface normal of this shape at a point.
    ///
    /// The point is assumed to lie on the surface (as produced by
    /// `intersect`). Orientation relative to the viewer is not decided
    /// here; the shading engine flips the normal as needed.
    pub fn normal_at(&self, at: Point3D) -> Vector3D {
        match self.ty {
            ShapeType::Plane(ref info) => info.normal,

            ShapeType::Triangle(ref info) | ShapeType::Polygon(ref info)
                => info.plane.normal,

            ShapeType::Sphere { center, .. } => {
                (at - center).normalize()
                    .expect("surface point should not be the sphere center")
            },

            ShapeType::Tube { axis, .. } => Self::axis_normal(&axis, at),

            ShapeType::Cylinder { axis, radius, height } => {
                let y = (at - axis.origin).dot(&axis.direction);
                let foot = axis.position(y);
                let dist = at.distance(&foot);

                // Cap points resolve to the axial normals; everything
                // else is treated as the round surface.
                if dist < radius && y >= height - FEQ_EPSILON {
                    axis.direction
                } else if dist < radius && y <= FEQ_EPSILON {
                    -axis.direction
                } else {
                    Self::axis_normal(&axis, at)
                }
            },
        }
    }

    /// Unit vector from the axis-projected foot of `at` to `at`.
    fn axis_normal(axis: &Ray, at: Point3D) -> Vector3D {
        let foot = axis.position((at - axis.origin).dot(&axis.direction));
        (at - foot).normalize()
            .expect("surface point should not lie on the axis")
    }

    fn intersect_plane<'a>(&'a self, ray: &Ray) -> Vec<Intersection<'a>> {
        let info = match self.ty {
            ShapeType::Plane(ref info) => info,
            _ => unreachable!(),
        };

        match info.intersect(ray) {
            Some(t) => vec![Intersection::new(t, ray, self)],
            None => Vec::new(),
        }
    }

    /// Checks whether a ray intersects a sphere.
    ///
    /// Builds the classic right triangle between the ray and the
    /// center: `tm` projects the center onto the ray, `d` is the
    /// center's distance from the ray line. `d >= radius` misses;
    /// otherwise the two roots are `tm -/+ th` and the strictly
    /// positive ones are returned (0, 1 or 2 hits).
    fn intersect_sphere<'a>(&'a self, ray: &Ray) -> Vec<Intersection<'a>> {
        let (center, radius) = match self.ty {
            ShapeType::Sphere { center, radius } => (center, radius),
            _ => unreachable!(),
        };

        // A ray starting at the center exits through the surface at
        // exactly one point, one radius along the direction.
        if ray.origin == center {
            return vec![Intersection::new(radius, ray, self)];
        }

        let u = center - ray.origin;
        let tm = ray.direction.dot(&u);
        let d_squared = u.magnitude_squared() - tm * tm;

        if d_squared >= radius * radius {
            return Vec::new();
        }

        let th = (radius * radius - d_squared).sqrt();
        let t0 = align_zero(tm - th);
        let t1 = align_zero(tm + th);

        let mut hits = Vec::new();
        if t0 > 0.0 {
            hits.push(Intersection::new(t0, ray, self));
        }
        if t1 > 0.0 {
            hits.push(Intersection::new(t1, ray, self));
        }

        hits
    }

    /// Checks whether a ray intersects a triangle or polygon.
    ///
    /// First delegates to the supporting plane; if the plane is
    /// crossed, the crossing is inside the shape iff the signs of
    /// `direction . ((v_k - origin) x (v_k+1 - origin))` agree across
    /// all edges. A zero anywhere means the ray grazes an edge or
    /// vertex, which counts as a miss: boundary points are excluded.
    fn intersect_polygon<'a>(&'a self, ray: &Ray) -> Vec<Intersection<'a>> {
        let info = match self.ty {
            ShapeType::Triangle(ref info) => info,
            ShapeType::Polygon(ref info) => info,
            _ => unreachable!(),
        };

        let t = match info.plane.intersect(ray) {
            Some(t) => t,
            None => return Vec::new(),
        };

        let n = info.vertices.len();
        let mut sign = 0.0;
        for k in 0..n {
            let v1 = info.vertices[k] - ray.origin;
            let v2 = info.vertices[(k + 1) % n] - ray.origin;
            let s = align_zero(ray.direction.dot(&v1.cross(&v2)));

            if s == 0.0 {
                return Vec::new();
            }
            if sign == 0.0 {
                sign = s;
            } else if sign * s < 0.0 {
                return Vec::new();
            }
        }

        vec![Intersection::new(t, ray, self)]
    }

    /// Side-surface roots of the quadratic around an axis.
    ///
    /// The sphere test restricted to the components of the ray and of
    /// `origin - axis.origin` perpendicular to the axis. A ray parallel
    /// to the axis has no side roots at all.
    fn axis_roots(axis: &Ray, radius: f64, ray: &Ray) -> Vec<f64> {
        let v = axis.direction;
        let dp = ray.origin - axis.origin;

        let d_perp = ray.direction - v * ray.direction.dot(&v);
        let dp_perp = dp - v * dp.dot(&v);

        let a = d_perp.magnitude_squared();
        if a < FEQ_EPSILON {
            return Vec::new();
        }

        let b = 2.0 * d_perp.dot(&dp_perp);
        let c = dp_perp.magnitude_squared() - radius * radius;

        let disc = b * b - 4.0 * a * c;
        if disc <= 0.0 {
            return Vec::new();
        }

        let t0 = align_zero((-b - disc.sqrt()) / (2.0 * a));
        let t1 = align_zero((-b + disc.sqrt()) / (2.0 * a));

        let mut roots = Vec::new();
        if t0 > 0.0 {
            roots.push(t0);
        }
        if t1 > 0.0 {
            roots.push(t1);
        }

        roots
    }

    fn intersect_tube<'a>(&'a self, ray: &Ray) -> Vec<Intersection<'a>> {
        let (axis, radius) = match self.ty {
            ShapeType::Tube { axis, radius } => (axis, radius),
            _ => unreachable!(),
        };

        Self::axis_roots(&axis, radius, ray).into_iter()
            .map(|t| Intersection::new(t, ray, self))
            .collect()
    }

    fn intersect_cylinder<'a>(&'a self, ray: &Ray) -> Vec<Intersection<'a>> {
        let (axis, radius, height) = match self.ty {
            ShapeType::Cylinder { axis, radius, height }
                => (axis, radius, height),
            _ => unreachable!(),
        };

        // Side surface, clipped to the axial range (0, height).
        let mut hits: Vec<Intersection> = Vec::new();
        for t in Self::axis_roots(&axis, radius, ray) {
            let y = (ray.position(t) - axis.origin).dot(&axis.direction);
            if 0.0 < y && y < height {
                hits.push(Intersection::new(t, ray, self));
            }
        }

        // Cap disks at both ends of the axial range.
        let bottom = axis.origin;
        let top = axis.position(height);
        for cap in &[bottom, top] {
            if let Some(t) = Self::intersect_cap(&axis, radius, *cap, ray) {
                hits.push(Intersection::new(t, ray, self));
            }
        }

        hits
    }

    /// Planar test against a cap disk, keeping hits within the radius.
    fn intersect_cap(axis: &Ray, radius: f64, cap_center: Point3D, ray: &Ray)
        -> Option<f64> {
        let denominator = axis.direction.dot(&ray.direction);
        if denominator.abs() < FEQ_EPSILON {
            return None;
        }

        let to_cap = cap_center - ray.origin;
        if to_cap.is_zero() {
            return None;
        }

        let t = axis.direction.dot(&to_cap) / denominator;
        if t <= FEQ_EPSILON {
            return None;
        }

        let hit = ray.position(t);
        if hit.distance(&cap_center) <= radius { Some(t) } else { None }
    }
}

/// Snaps near-zero values to exactly zero.
///
/// Comparisons against zero in the intersection tests are made
/// epsilon-aware by aligning first; everything else stays untouched.
fn align_zero(value: f64) -> f64 {
    if value.abs() < FEQ_EPSILON { 0.0 } else { value }
}

/* Tests */

#[cfg(test)]
fn test_ray(origin: Point3D, direction: Vector3D) -> Ray {
    Ray::new(origin, direction).unwrap()
}

#[test]
fn plane_single_hit_satisfies_plane_equation() {
    let plane = Shape::plane(
        Point3D::new(0.0, 1.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(1.0, 3.0, -2.0),
        Vector3D::new(0.0, -1.0, 0.5),
    );

    let hits = plane.intersect(&r).unwrap();
    assert_eq!(hits.len(), 1);

    // Substituting the hit back: normal . (point - q) == 0.
    let q = Point3D::new(0.0, 1.0, 0.0);
    let n = Vector3D::new(0.0, 1.0, 0.0);
    assert!(crate::feq(n.dot(&(hits[0].point - q)), 0.0));
}

#[test]
fn plane_parallel_ray_misses() {
    let plane = Shape::plane(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(0.0, 2.0, 0.0),
        Vector3D::new(1.0, 0.0, 0.0),
    );

    assert!(plane.intersect(&r).is_none());
}

#[test]
fn plane_behind_ray_misses() {
    let plane = Shape::plane(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(0.0, 2.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    );

    assert!(plane.intersect(&r).is_none());
}

#[test]
fn plane_ray_from_reference_point_misses() {
    let q = Point3D::new(1.0, 2.0, 3.0);
    let plane = Shape::plane(q, Vector3D::new(0.0, 1.0, 0.0)).unwrap();

    let r = test_ray(q, Vector3D::new(0.0, -1.0, 0.0));

    assert!(plane.intersect(&r).is_none());
}

#[test]
fn plane_from_collinear_points_fails() {
    let a = Point3D::new(0.0, 0.0, 0.0);
    let b = Point3D::new(1.0, 1.0, 1.0);
    let c = Point3D::new(2.0, 2.0, 2.0);

    assert!(Shape::plane_from_points(a, b, c).is_err());
    assert!(Shape::plane_from_points(a, a, c).is_err());
}

#[test]
fn sphere_ray_outside_misses() {
    let sphere = Shape::sphere(Point3D::origin(), 1.0).unwrap();
    let r = test_ray(
        Point3D::new(0.0, 2.0, -5.0),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    assert!(sphere.intersect(&r).is_none());
}

#[test]
fn sphere_tangent_ray_misses() {
    // d == radius is treated as a miss, not a grazing hit.
    let sphere = Shape::sphere(Point3D::origin(), 1.0).unwrap();
    let r = test_ray(
        Point3D::new(0.0, 1.0, -5.0),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    assert!(sphere.intersect(&r).is_none());
}

#[test]
fn sphere_ray_through_center_hits_twice() {
    let sphere = Shape::sphere(Point3D::origin(), 1.0).unwrap();
    let r = test_ray(
        Point3D::new(0.0, 0.0, -5.0),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    let hits = sphere.intersect(&r).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].t, 4.0);
    assert_eq!(hits[1].t, 6.0);
}

#[test]
fn sphere_ray_from_inside_hits_exit_only() {
    let sphere = Shape::sphere(Point3D::new(1.0, 0.0, 0.0), 2.0).unwrap();
    let r = test_ray(
        Point3D::new(0.5, 0.0, 0.0),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    let hits = sphere.intersect(&r).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn sphere_ray_from_center_hits_at_radius() {
    let center = Point3D::new(1.0, 2.0, 3.0);
    let sphere = Shape::sphere(center, 2.0).unwrap();
    let r = test_ray(center, Vector3D::new(0.0, 1.0, 0.0));

    let hits = sphere.intersect(&r).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point3D::new(1.0, 4.0, 3.0));
}

#[test]
fn sphere_behind_ray_misses() {
    let sphere = Shape::sphere(Point3D::origin(), 1.0).unwrap();
    let r = test_ray(
        Point3D::new(0.0, 0.0, 5.0),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    assert!(sphere.intersect(&r).is_none());
}

#[test]
fn sphere_normal_points_outward() {
    let sphere = Shape::sphere(Point3D::origin(), 1.0).unwrap();

    let n = sphere.normal_at(Point3D::new(1.0, 0.0, 0.0));
    assert_eq!(n, Vector3D::new(1.0, 0.0, 0.0));
    assert!(crate::feq(n.magnitude(), 1.0));
}

#[test]
fn triangle_interior_hit() {
    let triangle = Shape::triangle(
        Point3D::new(0.0, 1.0, 0.0),
        Point3D::new(0.0, 5.0, 0.0),
        Point3D::new(0.0, 3.0, 5.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(1.0, 3.0, 0.0),
        Vector3D::new(-1.0, 0.0, 1.0),
    );

    let hits = triangle.intersect(&r).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point3D::new(0.0, 3.0, 1.0));
}

#[test]
fn triangle_hit_outside_against_edge_misses() {
    let triangle = Shape::triangle(
        Point3D::new(0.0, 1.0, 0.0),
        Point3D::new(0.0, 5.0, 0.0),
        Point3D::new(0.0, 3.0, 5.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(1.0, 0.0, 0.0),
        Vector3D::new(-1.0, 0.0, 1.0),
    );

    assert!(triangle.intersect(&r).is_none());
}

#[test]
fn triangle_hit_on_edge_misses() {
    // Boundary points are explicitly excluded.
    let triangle = Shape::triangle(
        Point3D::new(0.0, 1.0, 0.0),
        Point3D::new(0.0, 5.0, 0.0),
        Point3D::new(0.0, 3.0, 5.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(1.0, 3.0, 0.0),
        Vector3D::new(-1.0, 0.0, 0.0),
    );

    assert!(triangle.intersect(&r).is_none());
}

#[test]
fn triangle_hit_on_vertex_misses() {
    let triangle = Shape::triangle(
        Point3D::new(0.0, 1.0, 0.0),
        Point3D::new(0.0, 5.0, 0.0),
        Point3D::new(0.0, 3.0, 5.0),
    ).unwrap();

    let r = test_ray(
        Point3D::new(1.0, 1.0, 0.0),
        Vector3D::new(-1.0, 0.0, 0.0),
    );

    assert!(triangle.intersect(&r).is_none());
}

#[test]
fn triangle_collinear_vertices_fail() {
    assert!(Shape::triangle(
        Point3D::new(0.0, 0.0, 0.0),
        Point3D::new(1.0, 0.0, 0.0),
        Point3D::new(2.0, 0.0, 0.0),
    ).is_err());
}

#[test]
fn polygon_interior_hit_and_normal() {
    let polygon = Shape::polygon(vec![
        Point3D::new(-1.0, -1.0, 2.0),
        Point3D::new(1.0, -1.0, 2.0),
        Point3D::new(1.0, 1.0, 2.0),
        Point3D::new(-1.0, 1.0, 2.0),
    ]).unwrap();

    let r = test_ray(
        Point3D::origin(),
        Vector3D::new(0.0, 0.0, 1.0),
    );

    let hits = polygon.intersect(&r).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point3D::new(0.0, 0.0, 2.0));

    let n = polygon.normal_at(hits[0].point);
    assert!(crate::feq(n.magnitude(), 1.0));
}

#[test]
fn polygon_non_coplanar_vertices_fail() {
    assert!(Shape::polygon(vec![
        Point3D::new(-1.0, -1.0, 2.0),
        Point3D::new(1.0, -1.0, 2.0),
        Point3D::new(1.0, 1.0, 2.0),
        Point3D::new(-1.0, 1.0, 3.0),
    ]).is_err());
}

#[test]
fn polygon_concave_vertices_fail() {
    assert!(Shape::polygon(vec![
        Point3D::new(0.0, 0.0, 0.0),
        Point3D::new(4.0, 0.0, 0.0),
        Point3D::new(4.0, 4.0, 0.0),
        Point3D::new(2.0, 1.0, 0.0),
    ]).is_err());
}

#[test]
fn tube_side_hits_and_normal() {
    let tube = Shape::tube(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
        1.0,
    ).unwrap();

    let r = test_ray(
        Point3D::new(3.0, 5.0, 0.0),
        Vector3D::new(-1.0, 0.0, 0.0),
    );

    let hits = tube.intersect(&r).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].point, Point3D::new(1.0, 5.0, 0.0));
    assert_eq!(hits[1].point, Point3D::new(-1.0, 5.0, 0.0));

    // Normal comes straight out from the axis foot point.
    assert_eq!(tube.normal_at(Point3D::new(1.0, 5.0, 0.0)),
        Vector3D::new(1.0, 0.0, 0.0));
}

#[test]
fn tube_ray_parallel_to_axis_misses() {
    let tube = Shape::tube(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
        1.0,
    ).unwrap();

    let r = test_ray(
        Point3D::new(0.5, 0.0, 0.0),
        Vector3D::new(0.0, 1.0, 0.0),
    );

    assert!(tube.intersect(&r).is_none());
}

#[test]
fn cylinder_clips_to_height() {
    let cylinder = Shape::cylinder(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
        1.0,
        2.0,
    ).unwrap();

    // Crosses the infinite tube above the cylinder's top: no side hit,
    // no cap hit (the ray is perpendicular to the caps' normal).
    let above = test_ray(
        Point3D::new(3.0, 5.0, 0.0),
        Vector3D::new(-1.0, 0.0, 0.0),
    );
    assert!(cylinder.intersect(&above).is_none());

    // Crosses inside the axial range: both side hits survive.
    let inside = test_ray(
        Point3D::new(3.0, 1.0, 0.0),
        Vector3D::new(-1.0, 0.0, 0.0),
    );
    assert_eq!(cylinder.intersect(&inside).unwrap().len(), 2);
}

#[test]
fn cylinder_caps_hit_along_axis() {
    let cylinder = Shape::cylinder(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
        1.0,
        2.0,
    ).unwrap();

    // Straight down the axis from above: both caps, no side surface.
    let r = test_ray(
        Point3D::new(0.5, 5.0, 0.0),
        Vector3D::new(0.0, -1.0, 0.0),
    );

    let hits = cylinder.intersect(&r).unwrap();
    assert_eq!(hits.len(), 2);

    // Parallel to the axis but outside the radius: nothing.
    let outside = test_ray(
        Point3D::new(2.0, 5.0, 0.0),
        Vector3D::new(0.0, -1.0, 0.0),
    );
    assert!(cylinder.intersect(&outside).is_none());
}

#[test]
fn cylinder_cap_normals_point_along_axis() {
    let cylinder = Shape::cylinder(
        Point3D::origin(),
        Vector3D::new(0.0, 1.0, 0.0),
        1.0,
        2.0,
    ).unwrap();

    assert_eq!(cylinder.normal_at(Point3D::new(0.5, 2.0, 0.0)),
        Vector3D::new(0.0, 1.0, 0.0));
    assert_eq!(cylinder.normal_at(Point3D::new(0.5, 0.0, 0.0)),
        Vector3D::new(0.0, -1.0, 0.0));
    assert_eq!(cylinder.normal_at(Point3D::new(1.0, 1.0, 0.0)),
        Vector3D::new(1.0, 0.0, 0.0));
}

#[test]
fn invalid_radial_shapes_fail_construction() {
    let up = Vector3D::new(0.0, 1.0, 0.0);

    assert!(Shape::sphere(Point3D::origin(), 0.0).is_err());
    assert!(Shape::sphere(Point3D::origin(), -1.0).is_err());
    assert!(Shape::tube(Point3D::origin(), up, -1.0).is_err());
    assert!(Shape::tube(Point3D::origin(), Vector3D::default(), 1.0).is_err());
    assert!(Shape::cylinder(Point3D::origin(), up, 1.0, 0.0).is_err());
    assert!(Shape::cylinder(Point3D::origin(), up, 0.0, 1.0).is_err());
}
