use crate::tuple::{ Point3D, Vector3D };
use crate::error::GeometryError;
#[cfg(test)]
use crate::consts::DELTA;

/// A ray in 3D space.
///
/// The direction is always stored normalized; construction fails if the
/// supplied direction is the zero vector, which cannot be normalized.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Point3D,
    pub direction: Vector3D,
}

impl Ray {
    pub fn new(origin: Point3D, direction: Vector3D)
        -> Result<Ray, GeometryError> {
        Ok(Ray { origin, direction: direction.normalize()? })
    }

    /// Creates a secondary ray whose origin is displaced off a surface.
    ///
    /// The origin moves `delta` along the normal, on whichever side of
    /// the surface the ray continues to, so the new ray cannot
    /// re-intersect the surface at its own starting point.
    pub fn offset(origin: Point3D, direction: Vector3D, normal: Vector3D,
        delta: f64) -> Result<Ray, GeometryError> {
        let direction = direction.normalize()?;
        let side = if direction.dot(&normal) > 0.0 { delta } else { -delta };

        Ok(Ray { origin: origin + normal * side, direction })
    }

    /// The point at offset `t` along the ray.
    pub fn position(&self, t: f64) -> Point3D {
        self.origin + (self.direction * t)
    }
}

/* Tests */

#[test]
fn ray_position() {
    let r = Ray::new(
        Point3D::new(2.0, 3.0, 4.0),
        Vector3D::new(1.0, 0.0, 0.0),
    ).unwrap();

    assert_eq!(r.position(0.0), Point3D::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Point3D::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Point3D::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Point3D::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_direction_is_normalized() {
    let r = Ray::new(
        Point3D::origin(),
        Vector3D::new(0.0, 3.0, 4.0),
    ).unwrap();

    assert_eq!(r.direction, Vector3D::new(0.0, 0.6, 0.8));
}

#[test]
fn ray_zero_direction_fails() {
    let r = Ray::new(Point3D::origin(), Vector3D::new(0.0, 0.0, 0.0));

    assert_eq!(r, Err(GeometryError::ZeroVector));
}

#[test]
fn offset_ray_moves_off_surface() {
    let origin = Point3D::origin();
    let normal = Vector3D::new(0.0, 1.0, 0.0);

    // Continuing above the surface: origin is nudged up.
    let up = Ray::offset(origin, Vector3D::new(0.0, 1.0, 0.0), normal, DELTA)
        .unwrap();
    assert_eq!(up.origin, Point3D::new(0.0, DELTA, 0.0));

    // Continuing below the surface: origin is nudged down.
    let down = Ray::offset(origin, Vector3D::new(0.0, -1.0, 0.0), normal, DELTA)
        .unwrap();
    assert_eq!(down.origin, Point3D::new(0.0, -DELTA, 0.0));
}
