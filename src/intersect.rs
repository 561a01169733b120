use crate::tuple::Point3D;
use crate::ray::Ray;
use crate::light::Material;
use crate::shape::Shape;

/// A single ray/surface intersection.
///
/// Parameter `t` is the offset from the ray origin along its (unit)
/// direction, so it doubles as the distance to the hit point. The
/// record snapshots the surface's material so shading never reaches
/// back through the shape for it; the record itself lives only for the
/// duration of one trace.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub point: Point3D,
    pub shape: &'a Shape,
    pub material: Material,
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, ray: &Ray, shape: &'a Shape) -> Intersection<'a> {
        Intersection {
            t,
            point: ray.position(t),
            shape,
            material: shape.material,
        }
    }
}

/// Implements partial equality on an Intersection.
///
/// Two intersections are equal if their offsets match and they refer to
/// the same underlying shape (by pointer, not by value).
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.shape, other.shape)
    }
}

/// Picks the intersection nearest to the ray origin.
///
/// Every intersection produced by the shapes in this crate already has
/// a positive `t`, so the minimum `t` is the closest hit.
pub fn closest<'a>(intersections: Vec<Intersection<'a>>)
    -> Option<Intersection<'a>> {
    intersections.into_iter().min_by(|a, b|
        a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal)
    )
}

/* Tests */

#[test]
fn closest_picks_minimum_t() {
    use crate::tuple::Vector3D;

    let s = Shape::sphere(Point3D::origin(), 1.0).unwrap();
    let r = Ray::new(
        Point3D::new(0.0, 0.0, -5.0),
        Vector3D::new(0.0, 0.0, 1.0),
    ).unwrap();

    let is = vec![
        Intersection::new(6.0, &r, &s),
        Intersection::new(4.0, &r, &s),
        Intersection::new(5.0, &r, &s),
    ];

    assert_eq!(closest(is).unwrap().t, 4.0);
}

#[test]
fn closest_of_empty_is_none() {
    assert!(closest(Vec::new()).is_none());
}
