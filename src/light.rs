use crate::color::Color;
use crate::tuple::{ Point3D, Vector3D };
use crate::error::{ BuildError, GeometryError };

/// A material record.
///
/// Coefficients follow the Phong reflection model, each stored as a
/// per-channel `Color` triple: ambient (`ka`), diffuse (`kd`), specular
/// (`ks`), plus the global-effect coefficients transparency (`kt`) and
/// reflection (`kr`), and an integer shininess exponent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub ka: Color,
    pub kd: Color,
    pub ks: Color,
    pub kt: Color,
    pub kr: Color,
    pub shininess: i32,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            ka: Color::uniform(1.0),
            kd: Color::black(),
            ks: Color::black(),
            kt: Color::black(),
            kr: Color::black(),
            shininess: 0,
        }
    }
}

/// Uniform, directionless light applied through a material's `ka`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AmbientLight {
    pub intensity: Color,
}

impl AmbientLight {
    pub fn new(intensity: Color) -> AmbientLight {
        AmbientLight { intensity }
    }

    /// No ambient light at all.
    pub fn none() -> AmbientLight {
        AmbientLight { intensity: Color::black() }
    }
}

/// Distance attenuation factors for positional lights.
///
/// Intensity at distance `d` is scaled by `1 / (kc + kl d + kq d²)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Attenuation {
    pub kc: f64,
    pub kl: f64,
    pub kq: f64,
}

impl Default for Attenuation {
    fn default() -> Attenuation {
        Attenuation { kc: 1.0, kl: 0.0, kq: 0.0 }
    }
}

impl Attenuation {
    fn factor(&self, distance: f64) -> f64 {
        self.kc + self.kl * distance + self.kq * distance * distance
    }
}

/// A light source.
///
/// The closed set of variants this renderer understands: a directional
/// light (infinitely far away, parallel rays), a point light radiating
/// in all directions, and a spot light whose beam falls off away from
/// its axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    Directional {
        intensity: Color,
        direction: Vector3D,
    },

    Point {
        intensity: Color,
        position: Point3D,
        attenuation: Attenuation,
    },

    Spot {
        intensity: Color,
        position: Point3D,
        direction: Vector3D,
        attenuation: Attenuation,
        narrow_beam: f64,
    },
}

impl Light {
    pub fn directional(intensity: Color, direction: Vector3D)
        -> Result<Light, BuildError> {
        let direction = direction.normalize().map_err(|_|
            BuildError::construction("light direction must be non-zero"))?;

        Ok(Light::Directional { intensity, direction })
    }

    pub fn point(intensity: Color, position: Point3D) -> Light {
        Light::Point {
            intensity,
            position,
            attenuation: Default::default(),
        }
    }

    pub fn spot(intensity: Color, position: Point3D, direction: Vector3D)
        -> Result<Light, BuildError> {
        let direction = direction.normalize().map_err(|_|
            BuildError::construction("light direction must be non-zero"))?;

        Ok(Light::Spot {
            intensity,
            position,
            direction,
            attenuation: Default::default(),
            narrow_beam: 1.0,
        })
    }

    /// Replaces the distance attenuation factors on a positional light.
    ///
    /// Directional lights have no position and are left unchanged.
    pub fn with_attenuation(mut self, kc: f64, kl: f64, kq: f64) -> Light {
        match self {
            Light::Point { ref mut attenuation, .. }
                | Light::Spot { ref mut attenuation, .. } => {
                *attenuation = Attenuation { kc, kl, kq };
            },
            Light::Directional { .. } => (),
        }

        self
    }

    /// Sets the beam concentration exponent on a spot light.
    pub fn with_narrow_beam(mut self, beam: f64) -> Light {
        if let Light::Spot { ref mut narrow_beam, .. } = self {
            *narrow_beam = beam;
        }

        self
    }

    /// The light's intensity as received at `p`.
    pub fn intensity_at(&self, p: Point3D) -> Color {
        match *self {
            Light::Directional { intensity, .. } => intensity,

            Light::Point { intensity, position, attenuation } => {
                intensity.scale(1.0 / attenuation.factor(position.distance(&p)))
            },

            Light::Spot {
                intensity, position, direction, attenuation, narrow_beam
            } => {
                let attenuated = intensity
                    .scale(1.0 / attenuation.factor(position.distance(&p)));

                // Off-axis falloff: scale by (axis . l)^beam, where l is
                // the direction from the light toward p.
                match (p - position).normalize() {
                    Ok(l) => {
                        let cos = direction.dot(&l).max(0.0);
                        attenuated.scale(cos.powf(narrow_beam))
                    },
                    Err(_) => attenuated,
                }
            },
        }
    }

    /// The normalized direction from the light toward `p`.
    ///
    /// Fails when `p` coincides with a positional light's location.
    pub fn direction_at(&self, p: Point3D)
        -> Result<Vector3D, GeometryError> {
        match *self {
            Light::Directional { direction, .. } => Ok(direction),
            Light::Point { position, .. } | Light::Spot { position, .. }
                => (p - position).normalize(),
        }
    }

    /// The distance from the light to `p`.
    ///
    /// Directional lights are infinitely far away from every point.
    pub fn distance(&self, p: Point3D) -> f64 {
        match *self {
            Light::Directional { .. } => f64::INFINITY,
            Light::Point { position, .. } | Light::Spot { position, .. }
                => position.distance(&p),
        }
    }
}

/* Tests */

#[test]
fn point_light_attenuates_with_distance() {
    let light = Light::point(Color::white(), Point3D::origin())
        .with_attenuation(1.0, 0.0, 1.0);

    // At distance 3, the quadratic term gives 1 / (1 + 9).
    let received = light.intensity_at(Point3D::new(3.0, 0.0, 0.0));
    assert_eq!(received, Color::uniform(0.1));
}

#[test]
fn directional_light_is_uniform() {
    let light = Light::directional(
        Color::white(), Vector3D::new(0.0, -1.0, 0.0)
    ).unwrap();

    assert_eq!(light.intensity_at(Point3D::new(5.0, 5.0, 5.0)),
        Color::white());
    assert_eq!(light.distance(Point3D::origin()), f64::INFINITY);
    assert_eq!(light.direction_at(Point3D::new(1.0, 2.0, 3.0)).unwrap(),
        Vector3D::new(0.0, -1.0, 0.0));
}

#[test]
fn spot_light_falls_off_off_axis() {
    let light = Light::spot(
        Color::white(),
        Point3D::origin(),
        Vector3D::new(0.0, 0.0, 1.0),
    ).unwrap();

    // Directly on the beam axis: full intensity.
    let on_axis = light.intensity_at(Point3D::new(0.0, 0.0, 2.0));
    assert_eq!(on_axis, Color::white());

    // Perpendicular to the axis: beam contributes nothing.
    let off_axis = light.intensity_at(Point3D::new(2.0, 0.0, 0.0));
    assert_eq!(off_axis, Color::black());
}

#[test]
fn light_direction_at_light_position_fails() {
    let light = Light::point(Color::white(), Point3D::new(1.0, 1.0, 1.0));

    assert!(light.direction_at(Point3D::new(1.0, 1.0, 1.0)).is_err());
}

#[test]
fn zero_direction_light_fails_construction() {
    assert!(Light::directional(Color::white(), Vector3D::default()).is_err());
    assert!(Light::spot(
        Color::white(), Point3D::origin(), Vector3D::default()
    ).is_err());
}
