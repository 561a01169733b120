use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::tuple::{ Point3D, Vector3D };
use crate::light::{ AmbientLight, Light, Material };
use crate::shape::Shape;
use crate::geometry::Geometries;
use crate::error::BuildError;

/// A scene: everything a render reads.
///
/// Built once (in code or from a JSON description) and treated as
/// immutable for the duration of a render.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub geometries: Geometries,
    pub lights: Vec<Light>,
    pub ambient: AmbientLight,
    pub background: Color,
}

impl Scene {
    pub fn new() -> Scene {
        Default::default()
    }

    pub fn with_background(mut self, background: Color) -> Scene {
        self.background = background;
        self
    }

    pub fn with_ambient(mut self, ambient: AmbientLight) -> Scene {
        self.ambient = ambient;
        self
    }
}

/// JSON form of a scene description file.
///
/// The wire format stays dumb (positions and colors are plain arrays);
/// conversion into domain values happens in one validated step, so a
/// bad description fails the whole load instead of producing a partial
/// scene.
#[derive(Serialize, Deserialize)]
pub struct SceneJson {
    #[serde(default)]
    pub background: Vec<f64>,
    #[serde(default)]
    pub ambient: Vec<f64>,

    #[serde(default)]
    pub lights: Vec<LightJson>,
    #[serde(default)]
    pub shapes: Vec<ShapeJson>,

    pub camera: Option<CameraJson>,
}

/// Camera block of a scene description.
///
/// Either `direction`+`up` or `look_at` (with optional `up`) orients
/// the camera; everything else maps straight onto the builder. Real
/// validation stays in `CameraBuilder::build`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CameraJson {
    pub position: Vec<f64>,

    pub direction: Option<Vec<f64>>,
    pub up: Option<Vec<f64>>,
    pub look_at: Option<Vec<f64>>,

    pub view_plane: Vec<f64>,
    pub distance: f64,
    pub resolution: Vec<usize>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LightJson {
    pub ty: String,
    pub intensity: Vec<f64>,

    pub position: Option<Vec<f64>>,
    pub direction: Option<Vec<f64>>,

    pub kc: Option<f64>,
    pub kl: Option<f64>,
    pub kq: Option<f64>,
    pub narrow_beam: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ShapeJson {
    pub ty: String,

    pub center: Option<Vec<f64>>,
    pub radius: Option<f64>,
    pub point: Option<Vec<f64>>,
    pub normal: Option<Vec<f64>>,
    pub vertices: Option<Vec<Vec<f64>>>,
    pub axis_origin: Option<Vec<f64>>,
    pub axis_direction: Option<Vec<f64>>,
    pub height: Option<f64>,

    pub emission: Option<Vec<f64>>,
    pub material: Option<MaterialJson>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MaterialJson {
    pub ka: Option<Vec<f64>>,
    pub kd: Option<Vec<f64>>,
    pub ks: Option<Vec<f64>>,
    pub kt: Option<Vec<f64>>,
    pub kr: Option<Vec<f64>>,
    pub shininess: Option<i32>,
}

fn color_from(v: &[f64]) -> Color {
    match v.len() {
        0 => Default::default(),
        1 => Color { r: v[0], ..Default::default() },
        2 => Color { r: v[0], g: v[1], ..Default::default() },
        _ => Color { r: v[0], g: v[1], b: v[2] },
    }
}

fn point_from(v: &[f64], what: &str) -> Result<Point3D, BuildError> {
    if v.len() != 3 {
        return Err(BuildError::construction(
            format!("{} needs exactly three coordinates", what)));
    }

    Ok(Point3D::new(v[0], v[1], v[2]))
}

fn vector_from(v: &[f64], what: &str) -> Result<Vector3D, BuildError> {
    if v.len() != 3 {
        return Err(BuildError::construction(
            format!("{} needs exactly three components", what)));
    }

    Ok(Vector3D::new(v[0], v[1], v[2]))
}

fn require<T>(field: Option<T>, what: &str) -> Result<T, BuildError> {
    field.ok_or_else(|| BuildError::construction(
        format!("scene description is missing {}", what)))
}

impl SceneJson {
    /// Converts the description into a `Scene`.
    ///
    /// Fails atomically: one invalid entry fails the whole conversion.
    pub fn into_scene(self) -> Result<Scene, BuildError> {
        let mut scene = Scene::new()
            .with_background(color_from(&self.background))
            .with_ambient(AmbientLight::new(color_from(&self.ambient)));

        for light in self.lights {
            scene.lights.push(light.into_light()?);
        }

        for shape in self.shapes {
            scene.geometries.add(shape.into_shape()?);
        }

        Ok(scene)
    }
}

impl CameraJson {
    /// Seeds a camera builder from the description.
    ///
    /// Sampling and scheduling are left at their defaults; callers
    /// layer those on before building.
    pub fn into_builder(self) -> Result<crate::camera::CameraBuilder, BuildError> {
        use crate::camera::Camera;

        let mut builder = Camera::builder()
            .position(point_from(&self.position, "camera position")?);

        builder = match (self.direction, self.look_at) {
            (Some(direction), None) => {
                let up = require(self.up, "camera up direction")?;
                builder.direction(
                    vector_from(&direction, "camera direction")?,
                    vector_from(&up, "camera up direction")?,
                )
            },
            (None, Some(target)) => {
                let target = point_from(&target, "camera look-at target")?;
                match self.up {
                    Some(up) => builder.look_at_with_up(
                        target, vector_from(&up, "camera up direction")?),
                    None => builder.look_at(target),
                }
            },
            _ => return Err(BuildError::construction(
                "camera needs exactly one of direction or look_at")),
        };

        if self.view_plane.len() != 2 {
            return Err(BuildError::construction(
                "camera view_plane needs [width, height]"));
        }
        if self.resolution.len() != 2 {
            return Err(BuildError::construction(
                "camera resolution needs [nx, ny]"));
        }

        Ok(builder
            .view_plane(self.view_plane[0], self.view_plane[1])
            .vp_distance(self.distance)
            .resolution(self.resolution[0], self.resolution[1]))
    }
}

impl LightJson {
    fn into_light(self) -> Result<Light, BuildError> {
        let intensity = color_from(&self.intensity);

        let light = match self.ty.as_str() {
            "directional" => {
                let direction = require(self.direction, "light direction")?;
                Light::directional(
                    intensity, vector_from(&direction, "light direction")?)?
            },
            "point" => {
                let position = require(self.position, "light position")?;
                Light::point(
                    intensity, point_from(&position, "light position")?)
            },
            "spot" => {
                let position = require(self.position, "light position")?;
                let direction = require(self.direction, "light direction")?;
                Light::spot(
                    intensity,
                    point_from(&position, "light position")?,
                    vector_from(&direction, "light direction")?,
                )?.with_narrow_beam(self.narrow_beam.unwrap_or(1.0))
            },
            other => return Err(BuildError::construction(
                format!("unrecognized light type {:?}", other))),
        };

        Ok(light.with_attenuation(
            self.kc.unwrap_or(1.0),
            self.kl.unwrap_or(0.0),
            self.kq.unwrap_or(0.0),
        ))
    }
}

impl ShapeJson {
    fn into_shape(self) -> Result<Shape, BuildError> {
        let shape = match self.ty.as_str() {
            "sphere" => {
                let center = require(self.center, "sphere center")?;
                Shape::sphere(
                    point_from(&center, "sphere center")?,
                    require(self.radius, "sphere radius")?,
                )?
            },
            "plane" => {
                let point = require(self.point, "plane point")?;
                let normal = require(self.normal, "plane normal")?;
                Shape::plane(
                    point_from(&point, "plane point")?,
                    vector_from(&normal, "plane normal")?,
                )?
            },
            "triangle" | "polygon" => {
                let raw = require(self.vertices, "vertices")?;
                let mut vertices = Vec::with_capacity(raw.len());
                for v in &raw {
                    vertices.push(point_from(v, "vertex")?);
                }

                if self.ty == "triangle" {
                    if vertices.len() != 3 {
                        return Err(BuildError::construction(
                            "a triangle needs exactly three vertices"));
                    }
                    Shape::triangle(vertices[0], vertices[1], vertices[2])?
                } else {
                    Shape::polygon(vertices)?
                }
            },
            "tube" | "cylinder" => {
                let origin = require(self.axis_origin, "axis origin")?;
                let direction = require(self.axis_direction, "axis direction")?;
                let origin = point_from(&origin, "axis origin")?;
                let direction = vector_from(&direction, "axis direction")?;
                let radius = require(self.radius, "radius")?;

                if self.ty == "tube" {
                    Shape::tube(origin, direction, radius)?
                } else {
                    let height = require(self.height, "cylinder height")?;
                    Shape::cylinder(origin, direction, radius, height)?
                }
            },
            other => return Err(BuildError::construction(
                format!("unrecognized shape type {:?}", other))),
        };

        let material = self.material.unwrap_or_default().into_material();
        Ok(shape
            .with_emission(color_from(&self.emission.unwrap_or_default()))
            .with_material(material))
    }
}

impl MaterialJson {
    fn into_material(self) -> Material {
        let default = Material::default();

        Material {
            ka: self.ka.as_deref().map(color_from).unwrap_or(default.ka),
            kd: self.kd.as_deref().map(color_from).unwrap_or(default.kd),
            ks: self.ks.as_deref().map(color_from).unwrap_or(default.ks),
            kt: self.kt.as_deref().map(color_from).unwrap_or(default.kt),
            kr: self.kr.as_deref().map(color_from).unwrap_or(default.kr),
            shininess: self.shininess.unwrap_or(default.shininess),
        }
    }
}

/* Tests */

#[test]
fn scene_json_round_trips_into_domain_values() {
    let text = r#"{
        "background": [0.1, 0.2, 0.3],
        "ambient": [0.05, 0.05, 0.05],
        "lights": [
            { "ty": "point", "intensity": [1, 1, 1],
              "position": [0, 10, 0], "kl": 0.01 },
            { "ty": "directional", "intensity": [0.4, 0.4, 0.4],
              "direction": [0, -1, 0] }
        ],
        "shapes": [
            { "ty": "sphere", "center": [0, 0, 5], "radius": 2,
              "emission": [0.2, 0, 0],
              "material": { "kd": [0.7, 0.7, 0.7], "shininess": 30 } },
            { "ty": "plane", "point": [0, -2, 0], "normal": [0, 1, 0] }
        ]
    }"#;

    let json: SceneJson = serde_json::from_str(text).unwrap();
    let scene = json.into_scene().unwrap();

    assert_eq!(scene.background, Color::rgb(0.1, 0.2, 0.3));
    assert_eq!(scene.ambient.intensity, Color::uniform(0.05));
    assert_eq!(scene.lights.len(), 2);
    assert_eq!(scene.geometries.len(), 2);
}

#[test]
fn camera_block_seeds_a_working_builder() {
    let text = r#"{
        "position": [0, 0, -10],
        "look_at": [0, 0, 0],
        "view_plane": [4, 3],
        "distance": 5,
        "resolution": [400, 300]
    }"#;

    let json: CameraJson = serde_json::from_str(text).unwrap();
    let camera = json.into_builder().unwrap().build().unwrap();

    assert_eq!(camera.nx(), 400);
    assert_eq!(camera.ny(), 300);
}

#[test]
fn camera_block_requires_one_orientation() {
    let text = r#"{
        "position": [0, 0, -10],
        "view_plane": [4, 3],
        "distance": 5,
        "resolution": [400, 300]
    }"#;

    let json: CameraJson = serde_json::from_str(text).unwrap();
    assert!(json.into_builder().is_err());
}

#[test]
fn scene_json_invalid_shape_fails_whole_load() {
    let text = r#"{
        "shapes": [
            { "ty": "sphere", "center": [0, 0, 5], "radius": -1 }
        ]
    }"#;

    let json: SceneJson = serde_json::from_str(text).unwrap();
    assert!(json.into_scene().is_err());
}

#[test]
fn scene_json_unknown_light_type_fails() {
    let text = r#"{
        "lights": [ { "ty": "laser", "intensity": [1, 1, 1] } ]
    }"#;

    let json: SceneJson = serde_json::from_str(text).unwrap();
    assert!(json.into_scene().is_err());
}
