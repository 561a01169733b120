use thiserror::Error;

/// Failures detected while building a shape, scene or camera.
///
/// Construction is atomic: a build that returns one of these never
/// produces a partial object, and a failed camera build can never be
/// used for rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing rendering data: {field} is not set")]
    MissingConfiguration { field: &'static str },

    #[error("invalid construction: {reason}")]
    Construction { reason: String },
}

impl BuildError {
    pub fn construction<S: Into<String>>(reason: S) -> BuildError {
        BuildError::Construction { reason: reason.into() }
    }
}

/// Runtime geometric failures.
///
/// A `ZeroVector` raised during a ray/surface interaction is a
/// legitimate geometric edge case; intersection code recovers from it
/// locally as "no intersection" and never propagates it further.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("operation would construct a zero-length vector")]
    ZeroVector,
}

#[test]
fn build_error_messages() {
    let e = BuildError::MissingConfiguration { field: "position" };
    assert_eq!(e.to_string(), "missing rendering data: position is not set");

    let e = BuildError::construction("view plane size must be positive");
    assert_eq!(
        e.to_string(),
        "invalid construction: view plane size must be positive"
    );
}
