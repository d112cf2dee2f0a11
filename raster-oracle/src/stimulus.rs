use std::ops::Range;

use nalgebra_glm::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    math::{Plane, Triangle, Vertex},
    zbuffer::{DepthBufferConfig, DepthFunc},
    Error, Result,
};

/// A single pixel request towards the depth test stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelStimulus {
    pub x: usize,
    pub y: usize,
    pub z: u32,
    pub func: DepthFunc,
}

/// A directed clipping test vector with its expected classification.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationVector {
    pub triangle: Triangle,
    pub plane: Plane,
    pub expected_valid: bool,
    pub expected_triangles: usize,
}

/// Generates a random vertex with x, y and z uniformly drawn from the range and a fixed w.
///
/// # Arguments
/// * `rng` - The caller-owned random number generator.
/// * `range` - The range of the spatial coordinates.
/// * `w` - The homogeneous coordinate.
pub fn random_vertex<R: Rng>(rng: &mut R, range: Range<f64>, w: f64) -> Vertex {
    Vertex::new(
        rng.random_range(range.clone()),
        rng.random_range(range.clone()),
        rng.random_range(range),
        w,
    )
}

/// Generates a random triangle with w = 1 for all vertices.
pub fn random_triangle<R: Rng>(rng: &mut R, range: Range<f64>) -> Triangle {
    [
        random_vertex(rng, range.clone(), 1.0),
        random_vertex(rng, range.clone(), 1.0),
        random_vertex(rng, range, 1.0),
    ]
}

/// Generates a random plane with a normalized normal and an offset in [-1, 1). Draws are repeated
/// until the normal is long enough to be normalized.
pub fn random_plane<R: Rng>(rng: &mut R) -> Plane {
    loop {
        let n = DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let d = rng.random_range(-1.0..1.0);

        if let Some(plane) = Plane::from_normal_with_normalization(&n, d) {
            return plane;
        }
    }
}

/// Generates a random pixel request inside of the depth buffer with a random depth function.
pub fn random_pixel<R: Rng>(rng: &mut R, config: &DepthBufferConfig) -> PixelStimulus {
    PixelStimulus {
        x: rng.random_range(0..config.x_res),
        y: rng.random_range(0..config.y_res),
        z: rng.random_range(0..=config.far()),
        func: DepthFunc::from_code(rng.random_range(0..8)),
    }
}

/// Generates `size` random words uniformly drawn from the range.
///
/// # Arguments
/// * `rng` - The caller-owned random number generator.
/// * `width` - The width of the words in bits.
/// * `range` - The range of the words, its end must fit into the width.
/// * `size` - The number of words.
pub fn random_words<R: Rng>(
    rng: &mut R,
    width: u32,
    range: Range<u64>,
    size: usize,
) -> Result<Vec<u64>> {
    let max = ((1u128 << width.min(64)) - 1) as u64;
    if range.end > max || range.is_empty() {
        return Err(Error::StimulusRange {
            start: range.start,
            end: range.end,
            width,
            max,
        });
    }

    Ok((0..size).map(|_| rng.random_range(range.clone())).collect())
}

/// Returns directed vectors against the plane x >= 0 with 0, 1, 2 and 3 vertices inside.
pub fn classification_vectors() -> Vec<ClassificationVector> {
    let plane = Plane::new(1.0, 0.0, 0.0, 0.0);
    let v = |x: f64, y: f64| Vertex::new(x, y, 0.0, 1.0);

    vec![
        ClassificationVector {
            triangle: [v(-10.0, 0.0), v(-20.0, 5.0), v(-30.0, -5.0)],
            plane,
            expected_valid: false,
            expected_triangles: 0,
        },
        ClassificationVector {
            triangle: [v(10.0, 0.0), v(-20.0, 5.0), v(-30.0, -5.0)],
            plane,
            expected_valid: true,
            expected_triangles: 1,
        },
        ClassificationVector {
            triangle: [v(10.0, 0.0), v(20.0, 5.0), v(-30.0, -5.0)],
            plane,
            expected_valid: true,
            expected_triangles: 2,
        },
        ClassificationVector {
            triangle: [v(10.0, 0.0), v(20.0, 5.0), v(30.0, -5.0)],
            plane,
            expected_valid: true,
            expected_triangles: 1,
        },
    ]
}
