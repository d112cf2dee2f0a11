mod intersection;
mod plane;

pub use intersection::*;
pub use plane::*;

use nalgebra_glm::{DVec3, DVec4};

/// A vertex in homogeneous coordinates (x, y, z, w).
pub type Vertex = DVec4;

/// An ordered triangle. The order of the vertices is part of the hardware contract and must be
/// preserved by every operation that passes a triangle through.
pub type Triangle = [Vertex; 3];

/// Constraint a value to lie between two further values
///
/// # Arguments
/// * `x` - The value to constraint.
/// * `min_value` - The lower bound for the value constraint.
/// * `max_value` - The upper bound for the value constraint.
#[inline]
pub fn clamp<T>(x: T, min_value: T, max_value: T) -> T
where
    T: PartialOrd,
{
    if x < min_value {
        min_value
    } else if x > max_value {
        max_value
    } else {
        x
    }
}

/// Returns the spatial part (x, y, z) of the given homogeneous vertex without dividing by w.
#[inline]
pub fn spatial(v: &Vertex) -> DVec3 {
    DVec3::new(v.x, v.y, v.z)
}

/// Computes the area of the triangle spanned by the spatial parts of the given vertices.
///
/// # Arguments
/// * `triangle` - The triangle whose area is computed.
pub fn triangle_area(triangle: &Triangle) -> f64 {
    let p0 = spatial(&triangle[0]);
    let e0 = spatial(&triangle[1]) - p0;
    let e1 = spatial(&triangle[2]) - p0;

    0.5 * e0.cross(&e1).norm()
}

/// Computes the summed area of the triangles stored as consecutive vertex triples.
///
/// # Arguments
/// * `vertices` - The flat vertex list, three vertices per triangle.
pub fn total_area(vertices: &[Vertex]) -> f64 {
    vertices
        .chunks_exact(3)
        .map(|t| triangle_area(&[t[0], t[1], t[2]]))
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(3, 0, 10), 3);
        assert_eq!(clamp(-2, 0, 10), 0);
        assert_eq!(clamp(11, 0, 10), 10);
        assert_eq!(clamp(1.5f64, 0f64, 1f64), 1f64);
    }

    #[test]
    fn test_triangle_area() {
        let t: Triangle = [
            Vertex::new(0.0, 0.0, 0.0, 1.0),
            Vertex::new(2.0, 0.0, 0.0, 1.0),
            Vertex::new(0.0, 2.0, 0.0, 1.0),
        ];
        assert_eq!(triangle_area(&t), 2.0);

        // the homogeneous coordinate does not take part in the area
        let t: Triangle = [
            Vertex::new(0.0, 0.0, 0.0, 5.0),
            Vertex::new(0.0, 3.0, 0.0, 0.0),
            Vertex::new(0.0, 0.0, 4.0, -1.0),
        ];
        assert_eq!(triangle_area(&t), 6.0);
    }

    #[test]
    fn test_total_area() {
        let quad = [
            Vertex::new(0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 1.0, 0.0, 1.0),
            Vertex::new(0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 1.0, 0.0, 1.0),
            Vertex::new(0.0, 1.0, 0.0, 1.0),
        ];
        assert!((total_area(&quad) - 1.0).abs() < 1e-12);
        assert_eq!(total_area(&[]), 0.0);
    }
}
