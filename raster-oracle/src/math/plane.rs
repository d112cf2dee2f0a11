use nalgebra_glm::{DVec3, DVec4};
use serde::{Deserialize, Serialize};

use super::Vertex;

/// A homogeneous half-space. Let eq = (a,b,c,d) and v = (x,y,z,w) be some vertex. Then
/// a*x + b*y + c*z + d*w >= 0     if the vertex is inside
/// a*x + b*y + c*z + d*w < 0      if the vertex is outside
///
/// Vertices exactly on the plane count as inside.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// The normal part (a, b, c) of the plane equation.
    pub n: DVec3,

    /// The offset d, which is multiplied with the homogeneous coordinate w.
    pub d: f64,
}

impl Plane {
    /// Creates the plane from its four coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            n: DVec3::new(a, b, c),
            d,
        }
    }

    /// Creates the plane from the given plane equation (a,b,c,d) as is.
    ///
    /// # Arguments
    /// * `eq` - The plane equation coefficients (a,b,c,d)
    pub fn from_equation(eq: &DVec4) -> Self {
        Self::new(eq[0], eq[1], eq[2], eq[3])
    }

    /// Creates the plane from the normal and offset, where only the normal gets normalized. The
    /// offset is kept as is, which is how the clipper stimulus is built. Returns `None` if the
    /// normal is too short to be normalized.
    ///
    /// # Arguments
    /// * `n` - The unnormalized normal (a,b,c).
    /// * `d` - The offset.
    pub fn from_normal_with_normalization(n: &DVec3, d: f64) -> Option<Self> {
        let l = n.norm();
        if l < 1e-6 {
            return None;
        }

        Some(Self { n: *n / l, d })
    }

    /// Returns the six planes of the canonical clip volume, i.e., -w <= x,y,z <= w.
    /// The order is left, right, bottom, top, near and far.
    pub fn frustum() -> [Self; 6] {
        [
            Self::new(1.0, 0.0, 0.0, 1.0),
            Self::new(-1.0, 0.0, 0.0, 1.0),
            Self::new(0.0, 1.0, 0.0, 1.0),
            Self::new(0.0, -1.0, 0.0, 1.0),
            Self::new(0.0, 0.0, 1.0, 1.0),
            Self::new(0.0, 0.0, -1.0, 1.0),
        ]
    }

    /// Returns the plane equation coefficients (a,b,c,d).
    #[inline]
    pub fn equation(&self) -> DVec4 {
        DVec4::new(self.n[0], self.n[1], self.n[2], self.d)
    }

    /// Returns the homogeneous dot product between the plane and the given vertex.
    ///
    /// # Arguments
    /// * `v` - The vertex in homogeneous coordinates.
    #[inline]
    pub fn signed_distance(&self, v: &Vertex) -> f64 {
        self.n[0] * v[0] + self.n[1] * v[1] + self.n[2] * v[2] + self.d * v[3]
    }

    /// Returns true if the vertex is inside the half-space, including the boundary.
    #[inline]
    pub fn contains(&self, v: &Vertex) -> bool {
        self.signed_distance(v) >= 0f64
    }
}
