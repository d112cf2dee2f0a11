use log::trace;
use serde::{Deserialize, Serialize};

use crate::math::{segment_plane, Plane, Triangle, Vertex};

/// The order of the intersection points in the emitted triangles.
///
/// With one vertex inside, the triangle `[in, first, second]` is emitted, where `a` and `b` are
/// the outside vertices in cyclic order following `in` and `ia`, `ib` the intersections on the
/// edges `in`-`a` and `in`-`b`.
///
/// With one vertex outside, let `p` and `q` be the inside vertices in cyclic order following
/// `out`, `ip` the intersection on the edge `p`-`out` and `iq` the one on `q`-`out`. The quad
/// `p, q, iq, ip` is always split into `[p, q, first]` and `[q, second, first]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadSplit {
    /// `first = ia`, `second = ib` and `first = ip`, `second = iq`. This is the order of the
    /// clipper RTL.
    #[default]
    Cyclic,

    /// The intersections are listed by the index of the crossed edge in both cases, where edge k
    /// connects vertex k and k+1. This is the order of the multi-plane geometry shader model.
    EdgeOrder,
}

/// The result of clipping a single triangle against a single plane.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipResult {
    vertices: Vec<Vertex>,
}

impl ClipResult {
    fn culled() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    fn single(t: Triangle) -> Self {
        Self { vertices: t.to_vec() }
    }

    fn pair(t0: Triangle, t1: Triangle) -> Self {
        let mut vertices = Vec::with_capacity(6);
        vertices.extend_from_slice(&t0);
        vertices.extend_from_slice(&t1);

        Self { vertices }
    }

    /// Returns the emitted vertices, three per triangle. The list has 0, 3 or 6 entries.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of emitted triangles, i.e., 0, 1 or 2.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Returns true if at least one triangle has been emitted.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty()
    }

    /// Returns an iterator over the emitted triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Determines which vertices of the triangle lie inside of the plane.
///
/// # Arguments
/// * `triangle` - The triangle to classify.
/// * `plane` - The clipping plane.
pub fn classify(triangle: &Triangle, plane: &Plane) -> [bool; 3] {
    [
        plane.contains(&triangle[0]),
        plane.contains(&triangle[1]),
        plane.contains(&triangle[2]),
    ]
}

/// Clips the triangle against the plane with the vertex order of the clipper RTL.
///
/// # Arguments
/// * `triangle` - The triangle to clip.
/// * `plane` - The clipping plane.
pub fn clip(triangle: &Triangle, plane: &Plane) -> ClipResult {
    clip_with(triangle, plane, QuadSplit::Cyclic)
}

/// Clips the triangle against the plane.
///
/// # Arguments
/// * `triangle` - The triangle to clip.
/// * `plane` - The clipping plane.
/// * `split` - The vertex order used if two triangles are emitted.
pub fn clip_with(triangle: &Triangle, plane: &Plane, split: QuadSplit) -> ClipResult {
    let inside = classify(triangle, plane);
    let inside_count = inside.iter().filter(|i| **i).count();

    trace!("Clip {:?} against {:?}: inside={:?}", triangle, plane, inside);

    match inside_count {
        0 => ClipResult::culled(),
        3 => ClipResult::single(*triangle),
        1 => {
            let i = inside.iter().position(|i| *i).unwrap_or(0);
            let v_in = &triangle[i];
            let v_a = &triangle[(i + 1) % 3];
            let v_b = &triangle[(i + 2) % 3];

            let ia = segment_plane(v_in, v_a, plane);
            let ib = segment_plane(v_in, v_b, plane);

            // edge i (in-a) only comes first if the inside vertex is vertex 0
            let (first, second) = match split {
                QuadSplit::Cyclic => (ia, ib),
                QuadSplit::EdgeOrder if i == 0 => (ia, ib),
                QuadSplit::EdgeOrder => (ib, ia),
            };

            ClipResult::single([*v_in, first, second])
        }
        _ => {
            let o = inside.iter().position(|i| !*i).unwrap_or(0);
            let v_out = &triangle[o];
            let v_p = &triangle[(o + 1) % 3];
            let v_q = &triangle[(o + 2) % 3];

            let ip = segment_plane(v_p, v_out, plane);
            let iq = segment_plane(v_q, v_out, plane);

            let (first, second) = match split {
                QuadSplit::Cyclic => (ip, iq),
                // edge o (out-p) only comes first if the outside vertex is vertex 0
                QuadSplit::EdgeOrder if o == 0 => (ip, iq),
                QuadSplit::EdgeOrder => (iq, ip),
            };

            ClipResult::pair([*v_p, *v_q, first], [*v_q, second, first])
        }
    }
}

/// Passes the triangle through all planes in order and returns the surviving triangles. Each
/// triangle emitted by one plane is clipped against the next one.
///
/// # Arguments
/// * `triangle` - The triangle to clip.
/// * `planes` - The clipping planes, e.g., the result of `Plane::frustum()`.
/// * `split` - The vertex order used if two triangles are emitted.
pub fn clip_against_planes(triangle: &Triangle, planes: &[Plane], split: QuadSplit) -> Vec<Triangle> {
    let mut current = vec![*triangle];

    for plane in planes {
        current = current
            .iter()
            .flat_map(|t| clip_with(t, plane, split).triangles().collect::<Vec<_>>())
            .collect();

        if current.is_empty() {
            break;
        }
    }

    current
}

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use crate::math::{total_area, triangle_area};

    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vertex {
        Vertex::new(x, y, z, 1.0)
    }

    fn x_plane() -> Plane {
        Plane::new(1.0, 0.0, 0.0, 0.0)
    }

    fn random_triangle(r: &mut ChaCha8Rng) -> Triangle {
        let mut p = || v(
            r.random_range(-1280.0..1279.0),
            r.random_range(-1280.0..1279.0),
            r.random_range(-1280.0..1279.0),
        );
        [p(), p(), p()]
    }

    fn random_plane(r: &mut ChaCha8Rng) -> Plane {
        Plane::new(
            r.random_range(-1.0..1.0),
            r.random_range(-1.0..1.0),
            r.random_range(-1.0..1.0),
            r.random_range(-100.0..100.0),
        )
    }

    #[test]
    fn test_classification() {
        let t = [v(-10.0, 0.0, 0.0), v(-20.0, 5.0, 0.0), v(-30.0, -5.0, 0.0)];
        let r = clip(&t, &x_plane());
        assert_eq!(r.num_triangles(), 0);
        assert!(!r.is_valid());
        assert!(r.vertices().is_empty());

        let t = [v(10.0, 0.0, 0.0), v(-20.0, 5.0, 0.0), v(-30.0, -5.0, 0.0)];
        let r = clip(&t, &x_plane());
        assert_eq!(r.num_triangles(), 1);
        assert!(r.is_valid());

        let t = [v(10.0, 0.0, 0.0), v(20.0, 5.0, 0.0), v(-30.0, -5.0, 0.0)];
        let r = clip(&t, &x_plane());
        assert_eq!(r.num_triangles(), 2);
        assert_eq!(r.vertices().len(), 6);
        assert!(r.is_valid());

        let t = [v(10.0, 0.0, 0.0), v(20.0, 5.0, 0.0), v(30.0, -5.0, 0.0)];
        let r = clip(&t, &x_plane());
        assert_eq!(r.num_triangles(), 1);
        assert_eq!(r.vertices(), &t[..]);
    }

    #[test]
    fn test_boundary_is_inside() {
        let t = [v(0.0, 0.0, 0.0), v(0.0, 5.0, 0.0), v(0.0, -5.0, 3.0)];
        let r = clip(&t, &x_plane());
        assert_eq!(r.vertices(), &t[..]);
    }

    #[test]
    fn test_one_inside_order() {
        // the inside vertex is v1, thus the intersections follow v2 and then v0
        let t = [v(-10.0, 0.0, 0.0), v(10.0, 0.0, 0.0), v(-10.0, 20.0, 0.0)];
        let r = clip(&t, &x_plane());

        assert_eq!(
            r.vertices(),
            &[v(10.0, 0.0, 0.0), v(0.0, 10.0, 0.0), v(0.0, 0.0, 0.0)][..]
        );
    }

    #[test]
    fn test_one_inside_edge_order() {
        let a = v(10.0, 0.0, 0.0);
        let b = v(-10.0, 0.0, 0.0);
        let c = v(-10.0, 20.0, 0.0);

        // the point on edge a-b and a-c
        let iab = v(0.0, 0.0, 0.0);
        let iac = v(0.0, 10.0, 0.0);

        // v0 inside: edge 0 (a-b) comes before edge 2 (c-a), same as the cyclic order
        let t = [a, b, c];
        let r = clip_with(&t, &x_plane(), QuadSplit::EdgeOrder);
        assert_eq!(r.vertices(), &[a, iab, iac][..]);
        assert_eq!(r, clip(&t, &x_plane()));

        // v1 inside: edge 0 (b-a) comes before edge 1 (a-c)
        let r = clip_with(&[b, a, c], &x_plane(), QuadSplit::EdgeOrder);
        assert_eq!(r.vertices(), &[a, iab, iac][..]);
        let r = clip(&[b, a, c], &x_plane());
        assert_eq!(r.vertices(), &[a, iac, iab][..]);

        // v2 inside: edge 1 (c-a) comes before edge 2 (a-b)
        let r = clip_with(&[b, c, a], &x_plane(), QuadSplit::EdgeOrder);
        assert_eq!(r.vertices(), &[a, iac, iab][..]);
        let r = clip(&[b, c, a], &x_plane());
        assert_eq!(r.vertices(), &[a, iab, iac][..]);
    }

    #[test]
    fn test_two_inside_order() {
        let a = v(10.0, 0.0, 0.0);
        let b = v(10.0, 20.0, 0.0);
        let c = v(-10.0, 0.0, 0.0);

        // the point on edge a-c and b-c
        let iac = v(0.0, 0.0, 0.0);
        let ibc = v(0.0, 10.0, 0.0);

        // v2 outside
        let r = clip(&[a, b, c], &x_plane());
        assert_eq!(r.vertices(), &[a, b, iac, b, ibc, iac][..]);

        // v0 outside, inside vertices follow as b, a
        let r = clip(&[c, b, a], &x_plane());
        assert_eq!(r.vertices(), &[b, a, ibc, a, iac, ibc][..]);

        // v1 outside, inside vertices follow as b, a
        let r = clip(&[a, c, b], &x_plane());
        assert_eq!(r.vertices(), &[b, a, ibc, a, iac, ibc][..]);
    }

    #[test]
    fn test_two_inside_edge_order() {
        let a = v(10.0, 0.0, 0.0);
        let b = v(10.0, 20.0, 0.0);
        let c = v(-10.0, 0.0, 0.0);
        let iac = v(0.0, 0.0, 0.0);
        let ibc = v(0.0, 10.0, 0.0);

        // v0 outside: both orders agree
        let t = [c, b, a];
        assert_eq!(
            clip_with(&t, &x_plane(), QuadSplit::EdgeOrder),
            clip_with(&t, &x_plane(), QuadSplit::Cyclic)
        );

        // v2 outside: edge 1 (b-c) comes before edge 2 (c-a)
        let r = clip_with(&[a, b, c], &x_plane(), QuadSplit::EdgeOrder);
        assert_eq!(r.vertices(), &[a, b, ibc, b, iac, ibc][..]);

        // v1 outside: edge 0 (a-c) comes before edge 1 (c-b)
        let r = clip_with(&[a, c, b], &x_plane(), QuadSplit::EdgeOrder);
        assert_eq!(r.vertices(), &[b, a, iac, a, ibc, iac][..]);
    }

    #[test]
    fn test_random_invariants() {
        let mut r = ChaCha8Rng::seed_from_u64(3);
        let mut seen = [0usize; 4];

        for _ in 0..2000 {
            let t = random_triangle(&mut r);
            let plane = random_plane(&mut r);
            let inside_count = classify(&t, &plane).iter().filter(|i| **i).count();
            seen[inside_count] += 1;

            let result = clip(&t, &plane);
            let n = result.vertices().len();
            assert!(n == 0 || n == 3 || n == 6);
            assert_eq!(n, 3 * result.num_triangles());
            assert_eq!(result.is_valid(), result.num_triangles() > 0);

            match inside_count {
                0 => assert!(!result.is_valid()),
                3 => assert_eq!(result.vertices(), &t[..]),
                1 => assert_eq!(result.num_triangles(), 1),
                _ => assert_eq!(result.num_triangles(), 2),
            }

            // every emitted vertex is inside, up to rounding
            for p in result.vertices() {
                assert!(plane.signed_distance(p) > -1e-6);
            }

            // clipping never adds area
            let original = triangle_area(&t);
            assert!(total_area(result.vertices()) <= original * (1.0 + 1e-9) + 1e-9);
        }

        assert!(seen.iter().all(|n| *n > 0), "{:?}", seen);
    }

    #[test]
    fn test_clip_against_planes() {
        let planes = Plane::frustum();

        // fully inside
        let t = [v(0.0, 0.0, 0.0), v(0.1, 0.1, 0.1), v(-0.1, 0.1, -0.1)];
        assert_eq!(clip_against_planes(&t, &planes, QuadSplit::Cyclic), vec![t]);

        // fully outside of the right plane
        let t = [v(2.0, 0.0, 0.0), v(2.1, 0.1, 0.1), v(2.2, -0.1, -0.1)];
        assert!(clip_against_planes(&t, &planes, QuadSplit::Cyclic).is_empty());

        // crossing the right plane only
        let t = [v(0.0, 0.0, 0.0), v(2.0, 0.0, 0.0), v(0.0, 0.5, 0.0)];
        let clipped = clip_against_planes(&t, &planes, QuadSplit::Cyclic);
        assert_eq!(clipped.len(), 2);
        for tri in clipped.iter() {
            for p in tri.iter() {
                assert!(planes.iter().all(|plane| plane.signed_distance(p) > -1e-12));
            }
        }

        // crossing several planes never adds area
        let t = [v(-3.0, -3.0, 0.0), v(3.0, -3.0, 0.0), v(0.0, 3.0, 0.0)];
        let clipped = clip_against_planes(&t, &planes, QuadSplit::EdgeOrder);
        let area: f64 = clipped.iter().map(triangle_area).sum();
        assert!(area > 0.0 && area <= 4.0 + 1e-9);
    }
}
