use super::{clamp, Plane, Vertex};

/// Denominators with a smaller magnitude are treated as a segment parallel to the plane.
pub const PARALLEL_EPSILON: f64 = 1e-15;

/// A vertex in raw fixed-point words, i.e., signed integers scaled by 2^frac.
pub type FixedVertex = [i64; 4];

/// Determines the parameter t of the intersection between the line through v1 and v2 and the
/// given plane. That is, v1 + t * (v2 - v1) is the intersection point. The parameter is not
/// clamped. Returns `None` if the segment is (nearly) parallel to the plane.
///
/// # Arguments
/// * `v1` - The start of the segment.
/// * `v2` - The end of the segment.
/// * `plane` - The plane to compute the intersection with.
pub fn intersection_parameter(v1: &Vertex, v2: &Vertex, plane: &Plane) -> Option<f64> {
    let numerator = -plane.signed_distance(v1);
    let delta: Vertex = v2 - v1;
    let denominator = plane.signed_distance(&delta);

    if denominator.abs() < PARALLEL_EPSILON {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Determines the intersection between the segment from v1 to v2 and the given plane.
///
/// The intersection is restricted to the segment, i.e., t is clamped to [0,1]. If the plane hits
/// the line outside of the segment, the returned point is one of the two endpoints and does not
/// lie on the plane. A segment parallel to the plane returns v1 unchanged.
///
/// # Arguments
/// * `v1` - The start of the segment.
/// * `v2` - The end of the segment.
/// * `plane` - The plane to compute the intersection with.
pub fn segment_plane(v1: &Vertex, v2: &Vertex, plane: &Plane) -> Vertex {
    match intersection_parameter(v1, v2, plane) {
        Some(t) => {
            let t = clamp(t, 0f64, 1f64);
            let delta: Vertex = v2 - v1;
            v1 + delta * t
        }
        None => *v1,
    }
}

/// Floor division for signed integers.
#[inline]
fn div_floor(a: i128, b: i128) -> i128 {
    let q = a.wrapping_div(b);
    if (a.wrapping_rem(b) != 0) && ((a < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

/// Bit-accurate model of the fixed-point intersection datapath. All inputs are raw words scaled by
/// 2^frac. Products are shifted right by frac (rounding towards negative infinity), the parameter
/// t is computed with a floor division and is not clamped. A zero denominator yields t = 0, i.e.,
/// v1 is returned.
///
/// The datapath is modelled with 128-bit registers. Results are exact for words of up to 40 bits,
/// wider words wrap around like an undersized register instead of panicking.
///
/// # Arguments
/// * `v1` - The start of the segment.
/// * `v2` - The end of the segment.
/// * `plane` - The plane coefficients (a,b,c,d).
/// * `frac` - The number of fractional bits of all words, at most 127.
pub fn segment_plane_fixed(
    v1: &FixedVertex,
    v2: &FixedVertex,
    plane: &FixedVertex,
    frac: u32,
) -> FixedVertex {
    assert!(frac < 128, "Fraction of {} bits exceeds the datapath", frac);

    let mul = |a: i128, b: i128| a.wrapping_mul(b) >> frac;

    let mut delta = [0i128; 4];
    let mut num = 0i128;
    let mut den = 0i128;
    for k in 0..4 {
        delta[k] = v2[k] as i128 - v1[k] as i128;
        num = num.wrapping_add(mul(plane[k] as i128, v1[k] as i128));
        den = den.wrapping_add(mul(plane[k] as i128, delta[k]));
    }
    let num = num.wrapping_neg();

    let t = if den == 0 {
        0
    } else {
        div_floor(num.wrapping_shl(frac), den)
    };

    let mut result = [0i64; 4];
    for k in 0..4 {
        result[k] = (v1[k] as i128).wrapping_add(mul(t, delta[k])) as i64;
    }

    result
}
