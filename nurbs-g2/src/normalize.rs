//! Knot and weight normalization shared by the curve and surface converters.
//!
//! Both helpers are pure. They only concatenate and multiply, so identical
//! input always yields bit-identical output.

/// Builds a full knot vector from a source-convention knot sequence and its
/// two implicit boundary knots.
///
/// The result has `interior.len() + 2` entries, i.e. `cv_count + order` for
/// a source curve.
///
/// ```
/// use nurbs_g2::normalize::pad_knot_vector;
///
/// let full = pad_knot_vector(&[0.0, 0.0, 1.0, 1.0], 0.0, 1.0);
/// assert_eq!(full, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
/// ```
pub fn pad_knot_vector(interior: &[f64], pre_boundary: f64, post_boundary: f64) -> Vec<f64> {
    let mut knots = Vec::with_capacity(interior.len() + 2);
    knots.push(pre_boundary);
    knots.extend_from_slice(interior);
    knots.push(post_boundary);
    knots
}

/// Scales every coordinate of `point` by `weight`.
///
/// The weight itself is not appended; callers that need homogeneous points
/// push it afterwards.
pub fn premultiply_by_weight(point: &[f64], weight: f64) -> Vec<f64> {
    point.iter().map(|&c| c * weight).collect()
}
