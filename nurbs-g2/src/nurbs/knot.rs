//! Knot vector utilities shared by curves, surfaces and the canonical
//! descriptors.
//!
//! Two knot conventions meet in this crate:
//!
//! * The *source* convention stores `cv_count + order - 2` knots. The two
//!   outermost knots of a full B-spline knot vector are implicit
//!   ("superfluous") because they never influence the curve on its domain.
//! * The *full* convention (used by G2 and by the evaluation code here) stores
//!   all `cv_count + order` knots.

/// Which end of a knot vector or parameter domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnotEnd {
    /// The start of the domain.
    Start,
    /// The end of the domain.
    End,
}

/// Returns `true` if no knot is smaller than its predecessor.
pub fn is_non_decreasing(knots: &[f64]) -> bool {
    knots.windows(2).all(|w| w[0] <= w[1])
}

/// Number of knots exactly equal to `value`.
pub fn multiplicity(knots: &[f64], value: f64) -> usize {
    knots.iter().filter(|&&k| k == value).count()
}

/// Returns `true` if the first (resp. last) `order - 1` knots of a
/// source-convention knot vector coincide.
pub fn is_clamped(order: usize, knots: &[f64], end: KnotEnd) -> bool {
    if order < 2 || knots.len() < order - 1 {
        return false;
    }
    let run = match end {
        KnotEnd::Start => &knots[..order - 1],
        KnotEnd::End => &knots[knots.len() + 1 - order..],
    };
    run.iter().all(|&k| k == run[0])
}

/// The implicit boundary knot of a source-convention knot vector.
///
/// At a clamped end this is the end knot itself. Otherwise the adjacent knot
/// spacing is extrapolated one step outwards.
pub fn superfluous_knot(order: usize, knots: &[f64], end: KnotEnd) -> f64 {
    let len = knots.len();
    match end {
        KnotEnd::Start => {
            if is_clamped(order, knots, end) || len < 2 {
                knots[0]
            } else {
                2.0 * knots[0] - knots[1]
            }
        }
        KnotEnd::End => {
            if is_clamped(order, knots, end) || len < 2 {
                knots[len - 1]
            } else {
                2.0 * knots[len - 1] - knots[len - 2]
            }
        }
    }
}

/// Finds the span index `k` of a full knot vector with `knots[k] <= t <
/// knots[k + 1]`, restricted to the domain `[knots[degree],
/// knots[cv_count]]`.
///
/// Parameters outside the domain map to the first resp. last span.
pub fn find_span(knots: &[f64], degree: usize, cv_count: usize, t: f64) -> usize {
    if t >= knots[cv_count] {
        // Last non-empty span.
        let mut span = cv_count - 1;
        while span > degree && knots[span] == knots[span + 1] {
            span -= 1;
        }
        return span;
    }
    if t <= knots[degree] {
        let mut span = degree;
        while span + 1 < cv_count && knots[span + 1] <= t {
            span += 1;
        }
        return span;
    }

    let (mut low, mut high) = (degree, cv_count);
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Evaluates a B-spline with de Boor's algorithm.
///
/// `knots` is a full knot vector, `cvs` holds `cv_count` control points of
/// `stride` values each. For rational splines pass homogeneous control
/// points; the result is then homogeneous as well.
pub fn de_boor(knots: &[f64], degree: usize, cvs: &[f64], stride: usize, t: f64) -> Vec<f64> {
    let cv_count = cvs.len() / stride;
    let (t0, t1) = (knots[degree], knots[cv_count]);
    let t = t.clamp(t0, t1);
    let span = find_span(knots, degree, cv_count, t);

    let mut d: Vec<Vec<f64>> = (0..=degree)
        .map(|j| {
            let index = span - degree + j;
            cvs[index * stride..(index + 1) * stride].to_vec()
        })
        .collect();

    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let i = span - degree + j;
            let denom = knots[i + degree + 1 - r] - knots[i];
            let alpha = if denom == 0.0 {
                0.0
            } else {
                (t - knots[i]) / denom
            };
            let (lower, upper) = d.split_at_mut(j);
            let previous = &lower[j - 1];
            for (value, &prev) in upper[0].iter_mut().zip(previous) {
                *value = (1.0 - alpha) * prev + alpha * *value;
            }
        }
    }

    d.swap_remove(degree)
}

/// Divides the leading coordinates of a homogeneous point by its trailing
/// weight.
pub fn dehomogenize(mut point: Vec<f64>) -> Vec<f64> {
    if let Some(w) = point.pop() {
        if w != 0.0 {
            point.iter_mut().for_each(|c| *c /= w);
        }
    }
    point
}
