//! NURBS curves in the source (archive) convention.
use super::knot::{self, KnotEnd};
use crate::normalize::{pad_knot_vector, premultiply_by_weight};
use crate::{ConversionError, Error, Result};

/// Relative tolerance used when comparing knot spacings for periodicity.
const PERIODIC_KNOT_TOLERANCE: f64 = 1e-12;

/// A NURBS curve as handed over by the model reader.
///
/// The knot vector omits the two superfluous boundary knots, so it holds
/// `cv_count + order - 2` values. Control vertices are stored in one flat
/// buffer, `cv_size()` values per vertex: the Euclidean coordinates followed
/// by the weight if the curve is rational.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve {
    dimension: usize,
    is_rational: bool,
    order: usize,
    cv_count: usize,
    knots: Vec<f64>,
    cvs: Vec<f64>,
}

impl NurbsCurve {
    /// Creates a curve from raw buffers.
    ///
    /// # Arguments
    ///
    /// * `dimension` - Number of coordinates per control vertex.
    /// * `is_rational` - If `true` every control vertex carries a trailing
    ///   weight.
    /// * `order` - Degree + 1, at least 2.
    /// * `knots` - `cv_count + order - 2` knots.
    /// * `cvs` - `cv_count * (dimension + is_rational)` values.
    pub fn new(
        dimension: usize,
        is_rational: bool,
        order: usize,
        knots: Vec<f64>,
        cvs: Vec<f64>,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidGeometry(
                "Curve dimension must be at least 1.".to_string(),
            ));
        }
        if order < 2 {
            return Err(Error::InvalidGeometry(format!(
                "Curve order must be at least 2, got {order}."
            )));
        }
        let cv_size = dimension + is_rational as usize;
        if cvs.len() % cv_size != 0 {
            return Err(Error::InvalidGeometry(format!(
                "Control vertex buffer length {} is not a multiple of {cv_size}.",
                cvs.len()
            )));
        }
        let cv_count = cvs.len() / cv_size;
        if cv_count < order {
            return Err(Error::InvalidGeometry(format!(
                "Curve needs at least {order} control vertices, got {cv_count}."
            )));
        }
        if knots.len() != cv_count + order - 2 {
            return Err(Error::InvalidGeometry(format!(
                "Curve knot count must be {}, got {}.",
                cv_count + order - 2,
                knots.len()
            )));
        }

        let curve = Self {
            dimension,
            is_rational,
            order,
            cv_count,
            knots,
            cvs,
        };

        #[cfg(feature = "geometry_validation")]
        curve.validate()?;

        Ok(curve)
    }

    /// Creates a three dimensional curve from points and optional weights.
    pub fn from_points(
        order: usize,
        knots: Vec<f64>,
        points: &[[f64; 3]],
        weights: Option<&[f64]>,
    ) -> Result<Self> {
        match weights {
            None => Self::new(
                3,
                false,
                order,
                knots,
                bytemuck::cast_slice(points).to_vec(),
            ),
            Some(weights) => {
                if weights.len() != points.len() {
                    return Err(Error::InvalidGeometry(format!(
                        "Got {} weights for {} control vertices.",
                        weights.len(),
                        points.len()
                    )));
                }
                let cvs = points
                    .iter()
                    .zip(weights)
                    .flat_map(|(p, &w)| [p[0], p[1], p[2], w])
                    .collect();
                Self::new(3, true, order, knots, cvs)
            }
        }
    }

    #[cfg(feature = "geometry_validation")]
    fn validate(&self) -> Result<()> {
        if self.knots.iter().chain(&self.cvs).any(|v| !v.is_finite()) {
            return Err(Error::InvalidGeometry(
                "Curve contains non-finite values.".to_string(),
            ));
        }
        if !knot::is_non_decreasing(&self.knots) {
            return Err(Error::InvalidGeometry(
                "Curve knots must be non-decreasing.".to_string(),
            ));
        }
        let (t0, t1) = self.domain();
        if t0 >= t1 {
            return Err(Error::InvalidGeometry(format!(
                "Curve domain [{t0}, {t1}] is empty."
            )));
        }
        if self.is_rational && (0..self.cv_count).any(|i| self.weight(i) <= 0.0) {
            return Err(Error::InvalidGeometry(
                "Curve weights must be positive.".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of coordinates per control vertex.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns `true` if the control vertices carry weights.
    pub fn is_rational(&self) -> bool {
        self.is_rational
    }

    /// Degree + 1.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.order - 1
    }

    /// Number of control vertices.
    pub fn cv_count(&self) -> usize {
        self.cv_count
    }

    /// Number of values per control vertex in [`cvs()`](Self::cvs).
    pub fn cv_size(&self) -> usize {
        self.dimension + self.is_rational as usize
    }

    /// Number of stored knots, `cv_count + order - 2`.
    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    /// The stored knots, without the superfluous boundary knots.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// The flat control vertex buffer.
    pub fn cvs(&self) -> &[f64] {
        &self.cvs
    }

    /// The Euclidean coordinates of control vertex `index`.
    pub fn cv(&self, index: usize) -> &[f64] {
        let start = index * self.cv_size();
        &self.cvs[start..start + self.dimension]
    }

    /// The weight of control vertex `index`; `1.0` for non-rational curves.
    pub fn weight(&self, index: usize) -> f64 {
        if self.is_rational {
            self.cvs[index * self.cv_size() + self.dimension]
        } else {
            1.0
        }
    }

    /// The parameter interval the curve is defined on.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.order - 2], self.knots[self.cv_count - 1])
    }

    /// The implicit knot before the first resp. after the last stored knot.
    pub fn superfluous_knot(&self, end: KnotEnd) -> f64 {
        knot::superfluous_knot(self.order, &self.knots, end)
    }

    /// The full knot vector of `cv_count + order` knots.
    pub fn full_knots(&self) -> Vec<f64> {
        pad_knot_vector(
            &self.knots,
            self.superfluous_knot(KnotEnd::Start),
            self.superfluous_knot(KnotEnd::End),
        )
    }

    /// Control vertices in homogeneous form: coordinates multiplied by the
    /// weight followed by the weight. Non-rational curves are returned as
    /// is.
    pub fn homogeneous_cvs(&self) -> Vec<f64> {
        if !self.is_rational {
            return self.cvs.clone();
        }
        let mut homogeneous = Vec::with_capacity(self.cvs.len());
        for i in 0..self.cv_count {
            let w = self.weight(i);
            homogeneous.extend(premultiply_by_weight(self.cv(i), w));
            homogeneous.push(w);
        }
        homogeneous
    }

    /// Returns `true` if the curve wraps around on itself periodically.
    ///
    /// The knot spacing has to repeat with the period of the domain and the
    /// last `order - 1` control vertices have to duplicate the first ones.
    pub fn is_periodic(&self) -> bool {
        let order = self.order;
        if order < 3 || self.cv_count < 2 * order - 2 {
            return false;
        }

        let (t0, t1) = self.domain();
        let period = t1 - t0;
        let tolerance = PERIODIC_KNOT_TOLERANCE * period.abs().max(1.0);
        let m = self.cv_count - order + 1;
        let knots_wrap = (0..2 * order - 3)
            .all(|i| ((self.knots[i + m] - self.knots[i]) - period).abs() <= tolerance);
        if !knots_wrap {
            return false;
        }

        let cv_size = self.cv_size();
        let tail = (self.cv_count - (order - 1)) * cv_size;
        self.cvs[..(order - 1) * cv_size] == self.cvs[tail..]
    }

    /// Raises the multiplicity of the knot `value` to `multiplicity`.
    ///
    /// The shape of the curve does not change. Knots already present with at
    /// least the requested multiplicity are left alone.
    ///
    /// When `value` is an end of the domain and the multiplicity reaches
    /// `order - 1`, the control vertices and knots that lie entirely outside
    /// the domain at that end are dropped, leaving the curve clamped there.
    /// Inserting at both domain ends therefore turns a periodic curve into an
    /// equivalent open one.
    pub fn insert_knot(
        &mut self,
        value: f64,
        multiplicity: usize,
    ) -> std::result::Result<(), ConversionError> {
        let p = self.degree();
        if multiplicity == 0 || multiplicity > p {
            return Err(ConversionError::KnotInsertionFailed(format!(
                "multiplicity {multiplicity} is outside 1..={p}"
            )));
        }
        let (t0, t1) = self.domain();
        if !(t0..=t1).contains(&value) {
            return Err(ConversionError::KnotInsertionFailed(format!(
                "knot {value} is outside the domain [{t0}, {t1}]"
            )));
        }

        let s = knot::multiplicity(&self.knots, value);
        if s < multiplicity {
            self.insert_knot_times(value, s, multiplicity - s)?;
        }

        if value == t0 && multiplicity == p {
            self.trim_outside_domain(KnotEnd::Start)?;
        }
        if value == t1 && multiplicity == p {
            self.trim_outside_domain(KnotEnd::End)?;
        }
        Ok(())
    }

    /// Boehm insertion of `value`, `r` times, into a knot already present
    /// `s` times. Works on the homogeneous control polygon.
    fn insert_knot_times(
        &mut self,
        value: f64,
        s: usize,
        r: usize,
    ) -> std::result::Result<(), ConversionError> {
        let p = self.degree();
        let n = self.cv_count;
        let stride = self.cv_size();
        let u = self.full_knots();
        let pw = self.homogeneous_cvs();

        // Last knot not greater than the value; it needs a successor.
        let k = match u.iter().rposition(|&x| x <= value) {
            Some(k) if k >= p && k + 1 < u.len() && k - s < n => k,
            _ => {
                return Err(ConversionError::KnotInsertionFailed(format!(
                    "no knot span for {value}"
                )))
            }
        };

        let point = |buffer: &[f64], i: usize| buffer[i * stride..(i + 1) * stride].to_vec();
        let mut qw = vec![0.0; (n + r) * stride];
        let put = |buffer: &mut [f64], i: usize, values: &[f64]| {
            buffer[i * stride..(i + 1) * stride].copy_from_slice(values)
        };

        for i in 0..=k - p {
            put(&mut qw, i, &point(&pw, i));
        }
        for i in k - s..n {
            put(&mut qw, i + r, &point(&pw, i));
        }

        let mut rw: Vec<Vec<f64>> = (0..=p - s).map(|i| point(&pw, k - p + i)).collect();
        let mut l = k - p;
        for j in 1..=r {
            l = k - p + j;
            for i in 0..=p - j - s {
                let denom = u[i + k + 1] - u[l + i];
                if denom <= 0.0 {
                    return Err(ConversionError::KnotInsertionFailed(format!(
                        "zero length knot span at {value}"
                    )));
                }
                let alpha = (value - u[l + i]) / denom;
                let (lower, upper) = rw.split_at_mut(i + 1);
                for (a, &b) in lower[i].iter_mut().zip(&upper[0]) {
                    *a = alpha * b + (1.0 - alpha) * *a;
                }
            }
            put(&mut qw, l, &rw[0]);
            put(&mut qw, k + r - j - s, &rw[p - j - s]);
        }
        for i in l + 1..k - s {
            put(&mut qw, i, &rw[i - l]);
        }

        // Source knots are the full knots without the outermost two.
        let mut knots = Vec::with_capacity(self.knots.len() + r);
        knots.extend_from_slice(&u[1..=k]);
        knots.extend(std::iter::repeat(value).take(r));
        knots.extend_from_slice(&u[k + 1..u.len() - 1]);

        self.replace_homogeneous(knots, qw)
    }

    /// Drops control vertices whose support ends before (resp. starts
    /// after) the domain, once the end knot has multiplicity `order - 1`.
    fn trim_outside_domain(&mut self, end: KnotEnd) -> std::result::Result<(), ConversionError> {
        let p = self.degree();
        let stride = self.cv_size();
        let (t0, t1) = self.domain();
        let len = self.knots.len();

        match end {
            KnotEnd::Start => {
                let last = match self.knots.iter().rposition(|&k| k == t0) {
                    Some(last) if last + 1 >= p => last,
                    _ => return Ok(()),
                };
                let drop = last + 1 - p;
                if drop > 0 {
                    self.knots.drain(..drop);
                    self.cvs.drain(..drop * stride);
                    self.cv_count -= drop;
                }
            }
            KnotEnd::End => {
                let first = match self.knots.iter().position(|&k| k == t1) {
                    Some(first) if first + p <= len => first,
                    _ => return Ok(()),
                };
                let drop = len - (first + p);
                if drop > 0 {
                    self.knots.truncate(len - drop);
                    self.cvs.truncate((self.cv_count - drop) * stride);
                    self.cv_count -= drop;
                }
            }
        }

        if self.cv_count < self.order {
            return Err(ConversionError::KnotInsertionFailed(format!(
                "clamping left {} control vertices for order {}",
                self.cv_count, self.order
            )));
        }
        Ok(())
    }

    /// Replaces knots and control vertices with homogeneous control vertices
    /// converted back to coordinates + weight.
    fn replace_homogeneous(
        &mut self,
        knots: Vec<f64>,
        homogeneous: Vec<f64>,
    ) -> std::result::Result<(), ConversionError> {
        let stride = self.cv_size();
        let mut cvs = homogeneous;
        if self.is_rational {
            for cv in cvs.chunks_exact_mut(stride) {
                let w = cv[stride - 1];
                if w == 0.0 {
                    return Err(ConversionError::KnotInsertionFailed(
                        "knot insertion produced a zero weight".to_string(),
                    ));
                }
                cv[..stride - 1].iter_mut().for_each(|c| *c /= w);
            }
        }
        self.cv_count = cvs.len() / stride;
        self.knots = knots;
        self.cvs = cvs;
        Ok(())
    }

    /// Evaluates the curve at `t`. Parameters outside the domain are clamped.
    pub fn point_at(&self, t: f64) -> Vec<f64> {
        let point = knot::de_boor(
            &self.full_knots(),
            self.degree(),
            &self.homogeneous_cvs(),
            self.cv_size(),
            t,
        );
        if self.is_rational {
            knot::dehomogenize(point)
        } else {
            point
        }
    }
}
