//! Canonical spline descriptors in the G2 convention.
use crate::nurbs::knot;

/// How rational surface coefficients store their coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceWeights {
    /// Coordinates as given, followed by the weight.
    #[default]
    Raw,
    /// Coordinates multiplied by the weight, followed by the weight. This is
    /// the convention of rational curves.
    Premultiplied,
}

/// The B-spline basis of one parameter direction: a full knot vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineBasis {
    /// Number of coefficients.
    pub count: usize,
    /// Degree + 1.
    pub order: usize,
    /// The knots, `count + order` of them for a conventional basis.
    pub knots: Vec<f64>,
}

impl SplineBasis {
    /// Returns `true` if the knot vector has exactly `count + order` knots.
    pub fn is_conventional(&self) -> bool {
        self.order >= 1 && self.count >= self.order && self.knots.len() == self.count + self.order
    }

    /// The parameter interval, `None` for a non-conventional basis.
    pub fn domain(&self) -> Option<(f64, f64)> {
        self.is_conventional()
            .then(|| (self.knots[self.order - 1], self.knots[self.count]))
    }
}

/// A B-spline or NURBS curve in G2 form.
///
/// Rational coefficients are stored homogeneously: coordinates premultiplied
/// by the weight, followed by the weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineCurve {
    /// Number of spatial coordinates.
    pub dimension: usize,
    /// Whether every coefficient carries a weight.
    pub rational: bool,
    /// The basis.
    pub basis: SplineBasis,
    /// `basis.count * (dimension + rational)` values.
    pub coefs: Vec<f64>,
}

impl SplineCurve {
    /// Values per coefficient.
    pub fn coef_size(&self) -> usize {
        self.dimension + self.rational as usize
    }

    /// Evaluates the curve at `t`, clamped to the domain.
    ///
    /// Returns `None` if the buffers do not fit together.
    pub fn point_at(&self, t: f64) -> Option<Vec<f64>> {
        if !self.basis.is_conventional() || self.coefs.len() != self.basis.count * self.coef_size()
        {
            return None;
        }
        let point = knot::de_boor(
            &self.basis.knots,
            self.basis.order - 1,
            &self.coefs,
            self.coef_size(),
            t,
        );
        Some(if self.rational {
            knot::dehomogenize(point)
        } else {
            point
        })
    }
}

/// A tensor product B-spline or NURBS surface in G2 form.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineSurface {
    /// Number of spatial coordinates.
    pub dimension: usize,
    /// Whether every coefficient carries a weight.
    pub rational: bool,
    /// How rational coordinates are stored.
    pub weights: SurfaceWeights,
    /// Basis of direction 0 and direction 1.
    pub bases: [SplineBasis; 2],
    /// Coefficients in emission order: coefficient `(i, j)` is record
    /// `j * bases[0].count + i`.
    pub coefs: Vec<f64>,
}

impl SplineSurface {
    /// Values per coefficient.
    pub fn coef_size(&self) -> usize {
        self.dimension + self.rational as usize
    }

    /// Number of coefficient records.
    pub fn record_count(&self) -> usize {
        self.bases[0].count * self.bases[1].count
    }

    /// Coefficient record `(i, j)`, `i` in direction 0.
    pub fn coef(&self, i: usize, j: usize) -> Option<&[f64]> {
        let size = self.coef_size();
        let start = (j * self.bases[0].count + i) * size;
        (i < self.bases[0].count && j < self.bases[1].count)
            .then(|| self.coefs.get(start..start + size))
            .flatten()
    }

    /// Evaluates the surface at `(u, v)`, clamped to the domain.
    ///
    /// Returns `None` if the buffers do not fit together or a basis is not
    /// conventional.
    pub fn point_at(&self, u: f64, v: f64) -> Option<Vec<f64>> {
        let [basis_u, basis_v] = &self.bases;
        if !basis_u.is_conventional()
            || !basis_v.is_conventional()
            || self.coefs.len() != self.record_count() * self.coef_size()
        {
            return None;
        }
        let stride = self.coef_size();

        // Records are direction-0 fastest, so each run of `basis_u.count`
        // records is one curve in u.
        let mut column = Vec::with_capacity(basis_v.count * stride);
        for row in self.coefs.chunks_exact(basis_u.count * stride) {
            let homogeneous;
            let row = match (self.rational, self.weights) {
                (true, SurfaceWeights::Raw) => {
                    homogeneous = row
                        .chunks_exact(stride)
                        .flat_map(|cv| {
                            let w = cv[stride - 1];
                            cv[..stride - 1].iter().map(move |c| c * w).chain([w])
                        })
                        .collect::<Vec<_>>();
                    &homogeneous[..]
                }
                _ => row,
            };
            column.extend(knot::de_boor(
                &basis_u.knots,
                basis_u.order - 1,
                row,
                stride,
                u,
            ));
        }

        let point = knot::de_boor(&basis_v.knots, basis_v.order - 1, &column, stride, v);
        Some(if self.rational {
            knot::dehomogenize(point)
        } else {
            point
        })
    }
}

/// Anything the G2 writer can serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum G2Object {
    /// A curve.
    Curve(SplineCurve),
    /// A surface.
    Surface(SplineSurface),
}

impl From<SplineCurve> for G2Object {
    fn from(curve: SplineCurve) -> Self {
        G2Object::Curve(curve)
    }
}

impl From<SplineSurface> for G2Object {
    fn from(surface: SplineSurface) -> Self {
        G2Object::Surface(surface)
    }
}
