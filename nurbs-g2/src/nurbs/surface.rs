//! NURBS surfaces in the source (archive) convention.
use super::knot::{self, KnotEnd};
use crate::normalize::{pad_knot_vector, premultiply_by_weight};
use crate::{Error, Result};

/// A tensor product NURBS surface as handed over by the model reader.
///
/// Each parameter direction has its own order, control vertex count and knot
/// buffer. Control vertices live in one flat buffer in direction-0-major
/// order: vertex `(i, j)` starts at `(i * cv_count[1] + j) * cv_size()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    dimension: usize,
    is_rational: bool,
    order: [usize; 2],
    cv_count: [usize; 2],
    knots: [Vec<f64>; 2],
    cvs: Vec<f64>,
}

impl NurbsSurface {
    /// Creates a surface from raw buffers.
    ///
    /// `knots[dir]` must hold at least `cv_count[dir] + order[dir] - 2`
    /// values; the conventional buffer holds exactly that many. A buffer of
    /// `cv_count[dir] + order[dir]` values is taken as already padded with
    /// its boundary knots. Any other length has unused trailing capacity.
    pub fn new(
        dimension: usize,
        is_rational: bool,
        order: [usize; 2],
        cv_count: [usize; 2],
        knots: [Vec<f64>; 2],
        cvs: Vec<f64>,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidGeometry(
                "Surface dimension must be at least 1.".to_string(),
            ));
        }
        for dir in 0..2 {
            if order[dir] < 2 {
                return Err(Error::InvalidGeometry(format!(
                    "Surface order in direction {dir} must be at least 2, got {}.",
                    order[dir]
                )));
            }
            if cv_count[dir] < order[dir] {
                return Err(Error::InvalidGeometry(format!(
                    "Surface needs at least {} control vertices in direction {dir}, got {}.",
                    order[dir], cv_count[dir]
                )));
            }
            if knots[dir].len() < cv_count[dir] + order[dir] - 2 {
                return Err(Error::InvalidGeometry(format!(
                    "Surface knot buffer in direction {dir} needs {} knots, got {}.",
                    cv_count[dir] + order[dir] - 2,
                    knots[dir].len()
                )));
            }
        }
        let cv_size = dimension + is_rational as usize;
        if cvs.len() != cv_count[0] * cv_count[1] * cv_size {
            return Err(Error::InvalidGeometry(format!(
                "Surface control vertex buffer must hold {} values, got {}.",
                cv_count[0] * cv_count[1] * cv_size,
                cvs.len()
            )));
        }

        let surface = Self {
            dimension,
            is_rational,
            order,
            cv_count,
            knots,
            cvs,
        };

        #[cfg(feature = "geometry_validation")]
        surface.validate()?;

        Ok(surface)
    }

    #[cfg(feature = "geometry_validation")]
    fn validate(&self) -> Result<()> {
        let mut values = self.knots[0]
            .iter()
            .chain(&self.knots[1])
            .chain(&self.cvs);
        if values.any(|v| !v.is_finite()) {
            return Err(Error::InvalidGeometry(
                "Surface contains non-finite values.".to_string(),
            ));
        }
        for dir in 0..2 {
            if !knot::is_non_decreasing(&self.knots[dir]) {
                return Err(Error::InvalidGeometry(format!(
                    "Surface knots in direction {dir} must be non-decreasing."
                )));
            }
            let (t0, t1) = self.domain(dir);
            if t0 >= t1 {
                return Err(Error::InvalidGeometry(format!(
                    "Surface domain [{t0}, {t1}] in direction {dir} is empty."
                )));
            }
        }
        if self.is_rational {
            for i in 0..self.cv_count[0] {
                for j in 0..self.cv_count[1] {
                    if self.weight(i, j) <= 0.0 {
                        return Err(Error::InvalidGeometry(
                            "Surface weights must be positive.".to_string(),
                        ));
                    }
                }
            }
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

    /// Degree + 1 per direction.
    pub fn order(&self) -> [usize; 2] {
        self.order
    }

    /// Number of control vertices per direction.
    pub fn cv_count(&self) -> [usize; 2] {
        self.cv_count
    }

    /// Number of values per control vertex in [`cvs()`](Self::cvs).
    pub fn cv_size(&self) -> usize {
        self.dimension + self.is_rational as usize
    }

    /// The knot buffer of direction `dir`.
    pub fn knots(&self, dir: usize) -> &[f64] {
        &self.knots[dir]
    }

    /// Length of the knot buffer of direction `dir`.
    pub fn knot_capacity(&self, dir: usize) -> usize {
        self.knots[dir].len()
    }

    /// The flat control vertex buffer, direction-0-major.
    pub fn cvs(&self) -> &[f64] {
        &self.cvs
    }

    fn cv_offset(&self, i: usize, j: usize) -> usize {
        (i * self.cv_count[1] + j) * self.cv_size()
    }

    /// The Euclidean coordinates of control vertex `(i, j)`.
    pub fn cv(&self, i: usize, j: usize) -> &[f64] {
        let start = self.cv_offset(i, j);
        &self.cvs[start..start + self.dimension]
    }

    /// The weight of control vertex `(i, j)`; `1.0` for non-rational
    /// surfaces.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        if self.is_rational {
            self.cvs[self.cv_offset(i, j) + self.dimension]
        } else {
            1.0
        }
    }

    /// Returns `true` if the knot buffer of direction `dir` already carries
    /// both boundary knots, `cv_count + order` values.
    pub fn has_padded_knots(&self, dir: usize) -> bool {
        self.knots[dir].len() == self.cv_count[dir] + self.order[dir]
    }

    /// The parameter interval of direction `dir`.
    pub fn domain(&self, dir: usize) -> (f64, f64) {
        if self.has_padded_knots(dir) {
            let knots = &self.knots[dir];
            return (knots[self.order[dir] - 1], knots[self.cv_count[dir]]);
        }
        let knots = self.live_knots(dir);
        (
            knots[self.order[dir] - 2],
            knots[self.cv_count[dir] - 1],
        )
    }

    /// The knots actually used by direction `dir`, ignoring unused buffer
    /// capacity.
    fn live_knots(&self, dir: usize) -> &[f64] {
        &self.knots[dir][..self.cv_count[dir] + self.order[dir] - 2]
    }

    /// The full knot vector of direction `dir`, `cv_count + order` knots.
    pub fn full_knots(&self, dir: usize) -> Vec<f64> {
        if self.has_padded_knots(dir) {
            return self.knots[dir].clone();
        }
        let knots = self.live_knots(dir);
        pad_knot_vector(
            knots,
            knot::superfluous_knot(self.order[dir], knots, KnotEnd::Start),
            knot::superfluous_knot(self.order[dir], knots, KnotEnd::End),
        )
    }

    /// Evaluates the surface at `(u, v)`. Parameters outside the domain are
    /// clamped.
    pub fn point_at(&self, u: f64, v: f64) -> Vec<f64> {
        let stride = self.cv_size();
        let knots_u = self.full_knots(0);
        let knots_v = self.full_knots(1);

        // Collapse direction 1 first, one row of the net per direction 0 index.
        let mut column = Vec::with_capacity(self.cv_count[0] * stride);
        for i in 0..self.cv_count[0] {
            let mut row = Vec::with_capacity(self.cv_count[1] * stride);
            for j in 0..self.cv_count[1] {
                let w = self.weight(i, j);
                if self.is_rational {
                    row.extend(premultiply_by_weight(self.cv(i, j), w));
                    row.push(w);
                } else {
                    row.extend_from_slice(self.cv(i, j));
                }
            }
            column.extend(knot::de_boor(&knots_v, self.order[1] - 1, &row, stride, v));
        }

        let point = knot::de_boor(&knots_u, self.order[0] - 1, &column, stride, u);
        if self.is_rational {
            knot::dehomogenize(point)
        } else {
            point
        }
    }
}
