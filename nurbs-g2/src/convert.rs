//! Conversion of source curves and surfaces into canonical G2 descriptors.
//!
//! Curves are opened up if periodic, get their implicit boundary knots back
//! and store rational coordinates premultiplied by the weight. Surfaces keep
//! their knot buffers, get the first and last knot duplicated and have their
//! control net re-ordered so that direction 0 varies fastest.
//!
//! Nothing here mutates the source geometry.
use crate::g2::{SplineBasis, SplineCurve, SplineSurface, SurfaceWeights};
use crate::model::{Brep, Curve, Geometry, Surface};
use crate::normalize::{pad_knot_vector, premultiply_by_weight};
use crate::nurbs::{KnotEnd, NurbsCurve, NurbsSurface};
use crate::ConversionError;
use log::warn;
use std::borrow::Cow;

/// Converts a curve object's geometry.
///
/// Fails with [`ConversionError::UnconvertibleCurve`] if the curve has no
/// NURBS form and with [`ConversionError::KnotInsertionFailed`] if a
/// periodic curve cannot be opened up. Both are fatal to a batch.
pub fn convert_curve(curve: &Curve) -> Result<SplineCurve, ConversionError> {
    let nurbs = curve.nurbs_form()?;
    convert_nurbs_curve(&nurbs)
}

/// Converts a NURBS curve.
pub fn convert_nurbs_curve(curve: &NurbsCurve) -> Result<SplineCurve, ConversionError> {
    let curve = if curve.is_periodic() {
        Cow::Owned(open_periodic(curve)?)
    } else {
        Cow::Borrowed(curve)
    };

    let knots = pad_knot_vector(
        curve.knots(),
        curve.superfluous_knot(KnotEnd::Start),
        curve.superfluous_knot(KnotEnd::End),
    );

    let mut coefs = Vec::with_capacity(curve.cv_count() * curve.cv_size());
    for i in 0..curve.cv_count() {
        if curve.is_rational() {
            let w = curve.weight(i);
            coefs.extend(premultiply_by_weight(curve.cv(i), w));
            coefs.push(w);
        } else {
            coefs.extend_from_slice(curve.cv(i));
        }
    }

    Ok(SplineCurve {
        dimension: curve.dimension(),
        rational: curve.is_rational(),
        basis: SplineBasis {
            count: curve.cv_count(),
            order: curve.order(),
            knots,
        },
        coefs,
    })
}

/// An equivalent open copy of a periodic curve: full multiplicity knots at
/// both domain ends.
fn open_periodic(curve: &NurbsCurve) -> Result<NurbsCurve, ConversionError> {
    let (t0, t1) = curve.domain();
    let mut open = curve.clone();
    open.insert_knot(t0, curve.degree())?;
    open.insert_knot(t1, curve.degree())?;
    Ok(open)
}

/// Converts the surface of a single face.
///
/// Fails with [`ConversionError::UnconvertibleSurface`] if the surface has no
/// NURBS form. The caller skips the face and carries on.
pub fn convert_surface(
    surface: &Surface,
    weights: SurfaceWeights,
) -> Result<SplineSurface, ConversionError> {
    let nurbs = surface.nurbs_form()?;
    Ok(convert_nurbs_surface(&nurbs, weights))
}

/// Converts a NURBS surface.
pub fn convert_nurbs_surface(surface: &NurbsSurface, weights: SurfaceWeights) -> SplineSurface {
    let bases = [0, 1].map(|dir| surface_basis(surface, dir));
    let [n0, n1] = surface.cv_count();
    let size = surface.cv_size();
    let dimension = surface.dimension();

    // grid[component][i][j]
    let mut grid = vec![vec![vec![0.0; n1]; n0]; size];
    for (index, cv) in surface.cvs().chunks_exact(size).enumerate() {
        let (i, j) = (index / n1, index % n1);
        for (component, &value) in cv.iter().enumerate() {
            grid[component][i][j] = value;
        }
    }

    let premultiply = surface.is_rational() && weights == SurfaceWeights::Premultiplied;
    let mut coefs = Vec::with_capacity(n0 * n1 * size);
    for j in 0..n1 {
        for i in 0..n0 {
            let w = if premultiply { grid[dimension][i][j] } else { 1.0 };
            coefs.extend(grid[..dimension].iter().map(|component| component[i][j] * w));
            if surface.is_rational() {
                coefs.push(grid[dimension][i][j]);
            }
        }
    }

    SplineSurface {
        dimension,
        rational: surface.is_rational(),
        weights,
        bases,
        coefs,
    }
}

fn surface_basis(surface: &NurbsSurface, dir: usize) -> SplineBasis {
    let buffer = surface.knots(dir);
    let count = surface.cv_count()[dir];
    let order = surface.order()[dir];
    // Buffers are never empty: they hold at least `count + order - 2 >= 2` knots.
    let knots = pad_knot_vector(buffer, buffer[0], buffer[buffer.len() - 1]);
    if knots.len() != count + order {
        warn!(
            "Surface knot vector in direction {dir} has {} knots, expected {}",
            knots.len(),
            count + order
        );
    }
    SplineBasis {
        count,
        order,
        knots,
    }
}

/// One surface face of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FaceSource<'a> {
    Brep(&'a Brep),
    Single(&'a Surface),
    None,
}

/// Lazily converts the faces of a surface-bearing object, one item per face.
///
/// Created by [`convert_surfaces`]. Each item is the face index together with
/// the conversion result; a failed face does not stop the iteration.
#[derive(Debug)]
pub struct SurfaceFaces<'a> {
    source: FaceSource<'a>,
    weights: SurfaceWeights,
    next: usize,
}

impl<'a> SurfaceFaces<'a> {
    fn face_count(&self) -> usize {
        match self.source {
            FaceSource::Brep(brep) => brep.face_count(),
            FaceSource::Single(_) => 1,
            FaceSource::None => 0,
        }
    }

    fn face_surface(&self, face: usize) -> Option<&'a Surface> {
        match self.source {
            FaceSource::Brep(brep) => brep.face_surface(face),
            FaceSource::Single(surface) => (face == 0).then_some(surface),
            FaceSource::None => None,
        }
    }
}

impl Iterator for SurfaceFaces<'_> {
    type Item = (usize, Result<SplineSurface, ConversionError>);

    fn next(&mut self) -> Option<Self::Item> {
        let face = self.next;
        if face >= self.face_count() {
            return None;
        }
        self.next += 1;

        let result = match self.face_surface(face) {
            Some(surface) => convert_surface(surface, self.weights),
            None => Err(ConversionError::UnconvertibleSurface(format!(
                "face {face} has no surface"
            ))),
        };
        Some((face, result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.face_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SurfaceFaces<'_> {}

/// Converts every face of a surface-bearing object, lazily.
///
/// Breps yield one item per face, a standalone surface yields one item and
/// any other geometry yields nothing.
pub fn convert_surfaces(geometry: &Geometry, weights: SurfaceWeights) -> SurfaceFaces<'_> {
    let source = match geometry {
        Geometry::Brep(brep) => FaceSource::Brep(brep),
        Geometry::Surface(surface) => FaceSource::Single(surface),
        Geometry::Curve(_) | Geometry::Other(_) => FaceSource::None,
    };
    SurfaceFaces {
        source,
        weights,
        next: 0,
    }
}
