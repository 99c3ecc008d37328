//! The in-memory source model handed over by the model reader.
//!
//! A [`Model`] is an ordered table of [`ModelObject`]s. Each object carries a
//! [`Geometry`] tagged union; only curves and surface-bearing objects take
//! part in conversion, everything else is passed over.
//!
//! Geometry that is not natively NURBS can be asked for its NURBS form via
//! [`Curve::nurbs_form`] and [`Surface::nurbs_form`].
use crate::nurbs::{NurbsCurve, NurbsSurface};
use crate::{ConversionError, ObjectIndex};
use derive_more::Display;
use std::borrow::Cow;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;

/// Tolerance on the sweep of a full circle.
const SWEEP_TOLERANCE: f64 = 1e-12;

/// A curve object's geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// A NURBS curve.
    Nurbs(NurbsCurve),
    /// A straight segment, parameterized over `[0, 1]`.
    Line {
        /// Start point.
        from: [f64; 3],
        /// End point.
        to: [f64; 3],
    },
    /// A polyline, vertex `i` sits at parameter `i`.
    Polyline {
        /// The vertices.
        points: Vec<[f64; 3]>,
    },
    /// A circular arc.
    Arc(Arc),
    /// A curve type without a NURBS form.
    Unsupported {
        /// Name of the curve type, for diagnostics.
        kind: String,
    },
}

/// A circular arc in the plane spanned by two orthonormal axes, parameterized
/// by angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    /// Center of the circle.
    pub center: [f64; 3],
    /// Direction of angle zero. Must be a unit vector.
    pub x_axis: [f64; 3],
    /// Direction of angle π/2. Must be a unit vector orthogonal to `x_axis`.
    pub y_axis: [f64; 3],
    /// Radius of the circle.
    pub radius: f64,
    /// Start angle in radians.
    pub start_angle: f64,
    /// End angle in radians; `end_angle - start_angle` is in `(0, 2π]`.
    pub end_angle: f64,
}

impl Arc {
    /// A full circle.
    pub fn circle(center: [f64; 3], x_axis: [f64; 3], y_axis: [f64; 3], radius: f64) -> Self {
        Self {
            center,
            x_axis,
            y_axis,
            radius,
            start_angle: 0.0,
            end_angle: TAU,
        }
    }

    fn point_at_angle(&self, angle: f64, distance: f64) -> [f64; 3] {
        let (sin, cos) = angle.sin_cos();
        std::array::from_fn(|k| {
            self.center[k] + distance * (cos * self.x_axis[k] + sin * self.y_axis[k])
        })
    }

    /// The arc as a rational quadratic NURBS curve with at most 90° per span.
    pub fn to_nurbs(&self) -> Result<NurbsCurve, ConversionError> {
        let sweep = self.end_angle - self.start_angle;
        if !(self.radius > 0.0) {
            return Err(ConversionError::UnconvertibleCurve(format!(
                "arc radius {} is not positive",
                self.radius
            )));
        }
        if !(sweep > 0.0 && sweep <= TAU + SWEEP_TOLERANCE) {
            return Err(ConversionError::UnconvertibleCurve(format!(
                "arc sweep {sweep} is outside (0, 2π]"
            )));
        }

        let spans = ((sweep / FRAC_PI_2) - SWEEP_TOLERANCE).ceil().clamp(1.0, 4.0) as usize;
        let delta = sweep / spans as f64;
        let middle_weight = (delta / 2.0).cos();

        let mut points = Vec::with_capacity(2 * spans + 1);
        let mut weights = Vec::with_capacity(2 * spans + 1);
        let mut knots = Vec::with_capacity(2 * spans + 2);
        for span in 0..spans {
            let angle = self.start_angle + span as f64 * delta;
            points.push(self.point_at_angle(angle, self.radius));
            points.push(self.point_at_angle(angle + delta / 2.0, self.radius / middle_weight));
            weights.extend([1.0, middle_weight]);
            knots.extend([angle, angle]);
        }
        points.push(self.point_at_angle(self.end_angle, self.radius));
        weights.push(1.0);
        knots.extend([self.end_angle, self.end_angle]);

        NurbsCurve::from_points(3, knots, &points, Some(weights.as_slice()))
            .map_err(|e| ConversionError::UnconvertibleCurve(e.to_string()))
    }
}

impl Curve {
    /// The curve in NURBS form.
    ///
    /// NURBS curves are borrowed, everything else is converted. Fails with
    /// [`ConversionError::UnconvertibleCurve`] if there is no NURBS form.
    pub fn nurbs_form(&self) -> Result<Cow<'_, NurbsCurve>, ConversionError> {
        let unconvertible = |e: crate::Error| ConversionError::UnconvertibleCurve(e.to_string());
        match self {
            Curve::Nurbs(curve) => Ok(Cow::Borrowed(curve)),
            Curve::Line { from, to } => {
                NurbsCurve::from_points(2, vec![0.0, 1.0], &[*from, *to], None)
                    .map(Cow::Owned)
                    .map_err(unconvertible)
            }
            Curve::Polyline { points } => {
                if points.len() < 2 {
                    return Err(ConversionError::UnconvertibleCurve(format!(
                        "polyline with {} points",
                        points.len()
                    )));
                }
                let knots = (0..points.len()).map(|i| i as f64).collect();
                NurbsCurve::from_points(2, knots, points, None)
                    .map(Cow::Owned)
                    .map_err(unconvertible)
            }
            Curve::Arc(arc) => arc.to_nurbs().map(Cow::Owned),
            Curve::Unsupported { kind } => Err(ConversionError::UnconvertibleCurve(format!(
                "{kind} has no NURBS form"
            ))),
        }
    }
}

/// A rectangular piece of a plane, parameterized as
/// `origin + u * x_axis + v * y_axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    /// Point at `(u, v) = (0, 0)`.
    pub origin: [f64; 3],
    /// Direction of increasing `u`.
    pub x_axis: [f64; 3],
    /// Direction of increasing `v`.
    pub y_axis: [f64; 3],
    /// Parameter interval in `u`.
    pub u: [f64; 2],
    /// Parameter interval in `v`.
    pub v: [f64; 2],
}

impl PlaneSurface {
    fn point_at(&self, u: f64, v: f64) -> [f64; 3] {
        std::array::from_fn(|k| self.origin[k] + u * self.x_axis[k] + v * self.y_axis[k])
    }

    /// The plane as a bilinear NURBS surface.
    pub fn to_nurbs(&self) -> Result<NurbsSurface, ConversionError> {
        let mut cvs = Vec::with_capacity(12);
        for u in self.u {
            for v in self.v {
                cvs.extend(self.point_at(u, v));
            }
        }
        NurbsSurface::new(
            3,
            false,
            [2, 2],
            [2, 2],
            [self.u.to_vec(), self.v.to_vec()],
            cvs,
        )
        .map_err(|e| ConversionError::UnconvertibleSurface(e.to_string()))
    }
}

/// Geometry of a single surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// A NURBS surface.
    Nurbs(NurbsSurface),
    /// A trimmed-free rectangle of a plane.
    Plane(PlaneSurface),
    /// A surface type without a NURBS form.
    Unsupported {
        /// Name of the surface type, for diagnostics.
        kind: String,
    },
}

impl Surface {
    /// The surface in NURBS form.
    ///
    /// Fails with [`ConversionError::UnconvertibleSurface`] if there is no
    /// NURBS form.
    pub fn nurbs_form(&self) -> Result<Cow<'_, NurbsSurface>, ConversionError> {
        match self {
            Surface::Nurbs(surface) => Ok(Cow::Borrowed(surface)),
            Surface::Plane(plane) => plane.to_nurbs().map(Cow::Owned),
            Surface::Unsupported { kind } => Err(ConversionError::UnconvertibleSurface(format!(
                "{kind} has no NURBS form"
            ))),
        }
    }
}

/// A face of a [`Brep`], referring to one of its surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrepFace {
    /// Index into [`Brep::surfaces`].
    pub surface_index: usize,
}

/// A boundary representation. Only the face surfaces matter here; trimming
/// and topology are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Brep {
    /// The surfaces referenced by the faces.
    pub surfaces: Vec<Surface>,
    /// The faces.
    pub faces: Vec<BrepFace>,
}

impl Brep {
    /// Creates a brep with one face per surface.
    pub fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        let faces = (0..surfaces.len())
            .map(|surface_index| BrepFace { surface_index })
            .collect();
        Self { surfaces, faces }
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if face `index` exists and refers to a surface.
    pub fn face_is_surface(&self, index: usize) -> bool {
        self.face_surface(index).is_some()
    }

    /// The surface of face `index`.
    pub fn face_surface(&self, index: usize) -> Option<&Surface> {
        self.faces
            .get(index)
            .and_then(|face| self.surfaces.get(face.surface_index))
    }
}

/// Object types that take no part in conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OtherKind {
    /// A polygon mesh.
    #[display("mesh")]
    Mesh,
    /// A single point.
    #[display("point")]
    Point,
    /// A point cloud.
    #[display("point set")]
    PointSet,
    /// A layer definition.
    #[display("layer")]
    Layer,
    /// A material definition.
    #[display("material")]
    Material,
    /// A light.
    #[display("light")]
    Light,
    /// An annotation.
    #[display("annotation")]
    Annotation,
    /// A text dot.
    #[display("text dot")]
    TextDot,
    /// User data.
    #[display("user data")]
    UserData,
    /// Anything the reader could not classify.
    #[display("unknown")]
    Unknown,
}

/// The geometry of a model object.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A curve.
    Curve(Curve),
    /// A single, untrimmed surface.
    Surface(Surface),
    /// A boundary representation with one surface per face.
    Brep(Brep),
    /// Anything else.
    Other(OtherKind),
}

impl Geometry {
    /// Short name of the geometry type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Curve(_) => "curve",
            Geometry::Surface(_) => "surface",
            Geometry::Brep(_) => "brep",
            Geometry::Other(_) => "other",
        }
    }
}

/// An entry of the model's object table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelObject {
    /// Optional user visible name.
    pub name: Option<String>,
    /// The geometry.
    pub geometry: Geometry,
}

impl ModelObject {
    /// An unnamed object.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            name: None,
            geometry,
        }
    }

    /// A named object. Empty names count as no name.
    pub fn named(name: impl Into<String>, geometry: Geometry) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
            geometry,
        }
    }
}

/// An ordered table of objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    objects: Vec<ModelObject>,
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object and returns its index.
    pub fn push(&mut self, object: ModelObject) -> ObjectIndex {
        self.objects.push(object);
        ObjectIndex::from(self.objects.len() - 1)
    }

    /// The object table.
    pub fn objects(&self) -> &[ModelObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the model has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates over the objects together with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectIndex, &ModelObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectIndex::from(index), object))
    }
}

impl FromIterator<ModelObject> for Model {
    fn from_iter<I: IntoIterator<Item = ModelObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

/// Identifies a model object in diagnostics: its index and, if present, its
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Position in the object table.
    pub index: ObjectIndex,
    /// The object's name.
    pub name: Option<String>,
}

impl ObjectRef {
    /// Creates a reference to `object` at `index`.
    pub fn new(index: ObjectIndex, object: &ModelObject) -> Self {
        Self {
            index,
            name: object.name.clone(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (\"{name}\")", self.index),
            None => write!(f, "{}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_arc_is_one_rational_span() {
        let arc = Arc {
            center: [0.0; 3],
            x_axis: [1.0, 0.0, 0.0],
            y_axis: [0.0, 1.0, 0.0],
            radius: 2.0,
            start_angle: 0.0,
            end_angle: FRAC_PI_2,
        };
        let curve = arc.to_nurbs().unwrap();
        assert_eq!(curve.order(), 3);
        assert_eq!(curve.cv_count(), 3);
        assert_eq!(curve.knots(), &[0.0, 0.0, FRAC_PI_2, FRAC_PI_2]);
        assert!((curve.weight(1) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-15);
    }

    #[test]
    fn circle_points_lie_on_circle() {
        let circle = Arc::circle([1.0, 2.0, 3.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], 1.5);
        let curve = circle.to_nurbs().unwrap();
        assert_eq!(curve.cv_count(), 9);
        let (t0, t1) = curve.domain();
        for step in 0..=64 {
            let p = curve.point_at(t0 + (t1 - t0) * step as f64 / 64.0);
            let r = ((p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2)).sqrt();
            assert!((r - 1.5).abs() < 1e-12);
            assert!((p[2] - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_curves_have_no_nurbs_form() {
        let polyline = Curve::Polyline {
            points: vec![[0.0; 3]],
        };
        assert!(matches!(
            polyline.nurbs_form(),
            Err(ConversionError::UnconvertibleCurve(_))
        ));
        let arc = Curve::Arc(Arc {
            radius: 0.0,
            ..Arc::circle([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], 1.0)
        });
        assert!(arc.nurbs_form().is_err());
    }

    #[test]
    fn brep_face_lookup() {
        let plane = Surface::Plane(PlaneSurface {
            origin: [0.0; 3],
            x_axis: [1.0, 0.0, 0.0],
            y_axis: [0.0, 1.0, 0.0],
            u: [0.0, 1.0],
            v: [0.0, 1.0],
        });
        let mut brep = Brep::from_surfaces(vec![plane]);
        brep.faces.push(BrepFace { surface_index: 7 });
        assert_eq!(brep.face_count(), 2);
        assert!(brep.face_is_surface(0));
        assert!(!brep.face_is_surface(1));
        assert!(!brep.face_is_surface(2));
    }

    #[test]
    fn object_ref_display() {
        let object = ModelObject::named("hull", Geometry::Other(OtherKind::Mesh));
        assert_eq!(
            ObjectRef::new(ObjectIndex(3), &object).to_string(),
            "#3 (\"hull\")"
        );
        let object = ModelObject::named("", Geometry::Other(OtherKind::Mesh));
        assert_eq!(ObjectRef::new(ObjectIndex(0), &object).to_string(), "#0");
    }
}
