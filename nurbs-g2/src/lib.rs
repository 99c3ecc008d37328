//! # NURBS to G2 Conversion
//!
//! Converts NURBS curves and surfaces from the convention of 3D archive
//! readers into the spline interchange format *G2* of the GoTools geometry
//! toolkit.
//!
//! The two conventions disagree in four places and getting any of them wrong
//! corrupts the geometry without any parse error:
//!
//! * *Knot vectors.* The source stores `cv_count + order - 2` knots and
//!   leaves the outermost ("superfluous") knots implicit. G2 stores all
//!   `cv_count + order`.
//! * *Rational weights.* The source stores Euclidean coordinates and a
//!   separate weight. G2 curves store coordinates premultiplied by the
//!   weight.
//! * *Control net order.* The source stores surface control nets with
//!   direction 1 varying fastest, G2 with direction 0 varying fastest.
//! * *Periodicity.* Periodic source curves are opened up by knot insertion
//!   before they are written; G2 has no periodic flag.
//!
//! ## Usage
//!
//! ```
//! use nurbs_g2::export::{export_model, SingleStream};
//! use nurbs_g2::model::{Curve, Geometry, Model, ModelObject};
//! use nurbs_g2::nurbs::NurbsCurve;
//! use nurbs_g2::session::{ConversionOptions, Session};
//!
//! let curve = NurbsCurve::from_points(
//!     2,
//!     vec![0.0, 1.0],
//!     &[[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
//!     None,
//! )?;
//!
//! let mut model = Model::new();
//! model.push(ModelObject::new(Geometry::Curve(Curve::Nurbs(curve))));
//!
//! let mut session = Session::open(ConversionOptions::default());
//! let mut output = SingleStream::new(Vec::new());
//! export_model(&mut session, &model, &mut output)?;
//! let report = session.close();
//!
//! assert_eq!(report.curves, 1);
//! assert_eq!(
//!     String::from_utf8(output.into_inner()).unwrap(),
//!     "100 1 0 0\n3 0\n2 2\n0 0 1 1\n0 0 0\n1 1 0\n"
//! );
//! # Ok::<(), nurbs_g2::Error>(())
//! ```
//!
//! ## Errors
//!
//! Curves that cannot be converted are fatal and stop the batch with an
//! [`Error::Conversion`] naming the object. Surfaces that cannot be
//! converted only skip their face; see
//! [`BatchReport::skipped_faces`](session::BatchReport::skipped_faces).
//! Objects that are neither curves nor surface-bearing are passed over.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger itself.
//!
//! ## Cargo Features
#![doc = document_features::document_features!()]

pub mod convert;
pub mod error;
pub mod export;
pub mod g2;
pub mod model;
pub mod normalize;
pub mod nurbs;
pub mod session;

pub use error::{ConversionError, Error, Result};

/// Position of an object in the model's object table.
///
/// # Examples
///
/// ```
/// use nurbs_g2::ObjectIndex;
///
/// let index = ObjectIndex::from(42usize);
/// assert_eq!(index.0, 42);
/// assert_eq!(index.to_string(), "#42");
///
/// let value: usize = index.into();
/// assert_eq!(value, 42);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
#[display("#{_0}")]
#[repr(transparent)]
pub struct ObjectIndex(pub usize);
