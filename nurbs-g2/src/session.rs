//! Batch conversion of a whole model.
//!
//! A [`Session`] is opened before the first object is converted and closed
//! after the last one. In between it dispatches each object by geometry type
//! and keeps a [`BatchReport`] of what happened:
//!
//! * Curves convert to exactly one [`SplineCurve`]. A curve that cannot be
//!   converted stops the batch.
//! * Breps and standalone surfaces convert face by face. Faces that cannot be
//!   converted are skipped, logged and recorded; the rest still convert.
//! * Everything else is passed over.
//!
//! # Examples
//!
//! ```
//! use nurbs_g2::model::{Curve, Geometry, Model, ModelObject, OtherKind};
//! use nurbs_g2::session::{ConversionOptions, Session};
//!
//! let mut model = Model::new();
//! model.push(ModelObject::named(
//!     "axis",
//!     Geometry::Curve(Curve::Line {
//!         from: [0.0; 3],
//!         to: [1.0, 0.0, 0.0],
//!     }),
//! ));
//! model.push(ModelObject::new(Geometry::Other(OtherKind::Layer)));
//!
//! let mut session = Session::open(ConversionOptions::default());
//! let converted = session.convert_model(&model)?;
//! let report = session.close();
//!
//! assert_eq!(converted.len(), 1);
//! assert_eq!(report.curves, 1);
//! assert_eq!(report.passed_over, 1);
//! # Ok::<(), nurbs_g2::Error>(())
//! ```
use crate::convert::{convert_curve, convert_surfaces};
use crate::g2::{G2Object, SplineCurve, SplineSurface, SurfaceWeights};
use crate::model::{Geometry, Model, ModelObject, ObjectRef};
use crate::{ConversionError, Error, ObjectIndex, Result};
use log::{debug, info, warn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Options for converting a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// How rational surface coordinates are written (default: raw).
    ///
    /// Curves always use premultiplied coordinates.
    pub surface_weights: SurfaceWeights,

    /// Convert standalone surface objects as single face objects (default:
    /// true). When false they are passed over like any other unsupported
    /// object.
    pub include_standalone_surfaces: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            surface_weights: SurfaceWeights::Raw,
            include_standalone_surfaces: true,
        }
    }
}

/// A face that was skipped because its surface could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFace {
    /// The object the face belongs to.
    pub object: ObjectRef,
    /// Index of the face within the object.
    pub face: usize,
    /// Why it was skipped.
    pub reason: ConversionError,
}

/// What converting a single object produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectOutcome {
    /// The object was a curve.
    Curve(SplineCurve),
    /// The object was surface-bearing.
    Surfaces {
        /// Converted faces, in face order.
        surfaces: Vec<SplineSurface>,
        /// Faces that could not be converted.
        skipped: Vec<SkippedFace>,
    },
    /// The object takes no part in conversion.
    PassedOver(ConversionError),
}

impl ObjectOutcome {
    /// The G2 objects to write, in order.
    pub fn into_descriptors(self) -> Vec<G2Object> {
        match self {
            ObjectOutcome::Curve(curve) => vec![G2Object::Curve(curve)],
            ObjectOutcome::Surfaces { surfaces, .. } => {
                surfaces.into_iter().map(G2Object::Surface).collect()
            }
            ObjectOutcome::PassedOver(_) => Vec::new(),
        }
    }
}

/// The output of one model object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedObject {
    pub object: ObjectRef,
    pub descriptors: Vec<G2Object>,
}

/// Tally of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Number of curves written.
    pub curves: usize,
    /// Number of surfaces written.
    pub surfaces: usize,
    /// Number of objects passed over.
    pub passed_over: usize,
    /// Faces that could not be converted.
    pub skipped_faces: Vec<SkippedFace>,
}

/// Scope of one batch conversion.
#[derive(Debug)]
pub struct Session {
    options: ConversionOptions,
    report: BatchReport,
}

impl Session {
    pub fn open(options: ConversionOptions) -> Self {
        debug!("Opening conversion session with {options:?}");
        Self {
            options,
            report: BatchReport::default(),
        }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// The tally so far.
    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    /// Converts one object and records the outcome.
    ///
    /// Returns [`Error::Conversion`] if the object is a curve that cannot be
    /// converted. Nothing is recorded for it in that case.
    pub fn convert_object(
        &mut self,
        index: ObjectIndex,
        object: &ModelObject,
    ) -> Result<ObjectOutcome> {
        let outcome = convert_object_with(&self.options, index, object)?;
        self.record(&outcome);
        Ok(outcome)
    }

    /// Converts every object of `model` in order, stopping at the first
    /// fatal error.
    ///
    /// Objects without output are left out of the result.
    pub fn convert_model(&mut self, model: &Model) -> Result<Vec<ConvertedObject>> {
        let mut converted = Vec::new();
        for (index, object) in model.iter() {
            let outcome = self.convert_object(index, object)?;
            push_converted(&mut converted, index, object, outcome);
        }
        Ok(converted)
    }

    /// Like [`convert_model`](Self::convert_model) but converts the objects
    /// on the rayon thread pool.
    ///
    /// Results and the report are merged in object order, so the outcome is
    /// the same as for the sequential version.
    ///
    /// This method is only available when the `rayon` feature is enabled.
    #[cfg(feature = "rayon")]
    pub fn convert_model_par(&mut self, model: &Model) -> Result<Vec<ConvertedObject>> {
        let options = self.options;
        let outcomes = model
            .objects()
            .par_iter()
            .enumerate()
            .map(|(index, object)| convert_object_with(&options, ObjectIndex::from(index), object))
            .collect::<Vec<_>>();

        let mut converted = Vec::new();
        for ((index, object), outcome) in model.iter().zip(outcomes) {
            let outcome = outcome?;
            self.record(&outcome);
            push_converted(&mut converted, index, object, outcome);
        }
        Ok(converted)
    }

    fn record(&mut self, outcome: &ObjectOutcome) {
        match outcome {
            ObjectOutcome::Curve(_) => self.report.curves += 1,
            ObjectOutcome::Surfaces { surfaces, skipped } => {
                self.report.surfaces += surfaces.len();
                for face in skipped {
                    warn!(
                        "Skipping face {} of object {}: {}",
                        face.face, face.object, face.reason
                    );
                }
                self.report.skipped_faces.extend_from_slice(skipped);
            }
            ObjectOutcome::PassedOver(_) => self.report.passed_over += 1,
        }
    }

    /// Ends the batch and returns its report.
    pub fn close(self) -> BatchReport {
        let report = self.report;
        info!(
            "Converted {} curves and {} surfaces, passed over {} objects, skipped {} faces",
            report.curves,
            report.surfaces,
            report.passed_over,
            report.skipped_faces.len()
        );
        report
    }
}

fn push_converted(
    converted: &mut Vec<ConvertedObject>,
    index: ObjectIndex,
    object: &ModelObject,
    outcome: ObjectOutcome,
) {
    let descriptors = outcome.into_descriptors();
    if !descriptors.is_empty() {
        converted.push(ConvertedObject {
            object: ObjectRef::new(index, object),
            descriptors,
        });
    }
}

/// Dispatches one object by geometry type. Touches no session state.
fn convert_object_with(
    options: &ConversionOptions,
    index: ObjectIndex,
    object: &ModelObject,
) -> Result<ObjectOutcome> {
    let object_ref = || ObjectRef::new(index, object);
    debug!(
        "Converting object {} ({})",
        object_ref(),
        object.geometry.type_name()
    );

    match &object.geometry {
        Geometry::Curve(curve) => convert_curve(curve)
            .map(ObjectOutcome::Curve)
            .map_err(|source| Error::Conversion {
                object: object_ref(),
                source,
            }),
        Geometry::Surface(_) if !options.include_standalone_surfaces => Ok(
            ObjectOutcome::PassedOver(ConversionError::UnsupportedObjectType(
                "standalone surface".to_string(),
            )),
        ),
        Geometry::Surface(_) | Geometry::Brep(_) => {
            let mut surfaces = Vec::new();
            let mut skipped = Vec::new();
            for (face, result) in convert_surfaces(&object.geometry, options.surface_weights) {
                match result {
                    Ok(surface) => surfaces.push(surface),
                    Err(source) if source.is_fatal() => {
                        return Err(Error::Conversion {
                            object: object_ref(),
                            source,
                        })
                    }
                    Err(reason) => skipped.push(SkippedFace {
                        object: object_ref(),
                        face,
                        reason,
                    }),
                }
            }
            Ok(ObjectOutcome::Surfaces { surfaces, skipped })
        }
        Geometry::Other(kind) => Ok(ObjectOutcome::PassedOver(
            ConversionError::UnsupportedObjectType(kind.to_string()),
        )),
    }
}
