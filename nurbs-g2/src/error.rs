//! Error types for the nurbs-g2 crate.

use crate::model::ObjectRef;
use thiserror::Error;

/// Why a single curve, surface or object could not be brought into G2 form.
///
/// Curve failures are fatal to a batch, surface failures only skip the face
/// in question. See [`ConversionError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The curve has no NURBS form.
    #[error("Curve cannot be expressed as NURBS: {0}")]
    UnconvertibleCurve(String),

    /// Knot insertion (used to open up periodic curves) failed.
    #[error("Knot insertion failed: {0}")]
    KnotInsertionFailed(String),

    /// The surface of a face has no NURBS form.
    #[error("Surface cannot be expressed as NURBS: {0}")]
    UnconvertibleSurface(String),

    /// The object is neither a curve nor surface-bearing.
    #[error("Unsupported object type: {0}")]
    UnsupportedObjectType(String),
}

impl ConversionError {
    /// Returns `true` if this error must stop the surrounding batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnconvertibleCurve(_) | Self::KnotInsertionFailed(_)
        )
    }
}

/// Main error type for nurbs-g2 operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Source geometry failed validation on construction.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An object of the model could not be converted.
    #[error("Object {object}: {source}")]
    Conversion {
        /// The offending object.
        object: ObjectRef,
        /// What went wrong.
        #[source]
        source: ConversionError,
    },

    /// IO error for file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A G2 object header could not be parsed.
    #[error("Invalid G2 header: {0:?}")]
    InvalidHeader(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The object a conversion error refers to, if any.
    pub fn object(&self) -> Option<&ObjectRef> {
        match self {
            Error::Conversion { object, .. } => Some(object),
            _ => None,
        }
    }
}
